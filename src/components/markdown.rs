use leptos::prelude::*;
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use std::fmt::Write;

/// Renders an assistant message as styled HTML. Chat answers are markdown
/// with code fences, lists, and links; tables and footnotes are left to the
/// backend's plain-text fallback.
#[component]
pub fn MarkdownView(#[prop(into)] content: String) -> impl IntoView {
    let rendered = Memo::new(move |_| render_markdown(&content));

    view! { <div class="markdown-body min-w-0 max-w-full" inner_html=move || rendered.get()></div> }
}

pub fn render_markdown(source: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut html = String::new();
    let mut in_code_block = false;

    for event in Parser::new_ext(source, options) {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                in_code_block = true;
                let lang = match &kind {
                    CodeBlockKind::Fenced(lang) if !lang.is_empty() => escape_html(lang),
                    _ => "text".to_string(),
                };
                write!(
                    html,
                    r#"<div class="my-3 rounded-lg overflow-hidden border border-slate-300 dark:border-slate-600"><div class="px-3 py-1 text-xs bg-slate-200 dark:bg-slate-700 text-slate-600 dark:text-slate-300">{lang}</div><pre class="p-3 overflow-x-auto bg-slate-50 dark:bg-slate-800 text-sm"><code>"#
                )
                .ok();
            }
            Event::End(TagEnd::CodeBlock) => {
                in_code_block = false;
                html.push_str("</code></pre></div>");
            }
            Event::Start(Tag::Paragraph) => html.push_str(r#"<p class="mb-3 leading-relaxed">"#),
            Event::End(TagEnd::Paragraph) => html.push_str("</p>"),
            Event::Start(Tag::Heading { level, .. }) => {
                write!(
                    html,
                    r#"<h{} class="font-semibold mt-4 mb-2 text-slate-900 dark:text-slate-100">"#,
                    level as u8
                )
                .ok();
            }
            Event::End(TagEnd::Heading(level)) => {
                write!(html, "</h{}>", level as u8).ok();
            }
            Event::Start(Tag::Strong) => html.push_str("<strong>"),
            Event::End(TagEnd::Strong) => html.push_str("</strong>"),
            Event::Start(Tag::Emphasis) => html.push_str("<em>"),
            Event::End(TagEnd::Emphasis) => html.push_str("</em>"),
            Event::Start(Tag::Strikethrough) => html.push_str("<del>"),
            Event::End(TagEnd::Strikethrough) => html.push_str("</del>"),
            Event::Start(Tag::BlockQuote(_)) => {
                html.push_str(
                    r#"<blockquote class="border-l-4 border-indigo-300 dark:border-indigo-600 pl-3 my-3 italic text-slate-600 dark:text-slate-300">"#,
                );
            }
            Event::End(TagEnd::BlockQuote(_)) => html.push_str("</blockquote>"),
            Event::Start(Tag::List(None)) => {
                html.push_str(r#"<ul class="list-disc list-inside mb-3 space-y-1">"#)
            }
            Event::Start(Tag::List(Some(_))) => {
                html.push_str(r#"<ol class="list-decimal list-inside mb-3 space-y-1">"#)
            }
            Event::End(TagEnd::List(false)) => html.push_str("</ul>"),
            Event::End(TagEnd::List(true)) => html.push_str("</ol>"),
            Event::Start(Tag::Item) => html.push_str("<li>"),
            Event::End(TagEnd::Item) => html.push_str("</li>"),
            Event::Start(Tag::Link { dest_url, .. }) => {
                write!(
                    html,
                    r#"<a href="{}" class="text-indigo-600 dark:text-indigo-400 underline" target="_blank" rel="noopener noreferrer">"#,
                    escape_html(&dest_url)
                )
                .ok();
            }
            Event::End(TagEnd::Link) => html.push_str("</a>"),
            Event::Code(code) => {
                write!(
                    html,
                    r#"<code class="px-1 py-0.5 rounded bg-slate-200 dark:bg-slate-700 text-sm">{}</code>"#,
                    escape_html(&code)
                )
                .ok();
            }
            Event::Text(text) => html.push_str(&escape_html(&text)),
            Event::SoftBreak => html.push(if in_code_block { '\n' } else { ' ' }),
            Event::HardBreak => {
                if in_code_block {
                    html.push('\n');
                } else {
                    html.push_str("<br>");
                }
            }
            _ => {}
        }
    }

    html
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_basic_formatting() {
        let html = render_markdown("# Title\n\nSome **bold** and *italic* text.");
        assert!(html.contains("<h1"));
        assert!(html.contains("<strong>bold</strong>"));
        assert!(html.contains("<em>italic</em>"));
    }

    #[test]
    fn fenced_code_keeps_language_and_indentation() {
        let html = render_markdown("```rust\nfn main() {\n    println!(\"hi\");\n}\n```");
        assert!(html.contains("rust"));
        assert!(html.contains("<pre"));
        assert!(html.contains("    println!"));
    }

    #[test]
    fn raw_html_is_escaped() {
        let html = render_markdown("evil <script>alert(1)</script>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn links_open_in_a_new_tab() {
        let html = render_markdown("[docs](https://example.com)");
        assert!(html.contains(r#"href="https://example.com""#));
        assert!(html.contains("noopener"));
    }
}
