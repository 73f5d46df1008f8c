use leptos::prelude::*;
use leptos_icons::Icon;

use crate::auth::context::AuthContext;

#[component]
fn FeatureCard(
    icon: icondata_core::Icon,
    title: &'static str,
    blurb: &'static str,
) -> impl IntoView {
    view! {
        <div class="bg-white dark:bg-slate-800 rounded-lg shadow-sm border border-slate-200 dark:border-slate-700 p-6">
            <div class="text-indigo-600 dark:text-indigo-400 mb-3">
                <Icon icon=icon width="28" height="28"/>
            </div>
            <h3 class="font-semibold text-slate-800 dark:text-slate-100 mb-2">{title}</h3>
            <p class="text-sm text-slate-500 dark:text-slate-400">{blurb}</p>
        </div>
    }
}

#[component]
pub fn HomePage() -> impl IntoView {
    let auth = expect_context::<AuthContext>();

    view! {
        <div class="container mx-auto px-4 py-16">
            <div class="text-center max-w-2xl mx-auto mb-12">
                <h1 class="text-4xl font-bold text-slate-900 dark:text-slate-50 mb-4">
                    "Chat with your documents"
                </h1>
                <p class="text-lg text-slate-600 dark:text-slate-300 mb-8">
                    "Build knowledge bases from your files and ask questions against them. \
                     Answers stream in as they are generated, grounded in what you uploaded."
                </p>
                {move || {
                    if auth.is_authenticated.get() {
                        view! {
                            <a
                                href="/chat"
                                class="inline-block px-6 py-3 rounded-lg bg-indigo-600 hover:bg-indigo-700 text-white font-medium transition-colors"
                            >
                                "Start Chatting"
                            </a>
                        }
                            .into_any()
                    } else {
                        view! {
                            <div class="space-x-3">
                                <a
                                    href="/login"
                                    class="inline-block px-6 py-3 rounded-lg bg-indigo-600 hover:bg-indigo-700 text-white font-medium transition-colors"
                                >
                                    "Login"
                                </a>
                                <a
                                    href="/register"
                                    class="inline-block px-6 py-3 rounded-lg border border-indigo-600 text-indigo-600 dark:text-indigo-400 hover:bg-indigo-50 dark:hover:bg-slate-800 font-medium transition-colors"
                                >
                                    "Create an Account"
                                </a>
                            </div>
                        }
                            .into_any()
                    }
                }}
            </div>

            <div class="grid grid-cols-1 md:grid-cols-3 gap-6 max-w-4xl mx-auto">
                <FeatureCard
                    icon=icondata_bs::BsDatabase
                    title="Knowledge Bases"
                    blurb="Organize documents into separate collections with their own chunking settings."
                />
                <FeatureCard
                    icon=icondata_bs::BsCloudUpload
                    title="Document Upload"
                    blurb="Drop in text, markdown, PDF, or Word files; processing happens in the background."
                />
                <FeatureCard
                    icon=icondata_bs::BsChatDots
                    title="Streaming Answers"
                    blurb="Responses arrive token by token, with graceful handling of interruptions."
                />
            </div>
        </div>
    }
}
