use leptos::{prelude::*, task::spawn_local};
use leptos_icons::Icon;
use log::{error, info};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{ErrorEvent, EventSource, MessageEvent};

use crate::api::intercept_error;
use crate::auth::events::{AuthEvents, SESSION_EXPIRED_EVENT};
use crate::auth::expiry::{ExpiryOptions, SessionExpiry};
use crate::auth::token::{save_chat_draft, take_chat_draft};
use crate::components::markdown::MarkdownView;
use crate::components::toast::Toast;
use crate::models::chat::{ChatHistoryEntry, DisplayMessage, HistoryMessage};
use crate::pages::knowledgebases::get_knowledgebases;
use crate::stream::{RelayMessage, StreamTicket, CANCELLED_SENTINEL, DONE_SENTINEL};

/// How many prior turns ride along with each question.
const HISTORY_WINDOW: usize = 10;

#[server(OpenChatStream, "/api")]
pub async fn open_chat_stream(
    kb_id: String,
    message: String,
    history: Vec<HistoryMessage>,
) -> Result<StreamTicket, ServerFnError> {
    #[cfg(feature = "ssr")]
    {
        use crate::models::chat::ChatStreamRequest;
        use crate::state::AppState;

        // The session must still be valid to stash a request; the relay
        // endpoint re-checks the cookie when the EventSource attaches.
        crate::auth::bearer_token().await?;
        let state =
            use_context::<AppState>().ok_or_else(|| ServerFnError::new("app state not found"))?;
        let stream_id = state.streams.stash(ChatStreamRequest {
            kb_id,
            message,
            history,
        });
        log::info!("stashed chat request as stream {stream_id}");
        Ok(StreamTicket { stream_id })
    }

    #[cfg(not(feature = "ssr"))]
    Err(ServerFnError::new("server-side function called on client"))
}

#[server(GetChatHistory, "/api")]
pub async fn get_chat_history(kb_id: String) -> Result<Vec<ChatHistoryEntry>, ServerFnError> {
    #[cfg(feature = "ssr")]
    {
        use crate::auth::{backend_from_context, bearer_token};

        let bearer = bearer_token().await?;
        let backend = backend_from_context()?;
        backend
            .chat_history(&bearer, &kb_id)
            .await
            .map_err(|e| ServerFnError::new(e.to_string()))
    }

    #[cfg(not(feature = "ssr"))]
    Err(ServerFnError::new("server-side function called on client"))
}

#[server(ClearChatHistory, "/api")]
pub async fn clear_chat_history(kb_id: String) -> Result<(), ServerFnError> {
    #[cfg(feature = "ssr")]
    {
        use crate::auth::{backend_from_context, bearer_token};

        let bearer = bearer_token().await?;
        let backend = backend_from_context()?;
        backend
            .clear_chat_history(&bearer, &kb_id)
            .await
            .map_err(|e| ServerFnError::new(e.to_string()))
    }

    #[cfg(not(feature = "ssr"))]
    Err(ServerFnError::new("server-side function called on client"))
}

fn append_chunk(set_messages: WriteSignal<Vec<DisplayMessage>>, id: &str, chunk: &str) {
    let id = id.to_string();
    let chunk = chunk.to_string();
    set_messages.update(|msgs| {
        if let Some(msg) = msgs.iter_mut().find(|m| m.id == id) {
            msg.content.push_str(&chunk);
        }
    });
}

fn finish_bubble(set_messages: WriteSignal<Vec<DisplayMessage>>, id: &str) {
    let id = id.to_string();
    set_messages.update(|msgs| {
        if let Some(msg) = msgs.iter_mut().find(|m| m.id == id) {
            msg.streaming = false;
        }
    });
}

fn fail_bubble(set_messages: WriteSignal<Vec<DisplayMessage>>, id: &str, text: &str) {
    let id = id.to_string();
    let text = text.to_string();
    set_messages.update(|msgs| {
        if let Some(msg) = msgs.iter_mut().find(|m| m.id == id) {
            msg.content = text;
            msg.streaming = false;
            msg.error = true;
        }
    });
}

#[component]
fn MessageBubble(message: DisplayMessage) -> impl IntoView {
    let is_user = message.is_user();
    let waiting = message.streaming && message.content.is_empty();

    view! {
        <div class=format!("flex {}", if is_user { "justify-end" } else { "justify-start" })>
            <div class=format!(
                "max-w-[80%] rounded-lg px-4 py-3 text-sm {}",
                if is_user {
                    "bg-indigo-600 text-white"
                } else if message.error {
                    "bg-rose-50 dark:bg-rose-900/30 text-rose-700 dark:text-rose-300 border border-rose-200 dark:border-rose-800"
                } else {
                    "bg-white dark:bg-slate-800 text-slate-800 dark:text-slate-100 border border-slate-200 dark:border-slate-700"
                },
            )>
                {if waiting {
                    view! {
                        <span class="text-slate-400 dark:text-slate-500 animate-pulse">
                            "thinking..."
                        </span>
                    }
                        .into_any()
                } else if is_user || message.error {
                    view! { <span class="whitespace-pre-wrap">{message.content.clone()}</span> }
                        .into_any()
                } else {
                    view! { <MarkdownView content=message.content.clone()/> }.into_any()
                }}
            </div>
        </div>
    }
}

#[component]
pub fn ChatPage() -> impl IntoView {
    let expiry = expect_context::<SessionExpiry>();
    let events = expect_context::<AuthEvents>();

    let (selected_kb, set_selected_kb) = signal(None::<String>);
    let (input, set_input) = signal(String::new());
    let (messages, set_messages) = signal(Vec::<DisplayMessage>::new());
    let (is_streaming, set_is_streaming) = signal(false);
    let (current_stream_id, set_current_stream_id) = signal(None::<String>);

    let (toast_visible, set_toast_visible) = signal(false);
    let (toast_message, set_toast_message) = signal(String::new());
    let show_toast = move |message: String| {
        set_toast_message.set(message);
        set_toast_visible.set(true);
        set_timeout(
            move || set_toast_visible.set(false),
            std::time::Duration::from_secs(4),
        );
    };

    let kbs = Resource::new(|| (), |_| async move { get_knowledgebases(1, 100).await });

    // Restore a draft stashed by a previous session-expiry episode.
    Effect::new(move |_| {
        if let Some(draft) = take_chat_draft() {
            set_input.set(draft);
        }
    });

    // Session-expiry cleanup: stash the unsent input and tear down any live
    // relay before the coordinator navigates away.
    let subscription = {
        let sub = events.subscribe(SESSION_EXPIRED_EVENT, move |_notice| {
            save_chat_draft(&input.get_untracked());
            if let Some(stream_id) = current_stream_id.get_untracked() {
                if let Some(window) = web_sys::window() {
                    let url = format!(
                        "/api/cancel-stream?stream_id={}",
                        urlencoding::encode(&stream_id)
                    );
                    let _ = window.fetch_with_str(&url);
                }
            }
        });
        StoredValue::new(Some(sub))
    };
    on_cleanup(move || {
        subscription.update_value(|sub| {
            if let Some(sub) = sub.take() {
                sub.unsubscribe();
            }
        });
    });

    let history_expiry = expiry.clone();
    let load_history = move |kb: String| {
        let expiry = history_expiry.clone();
        spawn_local(async move {
            match get_chat_history(kb).await {
                Ok(entries) => {
                    set_messages.set(entries.into_iter().map(DisplayMessage::from).collect());
                }
                Err(e) => {
                    // History is best-effort, but a session-expired answer
                    // still has to reach the coordinator.
                    let message = intercept_error(&expiry, &e, None);
                    info!("no chat history loaded: {message}");
                    set_messages.set(Vec::new());
                }
            }
        });
    };

    let clear_expiry = expiry.clone();
    let clear_action = Action::new(move |kb: &String| {
        let kb = kb.clone();
        let expiry = clear_expiry.clone();
        async move {
            clear_chat_history(kb)
                .await
                .map_err(|e| intercept_error(&expiry, &e, None))
        }
    });

    Effect::new(move |_| {
        if let Some(result) = clear_action.value().get() {
            match result {
                Ok(()) => {
                    set_messages.set(Vec::new());
                    show_toast("Chat history cleared".to_string());
                }
                Err(message) => show_toast(message),
            }
        }
    });

    let send_expiry = expiry.clone();
    let send_message = move || {
        let Some(kb) = selected_kb.get_untracked() else {
            show_toast("Select a knowledge base first".to_string());
            return;
        };
        let text = input.get_untracked().trim().to_string();
        if text.is_empty() || is_streaming.get_untracked() {
            return;
        }

        set_input.set(String::new());
        set_is_streaming.set(true);

        let all = messages.get_untracked();
        let start = all.len().saturating_sub(HISTORY_WINDOW);
        let history: Vec<HistoryMessage> = all[start..]
            .iter()
            .filter(|m| !m.error)
            .map(|m| HistoryMessage {
                role: m.role.clone(),
                content: m.content.clone(),
            })
            .collect();

        let placeholder = DisplayMessage::assistant_placeholder();
        let placeholder_id = placeholder.id.clone();
        set_messages.update(|msgs| {
            msgs.push(DisplayMessage::user(text.clone()));
            msgs.push(placeholder);
        });

        let expiry = send_expiry.clone();
        spawn_local(async move {
            let ticket = match open_chat_stream(kb, text, history).await {
                Ok(ticket) => ticket,
                Err(e) => {
                    let message = intercept_error(&expiry, &e, None);
                    fail_bubble(set_messages, &placeholder_id, &message);
                    set_is_streaming.set(false);
                    return;
                }
            };

            let stream_id = ticket.stream_id;
            set_current_stream_id.set(Some(stream_id.clone()));

            let url = format!(
                "/api/chat-stream?stream_id={}",
                urlencoding::encode(&stream_id)
            );
            let event_source = match EventSource::new(&url) {
                Ok(es) => es,
                Err(e) => {
                    error!("failed to open relay stream: {e:?}");
                    fail_bubble(set_messages, &placeholder_id, "failed to open stream");
                    set_is_streaming.set(false);
                    set_current_stream_id.set(None);
                    return;
                }
            };

            let es_for_message = event_source.clone();
            let expiry_for_stream = expiry.clone();
            let pid = placeholder_id.clone();
            let on_message = Closure::wrap(Box::new(move |event: MessageEvent| {
                let Some(data) = event.data().as_string() else {
                    return;
                };

                if data == DONE_SENTINEL {
                    es_for_message.close();
                    set_is_streaming.set(false);
                    set_current_stream_id.set(None);
                    finish_bubble(set_messages, &pid);
                    return;
                }
                if data == CANCELLED_SENTINEL {
                    es_for_message.close();
                    set_is_streaming.set(false);
                    set_current_stream_id.set(None);
                    finish_bubble(set_messages, &pid);
                    return;
                }

                match serde_json::from_str::<RelayMessage>(&data) {
                    Ok(relay) => match relay.message_type.as_str() {
                        "content" => {
                            if let Some(content) = relay.content {
                                append_chunk(set_messages, &pid, &content);
                            }
                        }
                        "error" => {
                            es_for_message.close();
                            set_is_streaming.set(false);
                            set_current_stream_id.set(None);
                            fail_bubble(
                                set_messages,
                                &pid,
                                relay.content.as_deref().unwrap_or("request failed"),
                            );
                        }
                        "session_expired" => {
                            es_for_message.close();
                            set_is_streaming.set(false);
                            set_current_stream_id.set(None);
                            fail_bubble(set_messages, &pid, "session expired, please log in again");
                            expiry_for_stream.handle(ExpiryOptions {
                                immediate: false,
                                return_url: None,
                            });
                        }
                        _ => {}
                    },
                    // Not a relay envelope: treat the payload as a raw text
                    // chunk rather than dropping it.
                    Err(_) => append_chunk(set_messages, &pid, &data),
                }
            }) as Box<dyn FnMut(_)>);

            let es_for_error = event_source.clone();
            let pid_for_error = placeholder_id.clone();
            let on_error = Closure::wrap(Box::new(move |event: ErrorEvent| {
                error!("relay stream connection error: {event:?}");
                es_for_error.close();
                set_is_streaming.set(false);
                set_current_stream_id.set(None);
                fail_bubble(set_messages, &pid_for_error, "connection lost");
            }) as Box<dyn FnMut(_)>);

            event_source.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
            event_source.set_onerror(Some(on_error.as_ref().unchecked_ref()));
            on_message.forget();
            on_error.forget();
        });
    };

    let cancel_message = move || {
        if let Some(stream_id) = current_stream_id.get_untracked() {
            if let Some(window) = web_sys::window() {
                let url = format!(
                    "/api/cancel-stream?stream_id={}",
                    urlencoding::encode(&stream_id)
                );
                spawn_local(async move {
                    if JsFuture::from(window.fetch_with_str(&url)).await.is_ok() {
                        info!("stream cancelled");
                    }
                });
            }
        }
    };

    let send_message_on_enter = send_message.clone();
    let send_or_cancel = move |_: web_sys::MouseEvent| {
        if is_streaming.get() {
            cancel_message();
        } else {
            send_message();
        }
    };

    let list_ref = NodeRef::<leptos::html::Div>::new();
    Effect::new(move |_| {
        messages.get();
        if let Some(div) = list_ref.get() {
            div.set_scroll_top(div.scroll_height());
        }
    });

    view! {
        <div class="container mx-auto px-4 py-6 h-[calc(100vh-7rem)] flex flex-col">
            <div class="flex items-center justify-between mb-4">
                <div class="flex items-center space-x-3">
                    <Icon icon=icondata_bs::BsRobot width="20" height="20"/>
                    <h1 class="text-xl font-bold text-slate-900 dark:text-slate-50">"Chat"</h1>
                    <select
                        class="px-3 py-2 text-sm rounded-md border border-slate-300 dark:border-slate-600 bg-white dark:bg-slate-700 text-slate-800 dark:text-slate-100 focus:outline-none focus:border-indigo-500"
                        prop:value=move || selected_kb.get().unwrap_or_default()
                        on:change=move |ev| {
                            let value = event_target_value(&ev);
                            if value.is_empty() {
                                set_selected_kb.set(None);
                                set_messages.set(Vec::new());
                            } else {
                                set_selected_kb.set(Some(value.clone()));
                                load_history(value);
                            }
                        }
                    >
                        <option value="">"Select a knowledge base..."</option>
                        {move || {
                            kbs.get()
                                .map(|result| match result {
                                    Ok(paged) => {
                                        paged
                                            .items
                                            .into_iter()
                                            .map(|kb| {
                                                view! {
                                                    <option value=kb.id.clone()>{kb.name.clone()}</option>
                                                }
                                            })
                                            .collect_view()
                                            .into_any()
                                    }
                                    Err(_) => {
                                        view! { <option disabled=true>"failed to load"</option> }
                                            .into_any()
                                    }
                                })
                        }}
                    </select>
                </div>
                <button
                    class="px-3 py-2 text-sm rounded-md border border-slate-300 dark:border-slate-600 text-slate-600 dark:text-slate-300 hover:bg-slate-100 dark:hover:bg-slate-700 transition-colors disabled:opacity-40"
                    disabled=move || selected_kb.get().is_none() || messages.get().is_empty()
                    on:click=move |_| {
                        if let Some(kb) = selected_kb.get_untracked() {
                            clear_action.dispatch(kb);
                        }
                    }
                >
                    "Clear History"
                </button>
            </div>

            <div
                node_ref=list_ref
                class="flex-1 overflow-y-auto space-y-3 p-4 bg-slate-50 dark:bg-slate-800/50 rounded-lg border border-slate-200 dark:border-slate-700"
            >
                {move || {
                    let msgs = messages.get();
                    if msgs.is_empty() {
                        view! {
                            <div class="h-full flex flex-col items-center justify-center text-slate-400 dark:text-slate-500">
                                <Icon icon=icondata_bs::BsChatDots width="32" height="32"/>
                                <p class="mt-3 text-sm">
                                    "Pick a knowledge base and ask a question."
                                </p>
                            </div>
                        }
                            .into_any()
                    } else {
                        msgs.into_iter()
                            .map(|message| view! { <MessageBubble message=message/> })
                            .collect_view()
                            .into_any()
                    }
                }}
            </div>

            <div class="flex items-end space-x-3 mt-4">
                <textarea
                    class="flex-1 px-3 py-2 rounded-lg border border-slate-300 dark:border-slate-600 bg-white dark:bg-slate-700 text-slate-800 dark:text-slate-100 focus:outline-none focus:border-indigo-500 resize-none"
                    rows="2"
                    placeholder="Ask a question... (Enter to send, Shift+Enter for newline)"
                    prop:value=input
                    on:input=move |ev| set_input.set(event_target_value(&ev))
                    on:keydown=move |ev| {
                        if ev.key() == "Enter" && !ev.shift_key() {
                            ev.prevent_default();
                            if !is_streaming.get_untracked() {
                                send_message_on_enter();
                            }
                        }
                    }
                ></textarea>
                <button
                    class=move || {
                        format!(
                            "flex items-center space-x-1 px-5 py-2 rounded-lg text-white text-sm font-medium transition-colors {}",
                            if is_streaming.get() {
                                "bg-rose-600 hover:bg-rose-700"
                            } else {
                                "bg-indigo-600 hover:bg-indigo-700"
                            },
                        )
                    }
                    disabled=move || !is_streaming.get() && input.get().trim().is_empty()
                    on:click=send_or_cancel
                >
                    <Icon icon=icondata_bs::BsSend width="14" height="14"/>
                    <span>
                        {move || if is_streaming.get() { "Cancel" } else { "Send" }}
                    </span>
                </button>
            </div>

            <Toast
                message=toast_message
                visible=toast_visible
                on_close=move || set_toast_visible.set(false)
            />
        </div>
    }
}
