use leptos::prelude::*;
use leptos_icons::Icon;

use crate::api::intercept_error;
use crate::auth::expiry::SessionExpiry;
use crate::components::kb_form::KnowledgebaseFormModal;
use crate::components::loading::Loading;
use crate::components::toast::Toast;
use crate::models::knowledgebase::{Knowledgebase, KnowledgebaseDraft, Paged, DEFAULT_PAGE_SIZE};

#[server(GetKnowledgebases, "/api")]
pub async fn get_knowledgebases(
    page: i64,
    page_size: i64,
) -> Result<Paged<Knowledgebase>, ServerFnError> {
    #[cfg(feature = "ssr")]
    {
        use crate::auth::{backend_from_context, bearer_token};

        let bearer = bearer_token().await?;
        let backend = backend_from_context()?;
        backend
            .list_knowledgebases(&bearer, page, page_size)
            .await
            .map_err(|e| ServerFnError::new(e.to_string()))
    }

    #[cfg(not(feature = "ssr"))]
    Err(ServerFnError::new("server-side function called on client"))
}

#[server(GetKnowledgebase, "/api")]
pub async fn get_knowledgebase(id: String) -> Result<Knowledgebase, ServerFnError> {
    #[cfg(feature = "ssr")]
    {
        use crate::auth::{backend_from_context, bearer_token};

        let bearer = bearer_token().await?;
        let backend = backend_from_context()?;
        backend
            .get_knowledgebase(&bearer, &id)
            .await
            .map_err(|e| ServerFnError::new(e.to_string()))
    }

    #[cfg(not(feature = "ssr"))]
    Err(ServerFnError::new("server-side function called on client"))
}

#[server(CreateKnowledgebase, "/api")]
pub async fn create_knowledgebase(draft: KnowledgebaseDraft) -> Result<Knowledgebase, ServerFnError> {
    #[cfg(feature = "ssr")]
    {
        use crate::auth::{backend_from_context, bearer_token};

        let bearer = bearer_token().await?;
        let backend = backend_from_context()?;
        log::info!("creating knowledge base {}", draft.name);
        backend
            .create_knowledgebase(&bearer, &draft)
            .await
            .map_err(|e| ServerFnError::new(e.to_string()))
    }

    #[cfg(not(feature = "ssr"))]
    Err(ServerFnError::new("server-side function called on client"))
}

#[server(UpdateKnowledgebase, "/api")]
pub async fn update_knowledgebase(
    id: String,
    draft: KnowledgebaseDraft,
) -> Result<Knowledgebase, ServerFnError> {
    #[cfg(feature = "ssr")]
    {
        use crate::auth::{backend_from_context, bearer_token};

        let bearer = bearer_token().await?;
        let backend = backend_from_context()?;
        backend
            .update_knowledgebase(&bearer, &id, &draft)
            .await
            .map_err(|e| ServerFnError::new(e.to_string()))
    }

    #[cfg(not(feature = "ssr"))]
    Err(ServerFnError::new("server-side function called on client"))
}

#[server(DeleteKnowledgebase, "/api")]
pub async fn delete_knowledgebase(id: String) -> Result<(), ServerFnError> {
    #[cfg(feature = "ssr")]
    {
        use crate::auth::{backend_from_context, bearer_token};

        let bearer = bearer_token().await?;
        let backend = backend_from_context()?;
        log::info!("deleting knowledge base {id}");
        backend
            .delete_knowledgebase(&bearer, &id)
            .await
            .map_err(|e| ServerFnError::new(e.to_string()))
    }

    #[cfg(not(feature = "ssr"))]
    Err(ServerFnError::new("server-side function called on client"))
}

#[component]
fn KnowledgebaseCard(
    kb: Knowledgebase,
    #[prop(into)] on_edit: Callback<Knowledgebase>,
    #[prop(into)] on_delete: Callback<String>,
) -> impl IntoView {
    let kb_for_edit = kb.clone();
    let kb_id_for_delete = kb.id.clone();
    let detail_href = format!("/kb/{}", kb.id);
    let document_count = kb.document_count.unwrap_or(0);
    let created = kb
        .created_at
        .map(|ts| ts.format("%Y-%m-%d").to_string())
        .unwrap_or_default();

    view! {
        <div class="bg-white dark:bg-slate-800 rounded-lg shadow-sm border border-slate-200 dark:border-slate-700 overflow-hidden flex flex-col">
            {kb
                .cover_url
                .clone()
                .map(|url| {
                    view! { <img src=url alt="cover" class="w-full h-32 object-cover"/> }
                })}
            <div class="p-4 flex-1 flex flex-col">
                <a
                    href=detail_href
                    class="font-semibold text-slate-800 dark:text-slate-100 hover:text-indigo-600 dark:hover:text-indigo-400"
                >
                    {kb.name.clone()}
                </a>
                <p class="text-sm text-slate-500 dark:text-slate-400 mt-1 flex-1">
                    {kb.description.clone().unwrap_or_else(|| "No description".to_string())}
                </p>
                <div class="flex items-center justify-between mt-4 text-xs text-slate-400 dark:text-slate-500">
                    <span>{format!("{document_count} documents")}</span>
                    <span>{created}</span>
                </div>
                <div class="flex justify-end space-x-2 mt-3">
                    <button
                        class="p-2 rounded-md text-slate-500 hover:text-indigo-600 hover:bg-slate-100 dark:hover:bg-slate-700 transition-colors"
                        on:click=move |_| on_edit.run(kb_for_edit.clone())
                    >
                        <Icon icon=icondata_bs::BsPencil width="14" height="14"/>
                    </button>
                    <button
                        class="p-2 rounded-md text-slate-500 hover:text-rose-600 hover:bg-slate-100 dark:hover:bg-slate-700 transition-colors"
                        on:click=move |_| on_delete.run(kb_id_for_delete.clone())
                    >
                        <Icon icon=icondata_bs::BsTrash3 width="14" height="14"/>
                    </button>
                </div>
            </div>
        </div>
    }
}

#[component]
pub fn KnowledgebasesPage() -> impl IntoView {
    let expiry = expect_context::<SessionExpiry>();

    let (page, set_page) = signal(1i64);
    let (refetch_trigger, set_refetch_trigger) = signal(0u32);
    let (show_form, set_show_form) = signal(false);
    let (editing, set_editing) = signal(None::<Knowledgebase>);

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

    let knowledgebases = Resource::new(
        move || (page.get(), refetch_trigger.get()),
        |(page, _)| async move { get_knowledgebases(page, DEFAULT_PAGE_SIZE).await },
    );

    let delete_expiry = expiry.clone();
    let delete_action = Action::new(move |id: &String| {
        let id = id.clone();
        let expiry = delete_expiry.clone();
        async move {
            delete_knowledgebase(id)
                .await
                .map_err(|e| intercept_error(&expiry, &e, None))
        }
    });

    Effect::new(move |_| {
        if let Some(result) = delete_action.value().get() {
            match result {
                Ok(()) => {
                    show_toast("Knowledge base deleted".to_string());
                    set_refetch_trigger.update(|n| *n += 1);
                }
                Err(message) => show_toast(message),
            }
        }
    });

    let on_delete = Callback::new(move |id: String| {
        let confirmed = web_sys::window()
            .and_then(|w| {
                w.confirm_with_message("Delete this knowledge base and all its documents?")
                    .ok()
            })
            .unwrap_or(false);
        if confirmed {
            delete_action.dispatch(id);
        }
    });

    let on_edit = Callback::new(move |kb: Knowledgebase| {
        set_editing.set(Some(kb));
        set_show_form.set(true);
    });

    let on_saved = Callback::new(move |_: ()| {
        set_editing.set(None);
        set_refetch_trigger.update(|n| *n += 1);
    });

    view! {
        <div class="container mx-auto px-4 py-8">
            <div class="flex items-center justify-between mb-6">
                <h1 class="text-2xl font-bold text-slate-900 dark:text-slate-50">
                    "Knowledge Bases"
                </h1>
                <button
                    class="flex items-center space-x-1 px-4 py-2 rounded-md bg-indigo-600 hover:bg-indigo-700 text-white text-sm transition-colors"
                    on:click=move |_| {
                        set_editing.set(None);
                        set_show_form.set(true);
                    }
                >
                    <Icon icon=icondata_bs::BsPlus width="18" height="18"/>
                    <span>"New Knowledge Base"</span>
                </button>
            </div>

            <Suspense fallback=|| view! { <Loading/> }.into_any()>
                {move || {
                    knowledgebases
                        .get()
                        .map(|result| {
                            match result {
                                Ok(paged) => {
                                    if paged.items.is_empty() {
                                        view! {
                                            <div class="text-center py-16 text-slate-500 dark:text-slate-400">
                                                <p class="mb-2">"No knowledge bases yet."</p>
                                                <p class="text-sm">
                                                    "Create one and upload documents to start chatting."
                                                </p>
                                            </div>
                                        }
                                            .into_any()
                                    } else {
                                        let page_count = paged.page_count();
                                        view! {
                                            <div>
                                                <div class="grid grid-cols-1 md:grid-cols-2 lg:grid-cols-3 gap-4">
                                                    <For
                                                        each=move || paged.items.clone()
                                                        key=|kb| kb.id.clone()
                                                        children=move |kb| {
                                                            view! {
                                                                <KnowledgebaseCard
                                                                    kb=kb
                                                                    on_edit=on_edit
                                                                    on_delete=on_delete
                                                                />
                                                            }
                                                        }
                                                    />
                                                </div>
                                                {(page_count > 1)
                                                    .then(|| {
                                                        view! {
                                                            <div class="flex items-center justify-center space-x-3 mt-6 text-sm">
                                                                <button
                                                                    class="px-3 py-1 rounded-md border border-slate-300 dark:border-slate-600 disabled:opacity-40"
                                                                    disabled=move || page.get() <= 1
                                                                    on:click=move |_| set_page.update(|p| *p -= 1)
                                                                >
                                                                    "Previous"
                                                                </button>
                                                                <span class="text-slate-500 dark:text-slate-400">
                                                                    {move || format!("Page {} of {page_count}", page.get())}
                                                                </span>
                                                                <button
                                                                    class="px-3 py-1 rounded-md border border-slate-300 dark:border-slate-600 disabled:opacity-40"
                                                                    disabled=move || page.get() >= page_count
                                                                    on:click=move |_| set_page.update(|p| *p += 1)
                                                                >
                                                                    "Next"
                                                                </button>
                                                            </div>
                                                        }
                                                    })}
                                            </div>
                                        }
                                            .into_any()
                                    }
                                }
                                Err(e) => {
                                    let message = intercept_error(&expiry, &e, Some("/kb".to_string()));
                                    view! {
                                        <div class="text-center py-16 text-rose-600 dark:text-rose-400">
                                            {message}
                                        </div>
                                    }
                                        .into_any()
                                }
                            }
                        })
                }}
            </Suspense>

            {move || {
                show_form
                    .get()
                    .then(|| {
                        view! {
                            <KnowledgebaseFormModal
                                existing=editing.get_untracked()
                                set_show=set_show_form
                                on_saved=on_saved
                            />
                        }
                    })
            }}

            <Toast
                message=toast_message
                visible=toast_visible
                on_close=move || set_toast_visible.set(false)
            />
        </div>
    }
}
