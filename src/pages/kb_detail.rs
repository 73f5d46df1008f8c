use leptos::prelude::*;
use leptos_icons::Icon;
use leptos_router::hooks::use_params_map;

use crate::api::intercept_error;
use crate::auth::expiry::SessionExpiry;
use crate::components::document_upload::DocumentUploadModal;
use crate::components::loading::Loading;
use crate::components::toast::Toast;
use crate::models::document::{human_size, DocumentView};
use crate::models::knowledgebase::{Paged, DEFAULT_PAGE_SIZE};
use crate::pages::knowledgebases::get_knowledgebase;

#[server(GetDocuments, "/api")]
pub async fn get_documents(
    kb_id: String,
    page: i64,
    page_size: i64,
) -> Result<Paged<DocumentView>, ServerFnError> {
    #[cfg(feature = "ssr")]
    {
        use crate::auth::{backend_from_context, bearer_token};

        let bearer = bearer_token().await?;
        let backend = backend_from_context()?;
        backend
            .list_documents(&bearer, &kb_id, page, page_size)
            .await
            .map_err(|e| ServerFnError::new(e.to_string()))
    }

    #[cfg(not(feature = "ssr"))]
    Err(ServerFnError::new("server-side function called on client"))
}

#[server(DeleteDocument, "/api")]
pub async fn delete_document(kb_id: String, doc_id: String) -> Result<(), ServerFnError> {
    #[cfg(feature = "ssr")]
    {
        use crate::auth::{backend_from_context, bearer_token};

        let bearer = bearer_token().await?;
        let backend = backend_from_context()?;
        log::info!("deleting document {doc_id} from kb {kb_id}");
        backend
            .delete_document(&bearer, &kb_id, &doc_id)
            .await
            .map_err(|e| ServerFnError::new(e.to_string()))
    }

    #[cfg(not(feature = "ssr"))]
    Err(ServerFnError::new("server-side function called on client"))
}

#[component]
pub fn KnowledgebaseDetailPage() -> impl IntoView {
    let expiry = expect_context::<SessionExpiry>();
    let params = use_params_map();
    let kb_id = Memo::new(move |_| params.get().get("id").unwrap_or_default());

    let (page, set_page) = signal(1i64);
    let (refetch_trigger, set_refetch_trigger) = signal(0u32);
    let (show_upload, set_show_upload) = signal(false);

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

    let knowledgebase = Resource::new(
        move || kb_id.get(),
        |id| async move { get_knowledgebase(id).await },
    );

    let documents = Resource::new(
        move || (kb_id.get(), page.get(), refetch_trigger.get()),
        |(id, page, _)| async move { get_documents(id, page, DEFAULT_PAGE_SIZE).await },
    );

    let delete_expiry = expiry.clone();
    let delete_action = Action::new(move |input: &(String, String)| {
        let (kb, doc) = input.clone();
        let expiry = delete_expiry.clone();
        async move {
            delete_document(kb, doc)
                .await
                .map_err(|e| intercept_error(&expiry, &e, None))
        }
    });

    Effect::new(move |_| {
        if let Some(result) = delete_action.value().get() {
            match result {
                Ok(()) => {
                    show_toast("Document deleted".to_string());
                    set_refetch_trigger.update(|n| *n += 1);
                }
                Err(message) => show_toast(message),
            }
        }
    });

    let on_uploaded = Callback::new(move |_: ()| {
        show_toast("Document uploaded; processing has started".to_string());
        set_refetch_trigger.update(|n| *n += 1);
    });

    let kb_expiry = expiry.clone();
    let docs_expiry = expiry;

    view! {
        <div class="container mx-auto px-4 py-8">
            <a
                href="/kb"
                class="text-sm text-indigo-600 dark:text-indigo-400 hover:underline"
            >
                "← Back to Knowledge Bases"
            </a>

            <Suspense fallback=|| view! { <Loading/> }.into_any()>
                {
                    let expiry = kb_expiry;
                    move || {
                    knowledgebase
                        .get()
                        .map(|result| {
                            match result {
                                Ok(kb) => {
                                    view! {
                                        <div class="flex items-start space-x-4 mt-4 mb-6 bg-white dark:bg-slate-800 rounded-lg shadow-sm border border-slate-200 dark:border-slate-700 p-4">
                                            {kb
                                                .cover_url
                                                .clone()
                                                .map(|url| {
                                                    view! {
                                                        <img
                                                            src=url
                                                            alt="cover"
                                                            class="w-20 h-20 object-cover rounded-md"
                                                        />
                                                    }
                                                })}
                                            <div>
                                                <h1 class="text-2xl font-bold text-slate-900 dark:text-slate-50">
                                                    {kb.name.clone()}
                                                </h1>
                                                <p class="text-sm text-slate-500 dark:text-slate-400 mt-1">
                                                    {kb
                                                        .description
                                                        .clone()
                                                        .unwrap_or_else(|| "No description".to_string())}
                                                </p>
                                                <p class="text-xs text-slate-400 dark:text-slate-500 mt-2">
                                                    {format!(
                                                        "chunk size {} · overlap {}",
                                                        kb.chunk_size.unwrap_or_default(),
                                                        kb.chunk_overlap.unwrap_or_default(),
                                                    )}
                                                </p>
                                            </div>
                                        </div>
                                    }
                                        .into_any()
                                }
                                Err(e) => {
                                    let message = intercept_error(&expiry, &e, None);
                                    view! {
                                        <div class="py-8 text-rose-600 dark:text-rose-400">{message}</div>
                                    }
                                        .into_any()
                                }
                            }
                        })
                }}
            </Suspense>

            <div class="flex items-center justify-between mb-4">
                <h2 class="text-lg font-semibold text-slate-800 dark:text-slate-100">"Documents"</h2>
                <div class="flex items-center space-x-2">
                    <button
                        class="flex items-center space-x-1 px-3 py-2 rounded-md border border-slate-300 dark:border-slate-600 text-sm text-slate-600 dark:text-slate-300 hover:bg-slate-100 dark:hover:bg-slate-700 transition-colors"
                        on:click=move |_| set_refetch_trigger.update(|n| *n += 1)
                    >
                        <Icon icon=icondata_bs::BsArrowRepeat width="14" height="14"/>
                        <span>"Refresh"</span>
                    </button>
                    <button
                        class="flex items-center space-x-1 px-3 py-2 rounded-md bg-indigo-600 hover:bg-indigo-700 text-white text-sm transition-colors"
                        on:click=move |_| set_show_upload.set(true)
                    >
                        <Icon icon=icondata_bs::BsUpload width="14" height="14"/>
                        <span>"Upload"</span>
                    </button>
                </div>
            </div>

            <Suspense fallback=|| view! { <Loading label="Loading documents..."/> }.into_any()>
                {
                    let expiry = docs_expiry;
                    move || {
                    documents
                        .get()
                        .map(|result| {
                            match result {
                                Ok(paged) => {
                                    if paged.items.is_empty() {
                                        view! {
                                            <div class="text-center py-12 text-slate-500 dark:text-slate-400 bg-white dark:bg-slate-800 rounded-lg border border-slate-200 dark:border-slate-700">
                                                <Icon
                                                    icon=icondata_bs::BsFileEarmarkText
                                                    width="28"
                                                    height="28"
                                                />
                                                <p class="mt-2 text-sm">"No documents uploaded yet."</p>
                                            </div>
                                        }
                                            .into_any()
                                    } else {
                                        let page_count = paged.page_count();
                                        view! {
                                            <div class="bg-white dark:bg-slate-800 rounded-lg shadow-sm border border-slate-200 dark:border-slate-700 overflow-hidden">
                                                <table class="w-full text-sm">
                                                    <thead class="bg-slate-50 dark:bg-slate-700 text-left text-slate-600 dark:text-slate-300">
                                                        <tr>
                                                            <th class="px-4 py-3 font-medium">"Name"</th>
                                                            <th class="px-4 py-3 font-medium">"Size"</th>
                                                            <th class="px-4 py-3 font-medium">"Chunks"</th>
                                                            <th class="px-4 py-3 font-medium">"Status"</th>
                                                            <th class="px-4 py-3 font-medium">"Uploaded"</th>
                                                            <th class="px-4 py-3"></th>
                                                        </tr>
                                                    </thead>
                                                    <tbody>
                                                        <For
                                                            each=move || paged.items.clone()
                                                            key=|doc| doc.id.clone()
                                                            children=move |doc| {
                                                                let doc_id = doc.id.clone();
                                                                let kb = kb_id.get_untracked();
                                                                view! {
                                                                    <tr class="border-t border-slate-100 dark:border-slate-700">
                                                                        <td class="px-4 py-3 text-slate-800 dark:text-slate-100">
                                                                            {doc.filename.clone()}
                                                                        </td>
                                                                        <td class="px-4 py-3 text-slate-500 dark:text-slate-400">
                                                                            {doc.size_bytes.map(human_size).unwrap_or_default()}
                                                                        </td>
                                                                        <td class="px-4 py-3 text-slate-500 dark:text-slate-400">
                                                                            {doc.chunk_count.unwrap_or_default()}
                                                                        </td>
                                                                        <td class="px-4 py-3">
                                                                            <span class=format!(
                                                                                "px-2 py-0.5 rounded-full text-xs {}",
                                                                                doc.status.badge_class(),
                                                                            )>{doc.status.label()}</span>
                                                                        </td>
                                                                        <td class="px-4 py-3 text-slate-500 dark:text-slate-400">
                                                                            {doc
                                                                                .created_at
                                                                                .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
                                                                                .unwrap_or_default()}
                                                                        </td>
                                                                        <td class="px-4 py-3 text-right">
                                                                            <button
                                                                                class="p-1 rounded text-slate-400 hover:text-rose-600 transition-colors"
                                                                                on:click=move |_| {
                                                                                    let confirmed = web_sys::window()
                                                                                        .and_then(|w| {
                                                                                            w.confirm_with_message("Delete this document?").ok()
                                                                                        })
                                                                                        .unwrap_or(false);
                                                                                    if confirmed {
                                                                                        delete_action
                                                                                            .dispatch((kb.clone(), doc_id.clone()));
                                                                                    }
                                                                                }
                                                                            >
                                                                                <Icon
                                                                                    icon=icondata_bs::BsTrash3
                                                                                    width="14"
                                                                                    height="14"
                                                                                />
                                                                            </button>
                                                                        </td>
                                                                    </tr>
                                                                }
                                                            }
                                                        />
                                                    </tbody>
                                                </table>
                                                {(page_count > 1)
                                                    .then(|| {
                                                        view! {
                                                            <div class="flex items-center justify-center space-x-3 py-3 text-sm border-t border-slate-100 dark:border-slate-700">
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
                                    let message = intercept_error(&expiry, &e, None);
                                    view! {
                                        <div class="py-8 text-rose-600 dark:text-rose-400">{message}</div>
                                    }
                                        .into_any()
                                }
                            }
                        })
                }}
            </Suspense>

            {move || {
                show_upload
                    .get()
                    .then(|| {
                        view! {
                            <DocumentUploadModal
                                kb_id=kb_id.get_untracked()
                                set_show=set_show_upload
                                on_uploaded=on_uploaded
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
