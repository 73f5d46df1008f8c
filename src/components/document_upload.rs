use leptos::prelude::*;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::Event;

use crate::api::intercept_error;
use crate::auth::expiry::SessionExpiry;
use crate::models::document::{
    extension_allowed, human_size, DocumentView, ALLOWED_DOCUMENT_EXTENSIONS, MAX_DOCUMENT_BYTES,
};

#[server(UploadDocument, "/api")]
pub async fn upload_document(
    kb_id: String,
    filename: String,
    data_base64: String,
) -> Result<DocumentView, ServerFnError> {
    #[cfg(feature = "ssr")]
    {
        use crate::auth::{backend_from_context, bearer_token};
        use base64::engine::general_purpose::STANDARD;
        use base64::Engine as _;

        let bearer = bearer_token().await?;
        let backend = backend_from_context()?;
        let bytes = STANDARD
            .decode(data_base64.as_bytes())
            .map_err(|e| ServerFnError::new(format!("invalid document payload: {e}")))?;
        log::info!("uploading {filename} ({} bytes) to kb {kb_id}", bytes.len());
        backend
            .upload_document(&bearer, &kb_id, &filename, bytes)
            .await
            .map_err(|e| ServerFnError::new(e.to_string()))
    }

    #[cfg(not(feature = "ssr"))]
    Err(ServerFnError::new("server-side function called on client"))
}

#[component]
pub fn DocumentUploadModal(
    kb_id: String,
    set_show: WriteSignal<bool>,
    #[prop(into)] on_uploaded: Callback<()>,
) -> impl IntoView {
    let expiry = expect_context::<SessionExpiry>();

    let (error, set_error) = signal(None::<String>);
    // (filename, size, base64 payload) waiting for upload.
    let (selected, set_selected) = signal(None::<(String, f64, String)>);

    let upload_action = Action::new(move |input: &(String, String, String)| {
        let (kb_id, filename, payload) = input.clone();
        let expiry = expiry.clone();
        async move {
            match upload_document(kb_id, filename, payload).await {
                Ok(_) => Ok(()),
                Err(e) => Err(intercept_error(&expiry, &e, None)),
            }
        }
    });

    Effect::new(move |_| {
        if let Some(result) = upload_action.value().get() {
            match result {
                Ok(()) => {
                    set_show.set(false);
                    on_uploaded.run(());
                }
                Err(message) => set_error.set(Some(message)),
            }
        }
    });

    let handle_file = move |ev: Event| {
        set_error.set(None);
        set_selected.set(None);
        let Some(input) = ev
            .target()
            .and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok())
        else {
            return;
        };
        let Some(file) = input.files().and_then(|files| files.get(0)) else {
            return;
        };

        let filename = file.name();
        if !extension_allowed(&filename) {
            set_error.set(Some(format!(
                "unsupported file type; allowed: {}",
                ALLOWED_DOCUMENT_EXTENSIONS.join(", ")
            )));
            return;
        }
        if file.size() > MAX_DOCUMENT_BYTES {
            set_error.set(Some("file is larger than 20 MB".to_string()));
            return;
        }

        let Ok(reader) = web_sys::FileReader::new() else {
            return;
        };
        let reader_for_load = reader.clone();
        let size = file.size();
        let onload = Closure::wrap(Box::new(move |_: Event| {
            if let Ok(result) = reader_for_load.result() {
                if let Some(data_url) = result.as_string() {
                    if let Some((_, payload)) = data_url.split_once(',') {
                        set_selected.set(Some((filename.clone(), size, payload.to_string())));
                    }
                }
            }
        }) as Box<dyn FnMut(_)>);
        reader.set_onload(Some(onload.as_ref().unchecked_ref()));
        onload.forget();
        let _ = reader.read_as_data_url(&file);
    };

    let kb_id_for_upload = kb_id.clone();

    view! {
        <div class="fixed inset-0 bg-black/50 flex items-center justify-center z-50">
            <div class="bg-white dark:bg-slate-800 rounded-lg shadow-xl p-6 w-full max-w-md">
                <div class="flex justify-between items-center mb-4">
                    <h3 class="text-lg font-semibold text-slate-800 dark:text-slate-100">
                        "Upload Document"
                    </h3>
                    <button
                        class="text-slate-400 hover:text-slate-600 dark:hover:text-slate-200"
                        on:click=move |_| set_show.set(false)
                    >
                        "✕"
                    </button>
                </div>

                <div class="space-y-4">
                    <input
                        type="file"
                        accept=".txt,.md,.pdf,.docx"
                        class="block w-full text-sm text-slate-600 dark:text-slate-300"
                        on:change=handle_file
                    />

                    {move || {
                        selected
                            .get()
                            .map(|(filename, size, _)| {
                                view! {
                                    <p class="text-sm text-slate-500 dark:text-slate-400">
                                        {format!("{filename} ({})", human_size(size as i64))}
                                    </p>
                                }
                            })
                    }}

                    {move || {
                        error
                            .get()
                            .map(|message| {
                                view! {
                                    <p class="text-sm text-rose-600 dark:text-rose-400">{message}</p>
                                }
                            })
                    }}

                    <div class="flex justify-end space-x-2">
                        <button
                            class="px-4 py-2 text-sm rounded-md text-slate-600 dark:text-slate-300 hover:bg-slate-100 dark:hover:bg-slate-700"
                            on:click=move |_| set_show.set(false)
                        >
                            "Cancel"
                        </button>
                        <button
                            class="px-4 py-2 text-sm rounded-md bg-indigo-600 hover:bg-indigo-700 text-white disabled:opacity-50 disabled:cursor-not-allowed"
                            disabled=move || {
                                selected.get().is_none() || upload_action.pending().get()
                            }
                            on:click=move |_| {
                                if let Some((filename, _, payload)) = selected.get_untracked() {
                                    upload_action
                                        .dispatch((kb_id_for_upload.clone(), filename, payload));
                                }
                            }
                        >
                            {move || {
                                if upload_action.pending().get() { "Uploading..." } else { "Upload" }
                            }}
                        </button>
                    </div>
                </div>
            </div>
        </div>
    }
}
