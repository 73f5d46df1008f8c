use leptos::{prelude::*, task::spawn_local};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::Event;

use crate::api::intercept_error;
use crate::auth::expiry::SessionExpiry;
use crate::models::upload::{UploadedImage, ALLOWED_IMAGE_TYPES, MAX_IMAGE_BYTES};

#[server(UploadImage, "/api")]
pub async fn upload_image(
    filename: String,
    content_type: String,
    data_base64: String,
) -> Result<UploadedImage, ServerFnError> {
    #[cfg(feature = "ssr")]
    {
        use crate::auth::{backend_from_context, bearer_token};
        use base64::engine::general_purpose::STANDARD;
        use base64::Engine as _;

        let bearer = bearer_token().await?;
        let backend = backend_from_context()?;
        let bytes = STANDARD
            .decode(data_base64.as_bytes())
            .map_err(|e| ServerFnError::new(format!("invalid image payload: {e}")))?;
        backend
            .upload_image(&bearer, &filename, &content_type, bytes, "covers")
            .await
            .map_err(|e| ServerFnError::new(e.to_string()))
    }

    #[cfg(not(feature = "ssr"))]
    Err(ServerFnError::new("server-side function called on client"))
}

#[server(GetFileUrl, "/api")]
pub async fn get_file_url(object_key: String, expires: i64) -> Result<String, ServerFnError> {
    #[cfg(feature = "ssr")]
    {
        use crate::auth::{backend_from_context, bearer_token};

        let bearer = bearer_token().await?;
        let backend = backend_from_context()?;
        backend
            .file_url(&bearer, &object_key, expires)
            .await
            .map(|f| f.url)
            .map_err(|e| ServerFnError::new(e.to_string()))
    }

    #[cfg(not(feature = "ssr"))]
    Err(ServerFnError::new("server-side function called on client"))
}

/// Cover image picker: validates type and size locally, previews through a
/// data URL, ships the base64 payload through the upload server fn.
#[component]
pub fn ImageUploader(
    #[prop(optional_no_strip)] initial_url: Option<String>,
    #[prop(into)] on_uploaded: Callback<UploadedImage>,
) -> impl IntoView {
    let expiry = expect_context::<SessionExpiry>();

    let (preview, set_preview) = signal(initial_url);
    let (error, set_error) = signal(None::<String>);
    // (filename, content type, base64 payload) waiting for upload.
    let (selected, set_selected) = signal(None::<(String, String, String)>);

    let upload_action = Action::new(move |input: &(String, String, String)| {
        let (filename, content_type, payload) = input.clone();
        let expiry = expiry.clone();
        async move {
            match upload_image(filename, content_type, payload).await {
                Ok(image) => Ok(image),
                Err(e) => Err(intercept_error(&expiry, &e, None)),
            }
        }
    });

    Effect::new(move |_| {
        if let Some(result) = upload_action.value().get() {
            match result {
                Ok(image) => {
                    set_preview.set(Some(image.url.clone()));
                    set_selected.set(None);
                    set_error.set(None);
                    // The upload response carries a short-lived link; swap the
                    // preview to a signed URL with a known expiry.
                    let object_key = image.object_key.clone();
                    spawn_local(async move {
                        if let Ok(url) = get_file_url(object_key, 3600).await {
                            set_preview.set(Some(url));
                        }
                    });
                    on_uploaded.run(image);
                }
                Err(message) => set_error.set(Some(message)),
            }
        }
    });

    let handle_file = move |ev: Event| {
        set_error.set(None);
        let Some(input) = ev
            .target()
            .and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok())
        else {
            return;
        };
        let Some(file) = input.files().and_then(|files| files.get(0)) else {
            return;
        };

        let content_type = file.type_();
        if !ALLOWED_IMAGE_TYPES.contains(&content_type.as_str()) {
            set_error.set(Some("only png, jpeg, or webp images are supported".to_string()));
            return;
        }
        if file.size() > MAX_IMAGE_BYTES {
            set_error.set(Some("image is larger than 5 MB".to_string()));
            return;
        }

        let Ok(reader) = web_sys::FileReader::new() else {
            return;
        };
        let reader_for_load = reader.clone();
        let filename = file.name();
        let onload = Closure::wrap(Box::new(move |_: Event| {
            if let Ok(result) = reader_for_load.result() {
                if let Some(data_url) = result.as_string() {
                    if let Some((_, payload)) = data_url.split_once(',') {
                        set_preview.set(Some(data_url.clone()));
                        set_selected.set(Some((
                            filename.clone(),
                            content_type.clone(),
                            payload.to_string(),
                        )));
                    }
                }
            }
        }) as Box<dyn FnMut(_)>);
        reader.set_onload(Some(onload.as_ref().unchecked_ref()));
        onload.forget();
        let _ = reader.read_as_data_url(&file);
    };

    view! {
        <div class="space-y-2">
            {move || {
                preview
                    .get()
                    .map(|url| {
                        view! {
                            <img
                                src=url
                                alt="cover preview"
                                class="w-24 h-24 object-cover rounded-md border border-slate-300 dark:border-slate-600"
                            />
                        }
                    })
            }}
            <input
                type="file"
                accept="image/png,image/jpeg,image/webp"
                class="block text-sm text-slate-600 dark:text-slate-300"
                on:change=handle_file
            />
            {move || {
                selected
                    .get()
                    .map(|(filename, _, _)| {
                        view! {
                            <button
                                class="px-3 py-1 text-sm rounded-md bg-indigo-600 hover:bg-indigo-700 text-white disabled:opacity-50"
                                disabled=move || upload_action.pending().get()
                                on:click=move |_| {
                                    if let Some(input) = selected.get_untracked() {
                                        upload_action.dispatch(input);
                                    }
                                }
                            >
                                {move || {
                                    if upload_action.pending().get() {
                                        "Uploading...".to_string()
                                    } else {
                                        format!("Upload {filename}")
                                    }
                                }}
                            </button>
                        }
                    })
            }}
            {move || {
                error
                    .get()
                    .map(|message| {
                        view! { <p class="text-sm text-rose-600 dark:text-rose-400">{message}</p> }
                    })
            }}
        </div>
    }
}
