use leptos::prelude::*;

use crate::api::intercept_error;
use crate::auth::expiry::SessionExpiry;
use crate::components::loading::Loading;
use crate::components::toast::Toast;
use crate::models::settings::{AppSettings, ModelCatalog};

#[server(GetSettings, "/api")]
pub async fn get_settings() -> Result<AppSettings, ServerFnError> {
    #[cfg(feature = "ssr")]
    {
        use crate::auth::{backend_from_context, bearer_token};

        let bearer = bearer_token().await?;
        let backend = backend_from_context()?;
        backend
            .settings(&bearer)
            .await
            .map_err(|e| ServerFnError::new(e.to_string()))
    }

    #[cfg(not(feature = "ssr"))]
    Err(ServerFnError::new("server-side function called on client"))
}

#[server(UpdateSettings, "/api")]
pub async fn update_settings(settings: AppSettings) -> Result<AppSettings, ServerFnError> {
    #[cfg(feature = "ssr")]
    {
        use crate::auth::{backend_from_context, bearer_token};

        let bearer = bearer_token().await?;
        let backend = backend_from_context()?;
        log::info!(
            "updating settings: llm={} embedding={}",
            settings.llm_model,
            settings.embedding_model
        );
        backend
            .update_settings(&bearer, &settings)
            .await
            .map_err(|e| ServerFnError::new(e.to_string()))
    }

    #[cfg(not(feature = "ssr"))]
    Err(ServerFnError::new("server-side function called on client"))
}

#[server(GetModelCatalog, "/api")]
pub async fn get_model_catalog() -> Result<ModelCatalog, ServerFnError> {
    #[cfg(feature = "ssr")]
    {
        use crate::auth::{backend_from_context, bearer_token};

        let bearer = bearer_token().await?;
        let backend = backend_from_context()?;
        backend
            .model_catalog(&bearer)
            .await
            .map_err(|e| ServerFnError::new(e.to_string()))
    }

    #[cfg(not(feature = "ssr"))]
    Err(ServerFnError::new("server-side function called on client"))
}

#[component]
pub fn SettingsPage() -> impl IntoView {
    let expiry = expect_context::<SessionExpiry>();

    let (llm_model, set_llm_model) = signal(String::new());
    let (embedding_model, set_embedding_model) = signal(String::new());
    let (temperature, set_temperature) = signal(String::new());
    let (top_k, set_top_k) = signal(String::new());
    let (initialized, set_initialized) = signal(false);

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

    let data = Resource::new(
        || (),
        |_| async move {
            let settings = get_settings().await;
            let catalog = get_model_catalog().await;
            (settings, catalog)
        },
    );

    // Seed the form once when the settings arrive.
    Effect::new(move |_| {
        if initialized.get_untracked() {
            return;
        }
        if let Some((Ok(settings), _)) = data.get() {
            set_llm_model.set(settings.llm_model);
            set_embedding_model.set(settings.embedding_model);
            set_temperature.set(settings.temperature.to_string());
            set_top_k.set(settings.top_k.to_string());
            set_initialized.set(true);
        }
    });

    let save_expiry = expiry.clone();
    let save_action = Action::new(move |settings: &AppSettings| {
        let settings = settings.clone();
        let expiry = save_expiry.clone();
        async move {
            update_settings(settings)
                .await
                .map_err(|e| intercept_error(&expiry, &e, Some("/settings".to_string())))
        }
    });

    Effect::new(move |_| {
        if let Some(result) = save_action.value().get() {
            match result {
                Ok(_) => show_toast("Settings saved".to_string()),
                Err(message) => show_toast(message),
            }
        }
    });

    let submit = move |_| {
        let settings = AppSettings {
            llm_model: llm_model.get_untracked(),
            embedding_model: embedding_model.get_untracked(),
            temperature: temperature
                .get_untracked()
                .parse::<f64>()
                .unwrap_or(0.7)
                .clamp(0.0, 2.0),
            top_k: top_k.get_untracked().parse::<i32>().unwrap_or(5).clamp(1, 20),
        };
        save_action.dispatch(settings);
    };

    let select_class = "w-full px-3 py-2 rounded-md border border-slate-300 dark:border-slate-600 \
                        bg-white dark:bg-slate-700 text-slate-800 dark:text-slate-100 \
                        focus:outline-none focus:border-indigo-500";

    view! {
        <div class="container mx-auto px-4 py-8 max-w-xl">
            <h1 class="text-2xl font-bold text-slate-900 dark:text-slate-50 mb-6">"Settings"</h1>

            <Suspense fallback=|| view! { <Loading/> }.into_any()>
                {move || {
                    data.get()
                        .map(|(settings, catalog)| {
                            match settings {
                                Ok(_) => {
                                    let catalog = catalog.unwrap_or_else(|_| ModelCatalog::default());
                                    let llm_options = catalog.llm_models.clone();
                                    let embedding_options = catalog.embedding_models.clone();
                                    view! {
                                        <div class="bg-white dark:bg-slate-800 rounded-lg shadow-sm border border-slate-200 dark:border-slate-700 p-6 space-y-4">
                                            <div>
                                                <label class="block text-sm font-medium text-slate-700 dark:text-slate-300 mb-1">
                                                    "Chat Model"
                                                </label>
                                                <select
                                                    class=select_class
                                                    prop:value=move || llm_model.get()
                                                    on:change=move |ev| set_llm_model.set(event_target_value(&ev))
                                                >
                                                    {llm_options
                                                        .into_iter()
                                                        .map(|model| {
                                                            view! { <option value=model.clone()>{model.clone()}</option> }
                                                        })
                                                        .collect_view()}
                                                </select>
                                            </div>

                                            <div>
                                                <label class="block text-sm font-medium text-slate-700 dark:text-slate-300 mb-1">
                                                    "Embedding Model"
                                                </label>
                                                <select
                                                    class=select_class
                                                    prop:value=move || embedding_model.get()
                                                    on:change=move |ev| {
                                                        set_embedding_model.set(event_target_value(&ev))
                                                    }
                                                >
                                                    {embedding_options
                                                        .into_iter()
                                                        .map(|model| {
                                                            view! { <option value=model.clone()>{model.clone()}</option> }
                                                        })
                                                        .collect_view()}
                                                </select>
                                            </div>

                                            <div class="grid grid-cols-2 gap-4">
                                                <div>
                                                    <label class="block text-sm font-medium text-slate-700 dark:text-slate-300 mb-1">
                                                        "Temperature (0-2)"
                                                    </label>
                                                    <input
                                                        type="number"
                                                        step="0.1"
                                                        min="0"
                                                        max="2"
                                                        class=select_class
                                                        prop:value=temperature
                                                        on:input=move |ev| set_temperature.set(event_target_value(&ev))
                                                    />
                                                </div>
                                                <div>
                                                    <label class="block text-sm font-medium text-slate-700 dark:text-slate-300 mb-1">
                                                        "Retrieved Chunks (1-20)"
                                                    </label>
                                                    <input
                                                        type="number"
                                                        min="1"
                                                        max="20"
                                                        class=select_class
                                                        prop:value=top_k
                                                        on:input=move |ev| set_top_k.set(event_target_value(&ev))
                                                    />
                                                </div>
                                            </div>

                                            <div class="flex justify-end">
                                                <button
                                                    class="px-4 py-2 rounded-md bg-indigo-600 hover:bg-indigo-700 text-white text-sm transition-colors disabled:opacity-50"
                                                    disabled=move || save_action.pending().get()
                                                    on:click=submit
                                                >
                                                    {move || {
                                                        if save_action.pending().get() {
                                                            "Saving..."
                                                        } else {
                                                            "Save Settings"
                                                        }
                                                    }}
                                                </button>
                                            </div>
                                        </div>
                                    }
                                        .into_any()
                                }
                                Err(e) => {
                                    let message = intercept_error(
                                        &expiry,
                                        &e,
                                        Some("/settings".to_string()),
                                    );
                                    view! {
                                        <div class="py-8 text-rose-600 dark:text-rose-400">{message}</div>
                                    }
                                        .into_any()
                                }
                            }
                        })
                }}
            </Suspense>

            <Toast
                message=toast_message
                visible=toast_visible
                on_close=move || set_toast_visible.set(false)
            />
        </div>
    }
}
