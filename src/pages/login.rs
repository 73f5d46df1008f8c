use leptos::prelude::*;
use leptos_router::hooks::{use_navigate, use_query_map};

use crate::api::friendly_message;
use crate::auth::context::AuthContext;
use crate::auth::login;

/// Login form. A rejected credential surfaces as an inline alert, never as a
/// session-expiry redirect, which would loop the user back here.
#[component]
pub fn LoginPage() -> impl IntoView {
    let auth = expect_context::<AuthContext>();
    let navigate = use_navigate();
    let query = use_query_map();

    let (username, set_username) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (error, set_error) = signal(None::<String>);

    let login_action = Action::new(move |input: &(String, String)| {
        let (username, password) = input.clone();
        async move {
            login(username, password)
                .await
                .map_err(|e| friendly_message(&e))
        }
    });

    Effect::new(move |_| {
        if let Some(result) = login_action.value().get() {
            match result {
                Ok(_user) => {
                    auth.refresh_auth();
                    let target = query
                        .get_untracked()
                        .get("redirect")
                        .unwrap_or_else(|| "/".to_string());
                    navigate(&target, Default::default());
                }
                Err(message) => set_error.set(Some(message)),
            }
        }
    });

    let submit = move || {
        let username_value = username.get_untracked().trim().to_string();
        let password_value = password.get_untracked();
        if username_value.is_empty() || password_value.is_empty() {
            set_error.set(Some("username and password are required".to_string()));
            return;
        }
        set_error.set(None);
        login_action.dispatch((username_value, password_value));
    };

    view! {
        <div class="min-h-[60vh] flex items-center justify-center px-4">
            <div class="w-full max-w-sm bg-white dark:bg-slate-800 rounded-lg shadow-md border border-slate-200 dark:border-slate-700 p-6">
                <h2 class="text-2xl font-bold text-center text-slate-800 dark:text-slate-100 mb-6">
                    "Welcome back"
                </h2>

                <div class="space-y-4">
                    <div>
                        <label class="block text-sm font-medium text-slate-700 dark:text-slate-300 mb-1">
                            "Username"
                        </label>
                        <input
                            type="text"
                            class="w-full px-3 py-2 rounded-md border border-slate-300 dark:border-slate-600 bg-white dark:bg-slate-700 text-slate-800 dark:text-slate-100 focus:outline-none focus:border-indigo-500"
                            prop:value=username
                            on:input=move |ev| set_username.set(event_target_value(&ev))
                        />
                    </div>

                    <div>
                        <label class="block text-sm font-medium text-slate-700 dark:text-slate-300 mb-1">
                            "Password"
                        </label>
                        <input
                            type="password"
                            class="w-full px-3 py-2 rounded-md border border-slate-300 dark:border-slate-600 bg-white dark:bg-slate-700 text-slate-800 dark:text-slate-100 focus:outline-none focus:border-indigo-500"
                            prop:value=password
                            on:input=move |ev| set_password.set(event_target_value(&ev))
                            on:keydown=move |ev| {
                                if ev.key() == "Enter" {
                                    submit();
                                }
                            }
                        />
                    </div>

                    {move || {
                        error
                            .get()
                            .map(|message| {
                                view! {
                                    <div class="px-3 py-2 rounded-md bg-rose-50 dark:bg-rose-900/30 text-sm text-rose-700 dark:text-rose-300">
                                        {message}
                                    </div>
                                }
                            })
                    }}

                    <button
                        class="w-full py-2 rounded-md bg-indigo-600 hover:bg-indigo-700 text-white font-medium transition-colors disabled:opacity-50"
                        disabled=move || login_action.pending().get()
                        on:click=move |_| submit()
                    >
                        {move || if login_action.pending().get() { "Signing in..." } else { "Sign In" }}
                    </button>

                    <p class="text-center text-sm text-slate-500 dark:text-slate-400">
                        "No account yet? "
                        <a href="/register" class="text-indigo-600 dark:text-indigo-400 hover:underline">
                            "Register"
                        </a>
                    </p>
                </div>
            </div>
        </div>
    }
}
