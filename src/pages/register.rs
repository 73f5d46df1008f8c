use leptos::prelude::*;
use leptos_router::hooks::use_navigate;

use crate::api::friendly_message;
use crate::auth::register;

#[component]
pub fn RegisterPage() -> impl IntoView {
    let navigate = use_navigate();

    let (username, set_username) = signal(String::new());
    let (email, set_email) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (confirm, set_confirm) = signal(String::new());
    let (error, set_error) = signal(None::<String>);

    let register_action = Action::new(move |input: &(String, String, Option<String>)| {
        let (username, password, email) = input.clone();
        async move {
            register(username, password, email)
                .await
                .map_err(|e| friendly_message(&e))
        }
    });

    Effect::new(move |_| {
        if let Some(result) = register_action.value().get() {
            match result {
                Ok(()) => navigate("/login", Default::default()),
                Err(message) => set_error.set(Some(message)),
            }
        }
    });

    let submit = move || {
        let username_value = username.get_untracked().trim().to_string();
        let password_value = password.get_untracked();
        if username_value.len() < 3 {
            set_error.set(Some("username must be at least 3 characters".to_string()));
            return;
        }
        if password_value.len() < 6 {
            set_error.set(Some("password must be at least 6 characters".to_string()));
            return;
        }
        if password_value != confirm.get_untracked() {
            set_error.set(Some("passwords do not match".to_string()));
            return;
        }
        let email_value = email.get_untracked().trim().to_string();
        set_error.set(None);
        register_action.dispatch((
            username_value,
            password_value,
            (!email_value.is_empty()).then_some(email_value),
        ));
    };

    let field_class = "w-full px-3 py-2 rounded-md border border-slate-300 dark:border-slate-600 \
                       bg-white dark:bg-slate-700 text-slate-800 dark:text-slate-100 \
                       focus:outline-none focus:border-indigo-500";

    view! {
        <div class="min-h-[60vh] flex items-center justify-center px-4">
            <div class="w-full max-w-sm bg-white dark:bg-slate-800 rounded-lg shadow-md border border-slate-200 dark:border-slate-700 p-6">
                <h2 class="text-2xl font-bold text-center text-slate-800 dark:text-slate-100 mb-6">
                    "Create an account"
                </h2>

                <div class="space-y-4">
                    <div>
                        <label class="block text-sm font-medium text-slate-700 dark:text-slate-300 mb-1">
                            "Username"
                        </label>
                        <input
                            type="text"
                            class=field_class
                            prop:value=username
                            on:input=move |ev| set_username.set(event_target_value(&ev))
                        />
                    </div>

                    <div>
                        <label class="block text-sm font-medium text-slate-700 dark:text-slate-300 mb-1">
                            "Email (optional)"
                        </label>
                        <input
                            type="email"
                            class=field_class
                            prop:value=email
                            on:input=move |ev| set_email.set(event_target_value(&ev))
                        />
                    </div>

                    <div>
                        <label class="block text-sm font-medium text-slate-700 dark:text-slate-300 mb-1">
                            "Password"
                        </label>
                        <input
                            type="password"
                            class=field_class
                            prop:value=password
                            on:input=move |ev| set_password.set(event_target_value(&ev))
                        />
                    </div>

                    <div>
                        <label class="block text-sm font-medium text-slate-700 dark:text-slate-300 mb-1">
                            "Confirm Password"
                        </label>
                        <input
                            type="password"
                            class=field_class
                            prop:value=confirm
                            on:input=move |ev| set_confirm.set(event_target_value(&ev))
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
                        disabled=move || register_action.pending().get()
                        on:click=move |_| submit()
                    >
                        {move || {
                            if register_action.pending().get() { "Creating..." } else { "Register" }
                        }}
                    </button>

                    <p class="text-center text-sm text-slate-500 dark:text-slate-400">
                        "Already registered? "
                        <a href="/login" class="text-indigo-600 dark:text-indigo-400 hover:underline">
                            "Sign in"
                        </a>
                    </p>
                </div>
            </div>
        </div>
    }
}
