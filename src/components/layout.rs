use leptos::prelude::*;
use leptos_icons::Icon;
use leptos_router::hooks::{use_location, use_navigate};

use crate::auth::context::AuthContext;
use crate::auth::events::{AuthEvents, AuthNotice, LOGOUT_EVENT};
use crate::auth::Logout;
use crate::components::dark_mode_toggle::DarkModeToggle;

#[component]
fn NavLink(href: &'static str, label: &'static str, icon: icondata_core::Icon) -> impl IntoView {
    let location = use_location();
    let is_active = Memo::new(move |_| {
        let path = location.pathname.get();
        path == href || path.starts_with(&format!("{href}/"))
    });

    view! {
        <a
            href=href
            class=move || {
                format!(
                    "flex items-center space-x-1 px-3 py-2 rounded-md text-sm transition-colors {}",
                    if is_active.get() {
                        "bg-indigo-100 text-indigo-700 dark:bg-slate-700 dark:text-indigo-300"
                    } else {
                        "text-slate-600 hover:bg-slate-200 dark:text-slate-300 dark:hover:bg-slate-700"
                    },
                )
            }
        >
            <Icon icon=icon width="14" height="14"/>
            <span>{label}</span>
        </a>
    }
}

#[component]
pub fn Header() -> impl IntoView {
    let auth = expect_context::<AuthContext>();
    let events = expect_context::<AuthEvents>();
    let logout_action = ServerAction::<Logout>::new();
    let navigate = use_navigate();

    let is_authenticated = auth.is_authenticated;
    let current_user = auth.current_user;

    Effect::new(move |_| {
        if logout_action.value().get().is_some() {
            events.publish(LOGOUT_EVENT, &AuthNotice::default());
            auth.refresh_auth();
            navigate("/", Default::default());
        }
    });

    let user_chip = move || {
        current_user.get().map(|user| {
            view! {
                <span class="flex items-center space-x-1 text-sm text-slate-600 dark:text-slate-300">
                    <Icon icon=icondata_bs::BsPersonCircle width="16" height="16"/>
                    <span>{user.username}</span>
                </span>
            }
        })
    };

    view! {
        <header class="bg-white dark:bg-slate-800 border-b border-slate-200 dark:border-slate-700 shadow-sm">
            <div class="container mx-auto px-4 h-14 flex items-center justify-between">
                <div class="flex items-center space-x-6">
                    <a href="/" class="text-xl font-bold text-indigo-600 dark:text-indigo-400">
                        "ragline"
                    </a>
                    {move || {
                        is_authenticated
                            .get()
                            .then(|| {
                                view! {
                                    <nav class="flex items-center space-x-1">
                                        <NavLink
                                            href="/kb"
                                            label="Knowledge Bases"
                                            icon=icondata_bs::BsDatabase
                                        />
                                        <NavLink href="/chat" label="Chat" icon=icondata_bs::BsChatDots/>
                                        <NavLink
                                            href="/settings"
                                            label="Settings"
                                            icon=icondata_bs::BsGear
                                        />
                                    </nav>
                                }
                            })
                    }}
                </div>
                <div class="flex items-center space-x-3">
                    <DarkModeToggle/>
                    {move || {
                        if is_authenticated.get() {
                            view! {
                                <div class="flex items-center space-x-3">
                                    {user_chip()}
                                    <button
                                        class="px-3 py-1 text-sm rounded-md bg-rose-600 hover:bg-rose-700 text-white transition-colors"
                                        on:click=move |_| {
                                            logout_action.dispatch(Logout {});
                                        }
                                    >
                                        "Logout"
                                    </button>
                                </div>
                            }
                                .into_any()
                        } else {
                            view! {
                                <div class="flex items-center space-x-2">
                                    <a
                                        href="/login"
                                        class="px-3 py-1 text-sm rounded-md text-indigo-600 dark:text-indigo-400 hover:underline"
                                    >
                                        "Login"
                                    </a>
                                    <a
                                        href="/register"
                                        class="px-3 py-1 text-sm rounded-md bg-indigo-600 hover:bg-indigo-700 text-white transition-colors"
                                    >
                                        "Register"
                                    </a>
                                </div>
                            }
                                .into_any()
                        }
                    }}
                </div>
            </div>
        </header>
    }
}

#[component]
pub fn Footer() -> impl IntoView {
    view! {
        <footer class="py-4 text-center text-xs text-slate-400 dark:text-slate-500">
            <span>"ragline"</span>
            <span class="mx-1">"·"</span>
            <span>"retrieval-augmented chat over your documents"</span>
        </footer>
    }
}

#[component]
pub fn MainLayout(children: Children) -> impl IntoView {
    view! {
        <div class="min-h-screen flex flex-col bg-slate-100 dark:bg-slate-900">
            <Header/>
            <main class="flex-1">{children()}</main>
            <Footer/>
        </div>
    }
}
