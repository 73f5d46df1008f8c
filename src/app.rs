use leptos::prelude::*;
use leptos_meta::{provide_meta_context, MetaTags, Stylesheet, Title};
use leptos_router::{
    components::{Route, Router, Routes},
    path, StaticSegment,
};

use crate::auth::context::AuthProvider;
use crate::auth::guard::RequireAuth;
use crate::components::layout::MainLayout;
use crate::pages::chat::ChatPage;
use crate::pages::home::HomePage;
use crate::pages::kb_detail::KnowledgebaseDetailPage;
use crate::pages::knowledgebases::KnowledgebasesPage;
use crate::pages::login::LoginPage;
use crate::pages::register::RegisterPage;
use crate::pages::settings::SettingsPage;

pub fn shell(options: LeptosOptions) -> impl IntoView {
    view! {
        <!DOCTYPE html>
        <html lang="en">
            <head>
                <meta charset="utf-8" />
                <meta name="viewport" content="width=device-width, initial-scale=1" />
                <AutoReload options=options.clone() />
                <HydrationScripts options />
                <MetaTags />
            </head>
            <body>
                <App />
            </body>
        </html>
    }
}

#[component]
pub fn App() -> impl IntoView {
    // Provides context that manages stylesheets, titles, meta tags, etc.
    provide_meta_context();

    view! {
        <Stylesheet id="leptos" href="/pkg/ragline.css" />
        <Title text="ragline" />
        <Router>
            <AuthProvider>
                <MainLayout>
                    <Routes fallback=|| "Page not found.".into_view()>
                        <Route path=StaticSegment("") view=HomePage />
                        <Route path=path!("login") view=LoginPage />
                        <Route path=path!("register") view=RegisterPage />
                        <Route
                            path=path!("kb")
                            view=|| {
                                view! {
                                    <RequireAuth>
                                        <KnowledgebasesPage/>
                                    </RequireAuth>
                                }
                            }
                        />
                        <Route
                            path=path!("kb/:id")
                            view=|| {
                                view! {
                                    <RequireAuth>
                                        <KnowledgebaseDetailPage/>
                                    </RequireAuth>
                                }
                            }
                        />
                        <Route
                            path=path!("chat")
                            view=|| {
                                view! {
                                    <RequireAuth>
                                        <ChatPage/>
                                    </RequireAuth>
                                }
                            }
                        />
                        <Route
                            path=path!("settings")
                            view=|| {
                                view! {
                                    <RequireAuth>
                                        <SettingsPage/>
                                    </RequireAuth>
                                }
                            }
                        />
                    </Routes>
                </MainLayout>
            </AuthProvider>
        </Router>
    }
}
