use cfg_if::cfg_if;

cfg_if! {
    if #[cfg(feature = "ssr")] {
        use axum::extract::FromRef;
        use leptos::prelude::LeptosOptions;

        use crate::backend::Backend;
        use crate::stream::relay::StreamRegistry;

        #[derive(FromRef, Clone)]
        pub struct AppState {
            pub leptos_options: LeptosOptions,
            pub backend: Backend,
            pub streams: StreamRegistry,
        }

        impl AppState {
            pub fn new(leptos_options: LeptosOptions) -> Self {
                Self {
                    leptos_options,
                    backend: Backend::from_env(),
                    streams: StreamRegistry::new(),
                }
            }
        }
    }
}
