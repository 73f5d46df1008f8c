#![recursion_limit = "256"]

pub mod api;
pub mod app;
pub mod auth;
#[cfg(feature = "ssr")]
pub mod backend;
pub mod components;
#[cfg(feature = "ssr")]
pub mod handlers;
pub mod models;
pub mod pages;
pub mod state;
pub mod stream;

#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    use crate::app::*;
    console_error_panic_hook::set_once();
    leptos::mount::hydrate_body(App);
}
