use leptos::prelude::*;

#[component]
pub fn Toast(
    message: ReadSignal<String>,
    visible: ReadSignal<bool>,
    #[prop(into)] on_close: Callback<()>,
) -> impl IntoView {
    view! {
        <div class=move || {
            format!(
                "{} fixed bottom-4 right-4 z-50 max-w-sm px-4 py-3 rounded-lg shadow-lg \
                 bg-slate-800 text-slate-100 dark:bg-slate-200 dark:text-slate-800 \
                 transition-opacity duration-300",
                if visible.get() { "opacity-100" } else { "opacity-0 pointer-events-none" },
            )
        }>
            <div class="flex items-center justify-between space-x-3">
                <span class="text-sm">{message}</span>
                <button
                    class="text-rose-400 hover:text-rose-300 dark:text-rose-600 dark:hover:text-rose-500 font-bold"
                    on:click=move |_| on_close.run(())
                >
                    "✕"
                </button>
            </div>
        </div>
    }
}
