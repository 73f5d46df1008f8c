use leptos::prelude::*;

#[component]
pub fn Loading(#[prop(optional)] label: Option<&'static str>) -> impl IntoView {
    view! {
        <div class="flex items-center justify-center py-16">
            <div class="w-8 h-8 border-4 border-indigo-200 border-t-indigo-600 dark:border-slate-600 dark:border-t-indigo-400 rounded-full animate-spin"></div>
            <span class="ml-3 text-slate-500 dark:text-slate-400">
                {label.unwrap_or("Loading...")}
            </span>
        </div>
    }
}
