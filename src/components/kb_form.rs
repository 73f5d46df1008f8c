use leptos::prelude::*;

use crate::api::intercept_error;
use crate::auth::expiry::SessionExpiry;
use crate::components::image_uploader::ImageUploader;
use crate::models::knowledgebase::{
    Knowledgebase, KnowledgebaseDraft, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE,
};
use crate::pages::knowledgebases::{create_knowledgebase, update_knowledgebase};

/// Create/edit form for a knowledge base. Chunking parameters are fixed once
/// documents have been ingested, so they are locked in edit mode.
#[component]
pub fn KnowledgebaseFormModal(
    #[prop(optional_no_strip)] existing: Option<Knowledgebase>,
    set_show: WriteSignal<bool>,
    #[prop(into)] on_saved: Callback<()>,
) -> impl IntoView {
    let expiry = expect_context::<SessionExpiry>();

    let editing = existing.clone();
    let is_edit = editing.is_some();

    let (name, set_name) = signal(
        editing.as_ref().map(|kb| kb.name.clone()).unwrap_or_default(),
    );
    let (description, set_description) = signal(
        editing
            .as_ref()
            .and_then(|kb| kb.description.clone())
            .unwrap_or_default(),
    );
    let (chunk_size, set_chunk_size) = signal(
        editing
            .as_ref()
            .and_then(|kb| kb.chunk_size)
            .unwrap_or(DEFAULT_CHUNK_SIZE)
            .to_string(),
    );
    let (chunk_overlap, set_chunk_overlap) = signal(
        editing
            .as_ref()
            .and_then(|kb| kb.chunk_overlap)
            .unwrap_or(DEFAULT_CHUNK_OVERLAP)
            .to_string(),
    );
    let (cover_key, set_cover_key) = signal(None::<String>);
    let (error, set_error) = signal(None::<String>);

    let kb_id = editing.as_ref().map(|kb| kb.id.clone());
    let initial_cover = editing.as_ref().and_then(|kb| kb.cover_url.clone());

    let save_action = Action::new(move |draft: &KnowledgebaseDraft| {
        let draft = draft.clone();
        let kb_id = kb_id.clone();
        let expiry = expiry.clone();
        async move {
            let result = match kb_id {
                Some(id) => update_knowledgebase(id, draft).await.map(|_| ()),
                None => create_knowledgebase(draft).await.map(|_| ()),
            };
            result.map_err(|e| intercept_error(&expiry, &e, None))
        }
    });

    Effect::new(move |_| {
        if let Some(result) = save_action.value().get() {
            match result {
                Ok(()) => {
                    set_show.set(false);
                    on_saved.run(());
                }
                Err(message) => set_error.set(Some(message)),
            }
        }
    });

    let submit = move |_| {
        let name_value = name.get().trim().to_string();
        if name_value.is_empty() {
            set_error.set(Some("name is required".to_string()));
            return;
        }
        let description_value = description.get().trim().to_string();
        let draft = KnowledgebaseDraft {
            name: name_value,
            description: (!description_value.is_empty()).then_some(description_value),
            chunk_size: chunk_size.get().parse().unwrap_or(DEFAULT_CHUNK_SIZE),
            chunk_overlap: chunk_overlap.get().parse().unwrap_or(DEFAULT_CHUNK_OVERLAP),
            cover_key: cover_key.get(),
        };
        save_action.dispatch(draft);
    };

    view! {
        <div class="fixed inset-0 bg-black/50 flex items-center justify-center z-50">
            <div class="bg-white dark:bg-slate-800 rounded-lg shadow-xl p-6 w-full max-w-md">
                <div class="flex justify-between items-center mb-4">
                    <h3 class="text-lg font-semibold text-slate-800 dark:text-slate-100">
                        {if is_edit { "Edit Knowledge Base" } else { "New Knowledge Base" }}
                    </h3>
                    <button
                        class="text-slate-400 hover:text-slate-600 dark:hover:text-slate-200"
                        on:click=move |_| set_show.set(false)
                    >
                        "✕"
                    </button>
                </div>

                <div class="space-y-4">
                    <div>
                        <label class="block text-sm font-medium text-slate-700 dark:text-slate-300 mb-1">
                            "Name"
                        </label>
                        <input
                            type="text"
                            class="w-full px-3 py-2 rounded-md border border-slate-300 dark:border-slate-600 bg-white dark:bg-slate-700 text-slate-800 dark:text-slate-100 focus:outline-none focus:border-indigo-500"
                            placeholder="e.g. Product Manuals"
                            prop:value=name
                            on:input=move |ev| set_name.set(event_target_value(&ev))
                        />
                    </div>

                    <div>
                        <label class="block text-sm font-medium text-slate-700 dark:text-slate-300 mb-1">
                            "Description"
                        </label>
                        <textarea
                            class="w-full px-3 py-2 rounded-md border border-slate-300 dark:border-slate-600 bg-white dark:bg-slate-700 text-slate-800 dark:text-slate-100 focus:outline-none focus:border-indigo-500 resize-none"
                            rows="3"
                            placeholder="What lives in this knowledge base?"
                            prop:value=description
                            on:input=move |ev| set_description.set(event_target_value(&ev))
                        ></textarea>
                    </div>

                    <div class="grid grid-cols-2 gap-4">
                        <div>
                            <label class="block text-sm font-medium text-slate-700 dark:text-slate-300 mb-1">
                                "Chunk Size"
                            </label>
                            <input
                                type="number"
                                class="w-full px-3 py-2 rounded-md border border-slate-300 dark:border-slate-600 bg-white dark:bg-slate-700 text-slate-800 dark:text-slate-100 focus:outline-none focus:border-indigo-500 disabled:opacity-50"
                                prop:value=chunk_size
                                disabled=is_edit
                                on:input=move |ev| set_chunk_size.set(event_target_value(&ev))
                            />
                        </div>
                        <div>
                            <label class="block text-sm font-medium text-slate-700 dark:text-slate-300 mb-1">
                                "Chunk Overlap"
                            </label>
                            <input
                                type="number"
                                class="w-full px-3 py-2 rounded-md border border-slate-300 dark:border-slate-600 bg-white dark:bg-slate-700 text-slate-800 dark:text-slate-100 focus:outline-none focus:border-indigo-500 disabled:opacity-50"
                                prop:value=chunk_overlap
                                disabled=is_edit
                                on:input=move |ev| set_chunk_overlap.set(event_target_value(&ev))
                            />
                        </div>
                    </div>

                    <div>
                        <label class="block text-sm font-medium text-slate-700 dark:text-slate-300 mb-1">
                            "Cover Image"
                        </label>
                        <ImageUploader
                            initial_url=initial_cover
                            on_uploaded=Callback::new(move |image: crate::models::upload::UploadedImage| {
                                set_cover_key.set(Some(image.object_key));
                            })
                        />
                    </div>

                    {move || {
                        error
                            .get()
                            .map(|message| {
                                view! {
                                    <p class="text-sm text-rose-600 dark:text-rose-400">{message}</p>
                                }
                            })
                    }}

                    <div class="flex justify-end space-x-2">
                        <button
                            class="px-4 py-2 text-sm rounded-md text-slate-600 dark:text-slate-300 hover:bg-slate-100 dark:hover:bg-slate-700"
                            on:click=move |_| set_show.set(false)
                        >
                            "Cancel"
                        </button>
                        <button
                            class="px-4 py-2 text-sm rounded-md bg-indigo-600 hover:bg-indigo-700 text-white disabled:opacity-50"
                            disabled=move || save_action.pending().get()
                            on:click=submit
                        >
                            {move || {
                                if save_action.pending().get() {
                                    "Saving..."
                                } else if is_edit {
                                    "Save Changes"
                                } else {
                                    "Create"
                                }
                            }}
                        </button>
                    </div>
                </div>
            </div>
        </div>
    }
}
