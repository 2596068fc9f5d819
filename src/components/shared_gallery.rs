use crate::components::{use_toaster, Toaster};
use crate::services::{self, SharedGalleryItem};
use dioxus::prelude::*;
use dioxus_i18n::t;
use photo_store::{DeleteOutcome, Locator, PermissionState};

struct DeleteMessages {
    deleted: String,
    failed: String,
    not_deleted: String,
}

impl DeleteMessages {
    fn lookup() -> Self {
        Self {
            deleted: t!("toast-photo-deleted"),
            failed: t!("toast-photo-delete-failed"),
            not_deleted: t!("toast-photo-not-deleted"),
        }
    }
}

/// Runs a shared delete to completion, including the user confirmation
async fn delete_shared(locator: Locator, toaster: Toaster, messages: DeleteMessages) {
    let gallery = match services::init_gallery_services() {
        Ok(gallery) => gallery,
        Err(e) => {
            log::error!("{}", e);
            toaster.failure(messages.failed);
            return;
        }
    };

    match gallery.delete_shared_photo(locator).await {
        DeleteOutcome::Deleted => toaster.success(messages.deleted),
        DeleteOutcome::NeedsConfirmation(request) => {
            log::info!("Asking the user to confirm {:?}", request.kind);
            match gallery.confirm_shared_delete(request).await {
                DeleteOutcome::Deleted => toaster.success(messages.deleted),
                _ => toaster.failure(messages.not_deleted),
            }
        }
        DeleteOutcome::Failed => toaster.failure(messages.failed),
    }
}

#[component]
pub fn SharedGalleryScreen() -> Element {
    let permissions = use_context::<Signal<PermissionState>>();
    let toaster = use_toaster();
    let mut photos = use_signal(Vec::<SharedGalleryItem>::new);
    let mut loading = use_signal(|| true);
    let mut error = use_signal(|| None::<String>);

    let mut refresh = move || {
        loading.set(true);
        spawn(async move {
            let result = match services::init_gallery_services() {
                Ok(gallery) => gallery.load_shared_photos().await,
                Err(e) => Err(e),
            };
            match result {
                Ok(items) => {
                    photos.set(items);
                    error.set(None);
                }
                Err(e) => {
                    log::error!("Loading shared photos failed: {}", e);
                    error.set(Some(e.user_message()));
                }
            }
            loading.set(false);
        });
    };

    use_hook(move || refresh());

    let delete_photo = move |locator: Locator| {
        let messages = DeleteMessages::lookup();
        spawn(async move {
            delete_shared(locator, toaster, messages).await;
            // only after the delete, confirmation included, has finished
            refresh();
        });
    };

    rsx! {
        div { style: "padding: 16px; max-width: 900px; margin: 0 auto;",
            h1 { style: "color: #0066cc; font-size: 24px; margin: 24px 0 16px 0;",
                "🖼️ "
                { t!("shared-gallery-title") }
            }

            if !permissions().read_granted {
                p { style: "font-size: 13px; color: #a66;",
                    { t!("permission-shared-disabled") }
                }
            }

            if let Some(err) = error() {
                div { style: "padding: 12px; margin-bottom: 16px; background: #ffe5e5; color: #a00; border-radius: 8px;",
                    { t!("gallery-load-failed", error: err) }
                }
            }

            if loading() && photos().is_empty() {
                p { style: "color: #666;", { t!("gallery-loading") } }
            } else if photos().is_empty() {
                p { style: "color: #666; text-align: center; margin-top: 48px;", { t!("gallery-empty") } }
            } else {
                div { class: "photo-grid",
                    for item in photos() {
                        div { key: "{item.photo.locator}", class: "photo-tile",
                            if let Some(url) = item.data_url.clone() {
                                img { src: url, alt: item.photo.display_name.clone() }
                            } else {
                                div { style: "aspect-ratio: 1; display: flex; align-items: center; justify-content: center; font-size: 48px; color: #999;",
                                    "🖼️"
                                }
                            }
                            div { style: "padding: 8px; font-size: 12px; color: #555;",
                                div { style: "overflow: hidden; text-overflow: ellipsis; white-space: nowrap;",
                                    "{item.photo.display_name}"
                                }
                                { t!("photo-size", width: item.photo.width, height: item.photo.height) }
                            }
                            button {
                                class: "btn-danger",
                                style: "margin: 0 8px 8px 8px; padding: 8px;",
                                onclick: {
                                    let locator = item.photo.locator.clone();
                                    move |_| delete_photo(locator.clone())
                                },
                                { t!("photo-delete") }
                            }
                        }
                    }
                }
            }
        }
    }
}
