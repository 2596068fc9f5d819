use crate::components::use_toaster;
use crate::services::{self, PrivateGalleryItem};
use dioxus::prelude::*;
use dioxus_i18n::t;

#[component]
pub fn PrivateGalleryScreen() -> Element {
    let toaster = use_toaster();
    let mut photos = use_signal(Vec::<PrivateGalleryItem>::new);
    let mut loading = use_signal(|| true);
    let mut error = use_signal(|| None::<String>);

    // Each load is a fresh snapshot of the directory
    let mut refresh = move || {
        loading.set(true);
        spawn(async move {
            let result = match services::init_gallery_services() {
                Ok(gallery) => gallery.load_private_photos().await,
                Err(e) => Err(e),
            };
            match result {
                Ok(items) => {
                    photos.set(items);
                    error.set(None);
                }
                Err(e) => {
                    log::error!("Loading private photos failed: {}", e);
                    error.set(Some(e.user_message()));
                }
            }
            loading.set(false);
        });
    };

    use_hook(move || refresh());

    let delete_photo = move |name: String| {
        let deleted_message = t!("toast-photo-deleted");
        let failed_message = t!("toast-photo-delete-failed");
        spawn(async move {
            let deleted = match services::init_gallery_services() {
                Ok(gallery) => gallery.delete_private_photo(name).await,
                Err(_) => false,
            };
            toaster.outcome(deleted, deleted_message, failed_message);
            refresh();
        });
    };

    rsx! {
        div { style: "padding: 16px; max-width: 900px; margin: 0 auto;",
            h1 { style: "color: #0066cc; font-size: 24px; margin: 24px 0 16px 0;",
                "🔒 "
                { t!("private-gallery-title") }
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
                    for photo in photos() {
                        div { key: "{photo.name}", class: "photo-tile",
                            if let Some(url) = photo.data_url.clone() {
                                img { src: url, alt: photo.name.clone() }
                            } else {
                                div { style: "aspect-ratio: 1; display: flex; align-items: center; justify-content: center; font-size: 48px; color: #999;",
                                    "📷"
                                }
                            }
                            div { style: "padding: 8px; font-size: 12px; color: #555;",
                                { t!("photo-size", width: photo.width, height: photo.height) }
                            }
                            button {
                                class: "btn-danger",
                                style: "margin: 0 8px 8px 8px; padding: 8px;",
                                onclick: {
                                    let name = photo.name.clone();
                                    move |_| delete_photo(name.clone())
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
