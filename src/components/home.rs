use crate::components::use_toaster;
use crate::services::{self, request_missing};
use crate::Screen;
use dioxus::prelude::*;
use dioxus_i18n::t;
use photo_store::{CaptureTarget, PermissionState};

#[component]
pub fn HomeScreen(on_navigate: EventHandler<Screen>) -> Element {
    let mut permissions = use_context::<Signal<PermissionState>>();
    let toaster = use_toaster();
    let mut is_private = use_signal(|| CaptureTarget::default().is_private());
    let mut capturing = use_signal(|| false);
    let mut error = use_signal(|| None::<String>);

    let take_photo = move |_: MouseEvent| {
        capturing.set(true);
        error.set(None);
        let saved_message = t!("toast-photo-saved");
        let failed_message = t!("toast-photo-save-failed");
        spawn(async move {
            let gallery = match services::init_gallery_services() {
                Ok(gallery) => gallery,
                Err(e) => {
                    error.set(Some(e.user_message()));
                    capturing.set(false);
                    return;
                }
            };

            match crate::camera::capture_image(gallery.config.capture_fallback.clone()).await {
                Ok(Some(image)) => {
                    // permissions as they stood when the capture started
                    let saved = gallery
                        .save_capture(is_private(), *permissions.peek(), image)
                        .await;
                    toaster.outcome(saved, saved_message, failed_message);
                }
                Ok(None) => log::debug!("Capture cancelled"),
                Err(e) => {
                    log::error!("Capture failed: {}", e);
                    error.set(Some(e.user_message()));
                }
            }
            capturing.set(false);
        });
    };

    let request_access = move |_: MouseEvent| {
        let state = *permissions.peek();
        spawn(async move {
            match tokio::task::spawn_blocking(move || request_missing(state)).await {
                Ok(Ok(updated)) => permissions.set(updated),
                Ok(Err(e)) => error.set(Some(e.user_message())),
                Err(e) => log::error!("Permission task failed: {}", e),
            }
        });
    };

    let state = permissions();
    let read_label = if state.read_granted { "✅" } else { "❌" };
    let write_label = if state.write_granted { "✅" } else { "❌" };

    rsx! {
        div { style: "padding: 16px; max-width: 600px; margin: 0 auto; min-height: 100vh; background: #f5f5f5;",
            h1 { style: "color: #0066cc; text-align: center; margin-bottom: 24px; margin-top: 48px; font-size: 28px; font-weight: 700;",
                "📷 "
                { t!("app-title") }
            }

            if let Some(err) = error() {
                div { style: "padding: 12px; margin-bottom: 16px; background: #ffe5e5; color: #a00; border-radius: 8px;",
                    "{err}"
                }
            }

            // Capture
            div { class: "card", style: "margin-bottom: 16px;",
                label { style: "display: flex; align-items: center; gap: 8px; margin-bottom: 16px; font-size: 16px;",
                    input {
                        r#type: "checkbox",
                        checked: is_private(),
                        onchange: move |e| is_private.set(e.checked()),
                    }
                    { t!("capture-private-toggle") }
                }
                if !is_private() && !state.write_granted {
                    p { style: "font-size: 13px; color: #a66; margin: 0 0 12px 0;",
                        { t!("permission-shared-disabled") }
                    }
                }
                button {
                    class: "btn-primary",
                    style: "width: 100%; padding: 16px; font-size: 16px;",
                    disabled: capturing(),
                    onclick: take_photo,
                    if capturing() {
                        { t!("capture-in-progress") }
                    } else {
                        { t!("capture-button") }
                    }
                }
            }

            // Galleries
            div { class: "card", style: "margin-bottom: 16px; display: flex; flex-direction: column; gap: 12px;",
                button {
                    class: "btn-primary",
                    style: "padding: 16px; font-size: 16px;",
                    onclick: move |_| on_navigate.call(Screen::PrivateGallery),
                    "🔒 "
                    { t!("gallery-open-private") }
                }
                button {
                    class: "btn-primary",
                    style: "padding: 16px; font-size: 16px;",
                    onclick: move |_| on_navigate.call(Screen::SharedGallery),
                    "🖼️ "
                    { t!("gallery-open-shared") }
                }
            }

            // Permission status
            div { style: "background: #f8f9fa; padding: 16px; margin: 16px 0 128px 0; border-radius: 8px; border: 1px solid #e0e0e0;",
                h3 { style: "margin: 0 0 12px 0; font-size: 14px; color: #666; font-weight: 600;",
                    { t!("permission-status") }
                }
                p { style: "font-size: 12px; color: #666; margin: 4px 0;",
                    { t!("permission-read", granted: read_label) }
                }
                p { style: "font-size: 12px; color: #666; margin: 4px 0;",
                    { t!("permission-write", granted: write_label) }
                }
                if !state.missing().is_empty() {
                    button {
                        class: "btn-primary",
                        style: "margin-top: 8px; padding: 8px 12px; font-size: 13px;",
                        onclick: request_access,
                        { t!("permission-request") }
                    }
                }
                p { style: "font-size: 12px; color: #666; margin: 4px 0;",
                    "OS: {std::env::consts::OS}"
                }
            }
        }
    }
}
