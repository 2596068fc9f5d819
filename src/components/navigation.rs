use crate::Screen;
use dioxus::prelude::*;
use dioxus_i18n::t;

const ACTIVE_STYLE: &str = "flex: 1; padding: 12px; margin: 0 5px; border: none; border-radius: 8px; cursor: pointer; font-size: 14px; text-align: center; background: #0066cc; color: #ffffff;";
const INACTIVE_STYLE: &str = "flex: 1; padding: 12px; margin: 0 5px; border: none; border-radius: 8px; cursor: pointer; font-size: 14px; text-align: center; background: #ffffff; color: #333;";

#[component]
pub fn NavigationBar(current_screen: Screen, on_navigate: EventHandler<Screen>) -> Element {
    let nav_style = "display: flex; justify-content: space-around; padding: 10px; background: #f0f0f0; border-top: 1px solid #ddd;";
    let style_for = |screen: Screen| {
        if current_screen == screen {
            ACTIVE_STYLE
        } else {
            INACTIVE_STYLE
        }
    };

    rsx! {
        div {
            style: "{nav_style}",

            button {
                style: style_for(Screen::Home),
                onclick: move |_| on_navigate.call(Screen::Home),
                "📷 "
                { t!("nav-home") }
            }

            button {
                style: style_for(Screen::PrivateGallery),
                onclick: move |_| on_navigate.call(Screen::PrivateGallery),
                "🔒 "
                { t!("nav-private") }
            }

            button {
                style: style_for(Screen::SharedGallery),
                onclick: move |_| on_navigate.call(Screen::SharedGallery),
                "🖼️ "
                { t!("nav-shared") }
            }
        }
    }
}
