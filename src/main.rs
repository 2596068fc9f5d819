use dioxus::prelude::*;
use dioxus_i18n::prelude::use_init_i18n;
use photo_store::PermissionState;

mod camera;
mod components;
mod error;
mod filesystem;
mod i18n;
mod image_processing;
mod services;

use components::{
    use_toaster_provider, HomeScreen, NavigationBar, PrivateGalleryScreen, SharedGalleryScreen,
    ToastHost,
};

const MAIN_CSS: Asset = asset!("/assets/main.css");

fn main() {
    init_logging();
    dioxus::launch(App);
}

fn init_logging() {
    #[cfg(target_os = "android")]
    android_logger::init_once(
        android_logger::Config::default()
            .with_max_level(log::LevelFilter::Debug)
            .with_tag("camera-gallery"),
    );

    #[cfg(not(target_os = "android"))]
    {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .try_init();
    }
}

/// Screen navigation for the app
#[derive(Clone, PartialEq, Debug)]
pub enum Screen {
    Home,
    PrivateGallery,
    SharedGallery,
}

#[component]
fn App() -> Element {
    use_init_i18n(i18n::init_i18n);
    use_toaster_provider();

    let mut current_screen = use_signal(|| Screen::Home);
    let mut permissions = use_signal(PermissionState::default);
    use_context_provider(|| permissions);

    // Derive the grants once per start and ask for what is missing
    use_hook(move || {
        spawn(async move {
            let caps = match services::init_gallery_services() {
                Ok(gallery) => gallery.caps,
                Err(e) => {
                    log::error!("Gallery services unavailable: {}", e);
                    return;
                }
            };
            let state = services::init_permissions(caps).await;
            log::info!(
                "Storage permissions: read={}, write={}",
                state.read_granted,
                state.write_granted
            );
            permissions.set(state);
        });
    });

    rsx! {
        document::Link { rel: "stylesheet", href: MAIN_CSS }

        div { style: "display: flex; flex-direction: column; height: 100vh; font-family: sans-serif;",

            // Main Content
            div { style: "flex: 1; overflow-y: auto;",
                match current_screen() {
                    Screen::Home => rsx! {
                        HomeScreen { on_navigate: move |s| current_screen.set(s) }
                    },
                    Screen::PrivateGallery => rsx! {
                        PrivateGalleryScreen {}
                    },
                    Screen::SharedGallery => rsx! {
                        SharedGalleryScreen {}
                    },
                }
            }

            ToastHost {}

            // Bottom Navigation Bar
            NavigationBar {
                current_screen: current_screen(),
                on_navigate: move |screen| current_screen.set(screen),
            }
        }
    }
}
