pub mod home;
pub mod navigation;
pub mod private_gallery;
pub mod shared_gallery;
pub mod toast;

pub use home::HomeScreen;
pub use navigation::NavigationBar;
pub use private_gallery::PrivateGalleryScreen;
pub use shared_gallery::SharedGalleryScreen;
pub use toast::{use_toaster, use_toaster_provider, ToastHost, Toaster};
