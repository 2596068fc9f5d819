//! # Photo Store
//!
//! Persistence and listing for a camera app with two galleries:
//! - a private store: JPEG files in a directory only the app can see
//! - a shared store: the device-wide media index, behind the [`MediaIndex`] trait
//!
//! Platform differences are resolved once into [`StorageCapabilities`].
//! Deleting a shared photo the app does not own yields a
//! [`ConfirmationRequest`] the caller shows to the user before the deletion
//! can complete.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use photo_store::{PrivateStore, SharedStore, SqliteMediaIndex, StorageCapabilities};
//! use std::sync::Arc;
//!
//! let caps = StorageCapabilities::detect(30);
//! let index = SqliteMediaIndex::open("media.db".as_ref(), "media", "com.example.app")?;
//! let shared = SharedStore::new(Arc::new(index), caps);
//! let private = PrivateStore::new("private");
//! ```

pub mod capture;
pub mod config;
pub mod error;
pub mod media_index;
pub mod models;
pub mod permissions;
pub mod picker;
pub mod platform;
pub mod private_store;
pub mod schema;
pub mod shared_store;
pub mod thumbnail;

#[cfg(target_os = "android")]
pub mod android_media;

pub use capture::{run_blocking, CaptureRouter, CaptureTarget};
pub use config::GalleryConfig;
pub use error::StoreError;
pub use media_index::{MediaIndex, SqliteMediaIndex};
pub use models::{
    ConfirmationKind, ConfirmationRequest, ConfirmationResult, DeleteOutcome, Locator,
    PrivatePhoto, SharedPhoto,
};
pub use permissions::{Permission, PermissionState};
pub use picker::{capture_image, has_permission, request_permissions, PickerError};
pub use platform::{ApiLevel, StorageCapabilities};
pub use private_store::PrivateStore;
pub use shared_store::SharedStore;
pub use thumbnail::create_thumbnail;

#[cfg(target_os = "android")]
pub use android_media::AndroidMediaStore;
