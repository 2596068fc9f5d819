//! Storage capabilities of the running platform.
//!
//! Every version-dependent decision about the media index (which collection to
//! read and write, whether write permission is implied, how a denied deletion
//! can be confirmed) is taken once here, from the API level detected at startup.

use serde::{Deserialize, Serialize};

/// Android API level of Android 10 (scoped storage, recoverable security exceptions)
pub const API_Q: u32 = 29;
/// Android API level of Android 11 (`MediaStore.createDeleteRequest`)
pub const API_R: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApiLevel(pub u32);

impl ApiLevel {
    /// Reads `Build.VERSION.SDK_INT` over JNI, falling back to `fallback` when
    /// the lookup fails.
    #[cfg(target_os = "android")]
    pub fn detect(fallback: u32) -> Self {
        match android_sdk_int() {
            Ok(level) => ApiLevel(level),
            Err(e) => {
                log::warn!("Could not read SDK_INT ({}), assuming {}", e, fallback);
                ApiLevel(fallback)
            }
        }
    }

    /// Off-device there is no platform to ask; the configured level is used.
    #[cfg(not(target_os = "android"))]
    pub fn detect(fallback: u32) -> Self {
        ApiLevel(fallback)
    }

    pub fn at_least(&self, level: u32) -> bool {
        self.0 >= level
    }
}

#[cfg(target_os = "android")]
fn android_sdk_int() -> Result<u32, jni::errors::Error> {
    let vm_ptr = ndk_context::android_context().vm() as *mut jni::sys::JavaVM;
    let vm = unsafe { jni::JavaVM::from_raw(vm_ptr) }?;
    let mut env = vm.attach_current_thread()?;
    let level = env
        .get_static_field("android/os/Build$VERSION", "SDK_INT", "I")?
        .i()?;
    Ok(level.max(0) as u32)
}

/// A media index collection of images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectionUri {
    /// `EXTERNAL_CONTENT_URI`, which spans every external volume
    External,
    /// `getContentUri(VOLUME_EXTERNAL_PRIMARY)`
    ExternalPrimary,
}

impl CollectionUri {
    pub fn as_uri(&self) -> &'static str {
        match self {
            CollectionUri::External => "content://media/external/images/media",
            CollectionUri::ExternalPrimary => "content://media/external_primary/images/media",
        }
    }

    pub fn volume(&self) -> &'static str {
        match self {
            CollectionUri::External => "external",
            CollectionUri::ExternalPrimary => "external_primary",
        }
    }
}

/// How the platform lets the user approve deleting a row the app does not own
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfirmationStrategy {
    /// Legacy storage: a denial is final
    Unavailable,
    /// Use the user action attached to the `RecoverableSecurityException`
    RecoverableAction,
    /// Ask `MediaStore.createDeleteRequest` for a delete dialog
    DeleteRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageCapabilities {
    pub api_level: ApiLevel,
    pub read_collection: CollectionUri,
    pub write_collection: CollectionUri,
    /// Scoped storage lets apps add media without `WRITE_EXTERNAL_STORAGE`
    pub implicit_write_permission: bool,
    /// Rows are owned by the inserting app and foreign rows need approval
    pub scoped_storage: bool,
    pub confirmation: ConfirmationStrategy,
}

impl StorageCapabilities {
    pub fn for_api_level(api_level: ApiLevel) -> Self {
        if api_level.at_least(API_R) {
            Self {
                api_level,
                read_collection: CollectionUri::External,
                write_collection: CollectionUri::ExternalPrimary,
                implicit_write_permission: true,
                scoped_storage: true,
                confirmation: ConfirmationStrategy::DeleteRequest,
            }
        } else if api_level.at_least(API_Q) {
            Self {
                api_level,
                read_collection: CollectionUri::External,
                write_collection: CollectionUri::ExternalPrimary,
                implicit_write_permission: true,
                scoped_storage: true,
                confirmation: ConfirmationStrategy::RecoverableAction,
            }
        } else {
            Self {
                api_level,
                read_collection: CollectionUri::External,
                write_collection: CollectionUri::External,
                implicit_write_permission: false,
                scoped_storage: false,
                confirmation: ConfirmationStrategy::Unavailable,
            }
        }
    }

    /// Detects the API level and selects the matching capabilities
    pub fn detect(fallback_api_level: u32) -> Self {
        let caps = Self::for_api_level(ApiLevel::detect(fallback_api_level));
        log::info!(
            "Storage capabilities for API {}: write={:?}, confirmation={:?}",
            caps.api_level.0,
            caps.write_collection,
            caps.confirmation
        );
        caps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_capabilities() {
        let caps = StorageCapabilities::for_api_level(ApiLevel(28));
        assert_eq!(caps.write_collection, CollectionUri::External);
        assert!(!caps.implicit_write_permission);
        assert!(!caps.scoped_storage);
        assert_eq!(caps.confirmation, ConfirmationStrategy::Unavailable);
    }

    #[test]
    fn test_q_capabilities() {
        let caps = StorageCapabilities::for_api_level(ApiLevel(29));
        assert_eq!(caps.write_collection, CollectionUri::ExternalPrimary);
        assert_eq!(caps.read_collection, CollectionUri::External);
        assert!(caps.implicit_write_permission);
        assert_eq!(caps.confirmation, ConfirmationStrategy::RecoverableAction);
    }

    #[test]
    fn test_r_and_later_capabilities() {
        for level in [30, 33, 35] {
            let caps = StorageCapabilities::for_api_level(ApiLevel(level));
            assert_eq!(caps.confirmation, ConfirmationStrategy::DeleteRequest);
            assert!(caps.scoped_storage);
        }
    }

    #[test]
    fn test_collection_uris() {
        assert_eq!(
            CollectionUri::External.as_uri(),
            crate::models::EXTERNAL_IMAGES_URI
        );
        assert_eq!(CollectionUri::ExternalPrimary.volume(), "external_primary");
    }
}
