use crate::error::StoreError;
use crate::permissions::PermissionState;
use crate::private_store::PrivateStore;
use crate::shared_store::SharedStore;
use image::DynamicImage;
use std::sync::Arc;
use uuid::Uuid;

/// Where a captured photo is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureTarget {
    Private,
    /// Captures go to the shared gallery until the user opts into privacy
    #[default]
    Shared,
}

impl CaptureTarget {
    pub fn from_private_toggle(is_private: bool) -> Self {
        if is_private {
            CaptureTarget::Private
        } else {
            CaptureTarget::Shared
        }
    }

    pub fn is_private(&self) -> bool {
        *self == CaptureTarget::Private
    }
}

/// Routes captured images to the private or the shared store
#[derive(Clone)]
pub struct CaptureRouter {
    private: Arc<PrivateStore>,
    shared: Arc<SharedStore>,
}

impl CaptureRouter {
    pub fn new(private: Arc<PrivateStore>, shared: Arc<SharedStore>) -> Self {
        Self { private, shared }
    }

    /// Persists `image` under a fresh random name. Returns whether it was saved;
    /// the shared store is only written with write permission.
    pub async fn save(
        &self,
        target: CaptureTarget,
        permissions: PermissionState,
        image: DynamicImage,
    ) -> bool {
        let name = format!("{}.jpg", Uuid::new_v4());

        let result = match target {
            CaptureTarget::Private => {
                let store = Arc::clone(&self.private);
                let name = name.clone();
                run_blocking(move || store.save(&name, &image)).await
            }
            CaptureTarget::Shared if permissions.write_granted => {
                let store = Arc::clone(&self.shared);
                let name = name.clone();
                run_blocking(move || store.save(&name, &image).map(|_| ())).await
            }
            CaptureTarget::Shared => {
                log::warn!("Not saving {} to shared storage: write permission missing", name);
                return false;
            }
        };

        match result {
            Ok(()) => {
                log::info!("Saved captured photo {} ({:?})", name, target);
                true
            }
            Err(e) => {
                log::error!("Failed to save captured photo {}: {}", name, e);
                false
            }
        }
    }
}

/// Runs blocking storage work off the async executor
pub async fn run_blocking<T, F>(f: F) -> Result<T, StoreError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media_index::SqliteMediaIndex;
    use crate::platform::{ApiLevel, StorageCapabilities};
    use image::RgbImage;
    use std::path::Path;

    #[test]
    fn test_default_target_is_shared() {
        assert_eq!(CaptureTarget::default(), CaptureTarget::Shared);
        assert!(!CaptureTarget::default().is_private());
        assert!(CaptureTarget::from_private_toggle(true).is_private());
    }

    fn router(dir: &Path) -> (CaptureRouter, Arc<PrivateStore>, Arc<SharedStore>) {
        let caps = StorageCapabilities::for_api_level(ApiLevel(33));
        let index = SqliteMediaIndex::open(
            &dir.join("media.db"),
            dir.join("content"),
            "app.gallery",
        )
        .unwrap();
        let private = Arc::new(PrivateStore::new(dir.join("private")));
        let shared = Arc::new(SharedStore::new(Arc::new(index), caps));
        (
            CaptureRouter::new(Arc::clone(&private), Arc::clone(&shared)),
            private,
            shared,
        )
    }

    fn photo() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::new(12, 9))
    }

    #[test]
    fn test_toggle_selects_target() {
        assert_eq!(CaptureTarget::from_private_toggle(true), CaptureTarget::Private);
        assert_eq!(CaptureTarget::from_private_toggle(false), CaptureTarget::Shared);
    }

    #[tokio::test]
    async fn test_private_capture_ignores_permissions() {
        let temp_dir = tempfile::tempdir().unwrap();
        let (router, private, shared) = router(temp_dir.path());

        let saved = router
            .save(CaptureTarget::Private, PermissionState::default(), photo())
            .await;
        assert!(saved);

        let photos = private.list().unwrap();
        assert_eq!(photos.len(), 1);
        assert!(photos[0].name.ends_with(".jpg"));
        assert_eq!((photos[0].width(), photos[0].height()), (12, 9));
        assert!(shared.list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_shared_capture_with_write_permission() {
        let temp_dir = tempfile::tempdir().unwrap();
        let (router, private, shared) = router(temp_dir.path());
        let permissions = PermissionState {
            read_granted: true,
            write_granted: true,
        };

        assert!(router.save(CaptureTarget::Shared, permissions, photo()).await);
        assert_eq!(shared.list().unwrap().len(), 1);
        assert!(private.list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_shared_capture_without_write_permission() {
        let temp_dir = tempfile::tempdir().unwrap();
        let (router, _private, shared) = router(temp_dir.path());
        let permissions = PermissionState {
            read_granted: true,
            write_granted: false,
        };

        assert!(!router.save(CaptureTarget::Shared, permissions, photo()).await);
        assert!(shared.list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_blocking_propagates_errors() {
        let result: Result<(), StoreError> =
            run_blocking(|| Err(StoreError::Other("boom".to_string()))).await;
        assert!(matches!(result, Err(StoreError::Other(msg)) if msg == "boom"));
    }
}
