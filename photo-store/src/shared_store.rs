use crate::error::StoreError;
use crate::media_index::MediaIndex;
use crate::models::{
    ConfirmationKind, ConfirmationRequest, ConfirmationResult, DeleteOutcome, Locator,
    NewMediaEntry, SharedPhoto,
};
use crate::platform::{ConfirmationStrategy, StorageCapabilities};
use crate::thumbnail::{encode_jpeg_bytes, DEFAULT_JPEG_QUALITY};
use image::DynamicImage;
use std::sync::Arc;

/// Photos in the device-wide media index
#[derive(Clone)]
pub struct SharedStore {
    index: Arc<dyn MediaIndex>,
    caps: StorageCapabilities,
    quality: u8,
}

impl SharedStore {
    pub fn new(index: Arc<dyn MediaIndex>, caps: StorageCapabilities) -> Self {
        Self {
            index,
            caps,
            quality: DEFAULT_JPEG_QUALITY,
        }
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    pub fn capabilities(&self) -> &StorageCapabilities {
        &self.caps
    }

    /// Inserts a media row for `image` and streams the JPEG into it
    pub fn save(&self, display_name: &str, image: &DynamicImage) -> Result<Locator, StoreError> {
        let entry = NewMediaEntry::jpeg(display_name, image.width(), image.height());
        let locator = self
            .index
            .insert(self.caps.write_collection, &entry)?
            .ok_or_else(|| StoreError::Other("Couldn't create media entry".to_string()))?;

        let bytes = encode_jpeg_bytes(image, self.quality)?;
        self.index.write_content(&locator, &bytes)?;

        log::debug!("Saved shared photo {} as {}", display_name, locator);
        Ok(locator)
    }

    /// Fresh snapshot of every image in the index, newest first
    pub fn list(&self) -> Result<Vec<SharedPhoto>, StoreError> {
        let rows = self.index.query_images(self.caps.read_collection)?;
        Ok(rows
            .into_iter()
            .map(|row| SharedPhoto {
                locator: Locator::for_image_id(row.id),
                id: row.id,
                display_name: row.display_name,
                width: row.width,
                height: row.height,
            })
            .collect())
    }

    /// Decodes the image behind `locator`
    pub fn load_image(&self, locator: &Locator) -> Result<DynamicImage, StoreError> {
        let bytes = self.index.read_content(locator)?;
        Ok(image::load_from_memory(&bytes)?)
    }

    /// Deletes the row directly, or turns an ownership denial into a request
    /// for the user to confirm.
    pub fn delete(&self, locator: &Locator) -> DeleteOutcome {
        match self.index.delete(locator) {
            Ok(rows) => {
                log::debug!("Deleted {} media row(s) for {}", rows, locator);
                DeleteOutcome::Deleted
            }
            Err(StoreError::SecurityDenied(denial)) => {
                log::info!("Deletion of {} needs confirmation: {}", locator, denial.message);
                if self.caps.confirmation != ConfirmationStrategy::RecoverableAction {
                    if let Some(token) = denial.recovery_token {
                        // only the recoverable action flow presents this one
                        if let Err(e) = self.index.discard_confirmation(token) {
                            log::warn!("Could not discard confirmation {}: {}", token, e);
                        }
                    }
                }
                let request = match self.caps.confirmation {
                    ConfirmationStrategy::DeleteRequest => {
                        match self.index.create_delete_request(std::slice::from_ref(locator)) {
                            Ok(request) => Some(request),
                            Err(e) => {
                                log::error!("Could not create delete request: {}", e);
                                None
                            }
                        }
                    }
                    ConfirmationStrategy::RecoverableAction => {
                        denial.recovery_token.map(|token| ConfirmationRequest {
                            locators: vec![denial.locator.clone()],
                            kind: ConfirmationKind::RecoverableAction,
                            token,
                        })
                    }
                    ConfirmationStrategy::Unavailable => None,
                };

                match request {
                    Some(request) => DeleteOutcome::NeedsConfirmation(request),
                    None => DeleteOutcome::Failed,
                }
            }
            Err(e) => {
                log::error!("Failed to delete {}: {}", locator, e);
                DeleteOutcome::Failed
            }
        }
    }

    /// Shows `request` to the user through the index's platform dialog
    pub fn present_confirmation(&self, request: &ConfirmationRequest) -> ConfirmationResult {
        match self.index.present_confirmation(request) {
            Ok(result) => result,
            Err(e) => {
                log::error!("Could not present confirmation {}: {}", request.token, e);
                ConfirmationResult::Denied
            }
        }
    }

    /// Completes a deletion after the user answered its confirmation request
    pub fn resolve_confirmation(
        &self,
        request: &ConfirmationRequest,
        result: ConfirmationResult,
    ) -> DeleteOutcome {
        if result == ConfirmationResult::Denied {
            return DeleteOutcome::Failed;
        }

        let completed = self.index.apply_confirmation(request).and_then(|()| {
            if request.kind == ConfirmationKind::RecoverableAction {
                // Access was granted; the deletion itself still has to happen
                for locator in &request.locators {
                    self.index.delete(locator)?;
                }
            }
            Ok(())
        });

        match completed {
            Ok(()) => DeleteOutcome::Deleted,
            Err(e) => {
                log::error!("Confirmed deletion {} failed: {}", request.token, e);
                DeleteOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media_index::SqliteMediaIndex;
    use crate::platform::ApiLevel;
    use image::{Rgb, RgbImage};
    use std::path::Path;

    fn test_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([1, 2, 3])))
    }

    fn store_as(dir: &Path, owner: &str, api_level: u32) -> SharedStore {
        let caps = StorageCapabilities::for_api_level(ApiLevel(api_level));
        let index = SqliteMediaIndex::open(&dir.join("media.db"), dir.join("content"), owner)
            .unwrap()
            .with_ownership(caps.scoped_storage);
        SharedStore::new(Arc::new(index), caps)
    }

    /// Index that records which confirmations were discarded
    struct DiscardTracking {
        inner: SqliteMediaIndex,
        discarded: std::sync::Mutex<Vec<u64>>,
    }

    impl MediaIndex for DiscardTracking {
        fn insert(
            &self,
            collection: crate::platform::CollectionUri,
            entry: &NewMediaEntry,
        ) -> Result<Option<Locator>, StoreError> {
            self.inner.insert(collection, entry)
        }
        fn write_content(&self, locator: &Locator, bytes: &[u8]) -> Result<(), StoreError> {
            self.inner.write_content(locator, bytes)
        }
        fn read_content(&self, locator: &Locator) -> Result<Vec<u8>, StoreError> {
            self.inner.read_content(locator)
        }
        fn query_images(
            &self,
            collection: crate::platform::CollectionUri,
        ) -> Result<Vec<crate::models::MediaRow>, StoreError> {
            self.inner.query_images(collection)
        }
        fn delete(&self, locator: &Locator) -> Result<usize, StoreError> {
            self.inner.delete(locator)
        }
        fn create_delete_request(
            &self,
            locators: &[Locator],
        ) -> Result<ConfirmationRequest, StoreError> {
            self.inner.create_delete_request(locators)
        }
        fn present_confirmation(
            &self,
            request: &ConfirmationRequest,
        ) -> Result<ConfirmationResult, StoreError> {
            self.inner.present_confirmation(request)
        }
        fn apply_confirmation(&self, request: &ConfirmationRequest) -> Result<(), StoreError> {
            self.inner.apply_confirmation(request)
        }
        fn discard_confirmation(&self, token: u64) -> Result<(), StoreError> {
            self.discarded.lock().unwrap().push(token);
            Ok(())
        }
    }

    fn tracking_store(dir: &Path, api_level: u32) -> (SharedStore, Arc<DiscardTracking>) {
        let caps = StorageCapabilities::for_api_level(ApiLevel(api_level));
        let inner = SqliteMediaIndex::open(&dir.join("media.db"), dir.join("content"), "app.gallery")
            .unwrap()
            .with_ownership(caps.scoped_storage);
        let index = Arc::new(DiscardTracking {
            inner,
            discarded: std::sync::Mutex::new(Vec::new()),
        });
        (SharedStore::new(index.clone(), caps), index)
    }

    #[test]
    fn test_delete_request_discards_recovery_token() {
        let temp_dir = tempfile::tempdir().unwrap();
        let camera = store_as(temp_dir.path(), "other.camera", 33);
        let locator = camera.save("foreign.jpg", &test_image(2, 2)).unwrap();
        let (gallery, index) = tracking_store(temp_dir.path(), 33);

        let DeleteOutcome::NeedsConfirmation(request) = gallery.delete(&locator) else {
            panic!("expected a confirmation request");
        };
        let discarded = index.discarded.lock().unwrap().clone();
        assert_eq!(discarded.len(), 1);
        assert_ne!(discarded[0], request.token);
    }

    #[test]
    fn test_recoverable_action_keeps_recovery_token() {
        let temp_dir = tempfile::tempdir().unwrap();
        let camera = store_as(temp_dir.path(), "other.camera", 29);
        let locator = camera.save("foreign.jpg", &test_image(2, 2)).unwrap();
        let (gallery, index) = tracking_store(temp_dir.path(), 29);

        assert!(matches!(
            gallery.delete(&locator),
            DeleteOutcome::NeedsConfirmation(_)
        ));
        assert!(index.discarded.lock().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_list() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = store_as(temp_dir.path(), "app.gallery", 33);

        let locator = store.save("photo.jpg", &test_image(20, 10)).unwrap();

        let photos = store.list().unwrap();
        assert_eq!(photos.len(), 1);
        assert_eq!(photos[0].locator, locator);
        assert_eq!(photos[0].display_name, "photo.jpg");
        assert_eq!((photos[0].width, photos[0].height), (20, 10));

        let decoded = store.load_image(&locator).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (20, 10));
    }

    #[test]
    fn test_list_is_newest_first() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = store_as(temp_dir.path(), "app.gallery", 33);

        store.save("first.jpg", &test_image(2, 2)).unwrap();
        store.save("second.jpg", &test_image(2, 2)).unwrap();
        store.save("third.jpg", &test_image(2, 2)).unwrap();

        let names: Vec<_> = store
            .list()
            .unwrap()
            .into_iter()
            .map(|p| p.display_name)
            .collect();
        assert_eq!(names, vec!["third.jpg", "second.jpg", "first.jpg"]);
    }

    #[test]
    fn test_delete_owned_photo() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = store_as(temp_dir.path(), "app.gallery", 33);
        let keep = store.save("keep.jpg", &test_image(2, 2)).unwrap();
        let gone = store.save("gone.jpg", &test_image(2, 2)).unwrap();

        assert_eq!(store.delete(&gone), DeleteOutcome::Deleted);

        let locators: Vec<_> = store.list().unwrap().into_iter().map(|p| p.locator).collect();
        assert_eq!(locators, vec![keep]);
    }

    #[test]
    fn test_foreign_photo_needs_delete_request() {
        let temp_dir = tempfile::tempdir().unwrap();
        let camera = store_as(temp_dir.path(), "other.camera", 33);
        let gallery = store_as(temp_dir.path(), "app.gallery", 33);
        let locator = camera.save("foreign.jpg", &test_image(2, 2)).unwrap();

        match gallery.delete(&locator) {
            DeleteOutcome::NeedsConfirmation(request) => {
                assert_eq!(request.kind, ConfirmationKind::DeleteRequest);
                assert_eq!(request.locators, vec![locator.clone()]);

                assert_eq!(
                    gallery.resolve_confirmation(&request, ConfirmationResult::Confirmed),
                    DeleteOutcome::Deleted
                );
            }
            other => panic!("expected a confirmation request, got {:?}", other),
        }
        assert!(gallery.list().unwrap().is_empty());
    }

    #[test]
    fn test_foreign_photo_recoverable_action_on_q() {
        let temp_dir = tempfile::tempdir().unwrap();
        let camera = store_as(temp_dir.path(), "other.camera", 29);
        let gallery = store_as(temp_dir.path(), "app.gallery", 29);
        let locator = camera.save("foreign.jpg", &test_image(2, 2)).unwrap();

        let DeleteOutcome::NeedsConfirmation(request) = gallery.delete(&locator) else {
            panic!("expected a confirmation request");
        };
        assert_eq!(request.kind, ConfirmationKind::RecoverableAction);

        assert_eq!(
            gallery.resolve_confirmation(&request, ConfirmationResult::Confirmed),
            DeleteOutcome::Deleted
        );
        assert!(gallery.list().unwrap().is_empty());
    }

    #[test]
    fn test_denied_confirmation_keeps_photo() {
        let temp_dir = tempfile::tempdir().unwrap();
        let camera = store_as(temp_dir.path(), "other.camera", 33);
        let gallery = store_as(temp_dir.path(), "app.gallery", 33);
        let locator = camera.save("foreign.jpg", &test_image(2, 2)).unwrap();

        let DeleteOutcome::NeedsConfirmation(request) = gallery.delete(&locator) else {
            panic!("expected a confirmation request");
        };
        let answer = gallery.present_confirmation(&request);
        assert_eq!(answer, ConfirmationResult::Denied);
        assert_eq!(
            gallery.resolve_confirmation(&request, answer),
            DeleteOutcome::Failed
        );
        assert_eq!(gallery.list().unwrap().len(), 1);
    }

    #[test]
    fn test_legacy_platform_deletes_foreign_photo() {
        let temp_dir = tempfile::tempdir().unwrap();
        let camera = store_as(temp_dir.path(), "other.camera", 28);
        let gallery = store_as(temp_dir.path(), "app.gallery", 28);
        let locator = camera.save("foreign.jpg", &test_image(2, 2)).unwrap();

        assert_eq!(gallery.delete(&locator), DeleteOutcome::Deleted);
    }

    #[test]
    fn test_denial_without_confirmation_strategy_fails() {
        let temp_dir = tempfile::tempdir().unwrap();
        let camera = store_as(temp_dir.path(), "other.camera", 33);
        let caps = StorageCapabilities::for_api_level(ApiLevel(28));
        // ownership still enforced but no way to ask the user
        let index = SqliteMediaIndex::open(
            &temp_dir.path().join("media.db"),
            temp_dir.path().join("content"),
            "app.gallery",
        )
        .unwrap();
        let gallery = SharedStore::new(Arc::new(index), caps);
        let locator = camera.save("foreign.jpg", &test_image(2, 2)).unwrap();

        assert_eq!(gallery.delete(&locator), DeleteOutcome::Failed);
    }
}
