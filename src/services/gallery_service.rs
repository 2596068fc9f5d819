use crate::error::AppError;
use crate::filesystem;
use crate::image_processing::image_to_data_url;
use photo_store::{
    run_blocking, CaptureRouter, CaptureTarget, ConfirmationRequest, DeleteOutcome,
    GalleryConfig, Locator, MediaIndex, PermissionState, PrivateStore, SharedPhoto, SharedStore,
    StorageCapabilities,
};
use std::sync::{Arc, OnceLock};

/// Stores and configuration shared by every screen
pub struct GalleryServices {
    pub config: GalleryConfig,
    pub caps: StorageCapabilities,
    pub private: Arc<PrivateStore>,
    pub shared: Arc<SharedStore>,
    pub router: CaptureRouter,
}

static GALLERY_SERVICES: OnceLock<Result<GalleryServices, String>> = OnceLock::new();

/// A private photo ready for display
#[derive(Debug, Clone, PartialEq)]
pub struct PrivateGalleryItem {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub data_url: Option<String>,
}

/// A shared photo ready for display
#[derive(Debug, Clone, PartialEq)]
pub struct SharedGalleryItem {
    pub photo: SharedPhoto,
    pub data_url: Option<String>,
}

fn load_config() -> GalleryConfig {
    let data_dir = filesystem::get_app_data_dir();
    match GalleryConfig::load_or_default(&filesystem::config_path(), &data_dir) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Falling back to default config: {}", e);
            GalleryConfig::for_data_dir(&data_dir)
        }
    }
}

#[cfg(target_os = "android")]
fn open_media_index(
    _config: &GalleryConfig,
    _caps: &StorageCapabilities,
) -> Result<Arc<dyn MediaIndex>, AppError> {
    Ok(Arc::new(photo_store::AndroidMediaStore::default()))
}

#[cfg(not(target_os = "android"))]
fn open_media_index(
    config: &GalleryConfig,
    caps: &StorageCapabilities,
) -> Result<Arc<dyn MediaIndex>, AppError> {
    let index = photo_store::SqliteMediaIndex::open(
        &config.media_db,
        config.media_content_dir.clone(),
        config.owner_package.clone(),
    )?
    .with_ownership(caps.scoped_storage)
    .with_auto_confirm(config.auto_confirm);
    Ok(Arc::new(index))
}

/// Builds the stores from a configuration. Capabilities are detected here,
/// once for the whole process.
pub fn build_services(config: GalleryConfig) -> Result<GalleryServices, AppError> {
    let caps = StorageCapabilities::detect(config.api_level);
    let index = open_media_index(&config, &caps)?;

    let private = Arc::new(
        PrivateStore::with_quality(config.private_dir.clone(), config.jpeg_quality)
            .with_extension(config.photo_extension.clone()),
    );
    let shared = Arc::new(SharedStore::new(index, caps).with_quality(config.jpeg_quality));
    let router = CaptureRouter::new(Arc::clone(&private), Arc::clone(&shared));

    Ok(GalleryServices {
        config,
        caps,
        private,
        shared,
        router,
    })
}

/// Initialize the gallery services on first use
pub fn init_gallery_services() -> Result<&'static GalleryServices, AppError> {
    GALLERY_SERVICES
        .get_or_init(|| build_services(load_config()).map_err(|e| e.to_string()))
        .as_ref()
        .map_err(|e| AppError::Other(e.clone()))
}

impl GalleryServices {
    pub async fn save_capture(
        &self,
        is_private: bool,
        permissions: PermissionState,
        image: image::DynamicImage,
    ) -> bool {
        self.router
            .save(CaptureTarget::from_private_toggle(is_private), permissions, image)
            .await
    }

    pub async fn load_private_photos(&self) -> Result<Vec<PrivateGalleryItem>, AppError> {
        let store = Arc::clone(&self.private);
        let size = self.config.thumbnail_size;
        let items = run_blocking(move || {
            let photos = store.list()?;
            Ok(photos
                .into_iter()
                .map(|photo| PrivateGalleryItem {
                    width: photo.width(),
                    height: photo.height(),
                    data_url: image_to_data_url(&photo.image, size).ok(),
                    name: photo.name,
                })
                .collect())
        })
        .await?;
        Ok(items)
    }

    pub async fn delete_private_photo(&self, name: String) -> bool {
        let store = Arc::clone(&self.private);
        run_blocking(move || Ok(store.delete(&name)))
            .await
            .unwrap_or(false)
    }

    pub async fn load_shared_photos(&self) -> Result<Vec<SharedGalleryItem>, AppError> {
        let store = Arc::clone(&self.shared);
        let size = self.config.thumbnail_size;
        let items = run_blocking(move || {
            let photos = store.list()?;
            Ok(photos
                .into_iter()
                .map(|photo| {
                    let data_url = match store.load_image(&photo.locator) {
                        Ok(image) => image_to_data_url(&image, size).ok(),
                        Err(e) => {
                            log::warn!("No preview for {}: {}", photo.locator, e);
                            None
                        }
                    };
                    SharedGalleryItem { photo, data_url }
                })
                .collect())
        })
        .await?;
        Ok(items)
    }

    pub async fn delete_shared_photo(&self, locator: Locator) -> DeleteOutcome {
        let store = Arc::clone(&self.shared);
        run_blocking(move || Ok(store.delete(&locator)))
            .await
            .unwrap_or(DeleteOutcome::Failed)
    }

    /// Shows the confirmation and finishes the deletion with the user's answer
    pub async fn confirm_shared_delete(&self, request: ConfirmationRequest) -> DeleteOutcome {
        let store = Arc::clone(&self.shared);
        run_blocking(move || {
            let answer = store.present_confirmation(&request);
            Ok(store.resolve_confirmation(&request, answer))
        })
        .await
        .unwrap_or(DeleteOutcome::Failed)
    }
}
