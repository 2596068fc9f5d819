// Thin wrapper around photo-store's capture surface, mapping its errors to AppError
// and keeping the blocking camera round-trip off the UI thread.

use crate::error::AppError;
use image::DynamicImage;
use std::path::PathBuf;

/// Takes one photo. `Ok(None)` when the user closed the camera without one.
pub async fn capture_image(fallback: Option<PathBuf>) -> Result<Option<DynamicImage>, AppError> {
    tokio::task::spawn_blocking(move || photo_store::capture_image(fallback.as_deref()))
        .await
        .map_err(|e| AppError::Other(format!("Camera task failed: {}", e)))?
        .map_err(AppError::from)
}
