use photo_store::{PickerError, StoreError};
use std::fmt;

/// Central error types for the gallery app
#[derive(Debug)]
pub enum AppError {
    /// Private or shared store error
    Store(StoreError),
    /// Camera or permission bridge error
    Picker(PickerError),
    /// Filesystem error
    Filesystem(std::io::Error),
    /// Permission denied (e.g. storage)
    PermissionDenied(String),
    /// Image processing error
    ImageProcessing(String),
    /// General error
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Store(e) => write!(f, "Storage error: {}", e),
            AppError::Picker(e) => write!(f, "Camera error: {}", e),
            AppError::Filesystem(e) => write!(f, "Filesystem error: {}", e),
            AppError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            AppError::ImageProcessing(msg) => write!(f, "Image processing error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Store(e)
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Filesystem(e)
    }
}

impl From<PickerError> for AppError {
    fn from(e: PickerError) -> Self {
        match e {
            PickerError::PermissionDenied(msg) => AppError::PermissionDenied(msg),
            other => AppError::Picker(other),
        }
    }
}

/// User-friendly error messages for UI
impl AppError {
    pub fn user_message(&self) -> String {
        match self {
            AppError::Store(_) => "Error accessing photos. Please try again.".to_string(),
            AppError::Picker(PickerError::PlatformNotSupported(_)) => {
                "No camera available on this device.".to_string()
            }
            AppError::Picker(_) => "The camera could not be used.".to_string(),
            AppError::Filesystem(_) => {
                "Error accessing files. Please check app permissions.".to_string()
            }
            AppError::PermissionDenied(msg) => format!("Permission required: {}", msg),
            AppError::ImageProcessing(_) => "Error processing image.".to_string(),
            AppError::Other(msg) => msg.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_picker_permission_errors_become_permission_denied() {
        let err = AppError::from(PickerError::PermissionDenied("camera".to_string()));
        assert!(matches!(err, AppError::PermissionDenied(_)));
        assert_eq!(err.user_message(), "Permission required: camera");
    }

    #[test]
    fn test_missing_camera_message() {
        let err = AppError::from(PickerError::PlatformNotSupported("desktop".to_string()));
        assert_eq!(err.user_message(), "No camera available on this device.");
    }
}
