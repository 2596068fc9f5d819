use crate::models::SecurityDenial;
use crate::picker::PickerError;

/// Error type for photo store operations
#[derive(Debug)]
pub enum StoreError {
    DatabaseError(rusqlite::Error),
    ImageError(image::ImageError),
    IoError(std::io::Error),
    /// The media index refused the operation because the app does not own the row
    SecurityDenied(SecurityDenial),
    NotFound(String),
    InvalidName(String),
    Platform(String),
    Other(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::DatabaseError(e) => write!(f, "Database error: {}", e),
            StoreError::ImageError(e) => write!(f, "Image error: {}", e),
            StoreError::IoError(e) => write!(f, "IO error: {}", e),
            StoreError::SecurityDenied(d) => {
                write!(f, "Security denied for {}: {}", d.locator, d.message)
            }
            StoreError::NotFound(msg) => write!(f, "Not found: {}", msg),
            StoreError::InvalidName(name) => write!(f, "Invalid photo name: {}", name),
            StoreError::Platform(msg) => write!(f, "Platform error: {}", msg),
            StoreError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::DatabaseError(e) => Some(e),
            StoreError::ImageError(e) => Some(e),
            StoreError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::DatabaseError(err)
    }
}

impl From<image::ImageError> for StoreError {
    fn from(err: image::ImageError) -> Self {
        StoreError::ImageError(err)
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::IoError(err)
    }
}

impl From<PickerError> for StoreError {
    fn from(err: PickerError) -> Self {
        StoreError::Platform(err.to_string())
    }
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        StoreError::Other(format!("Task join error: {}", err))
    }
}

#[cfg(target_os = "android")]
impl From<jni::errors::Error> for StoreError {
    fn from(err: jni::errors::Error) -> Self {
        StoreError::Platform(format!("JNI error: {}", err))
    }
}
