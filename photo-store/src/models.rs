use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// Base URI of the legacy external images collection. Locators are always
/// built from this prefix plus the row id.
pub const EXTERNAL_IMAGES_URI: &str = "content://media/external/images/media";

/// Opaque identifier resolving a row of the shared media index
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator(String);

impl Locator {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// Appends a row id to the external images collection
    pub fn for_image_id(id: i64) -> Self {
        Self(format!("{}/{}", EXTERNAL_IMAGES_URI, id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Trailing numeric segment of the URI, if any
    pub fn row_id(&self) -> Option<i64> {
        self.0.rsplit('/').next().and_then(|s| s.parse().ok())
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A photo from the app-private directory, decoded in memory
#[derive(Debug, Clone)]
pub struct PrivatePhoto {
    /// Filename on disk, extension included
    pub name: String,
    pub image: DynamicImage,
}

impl PrivatePhoto {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// A row of the shared media index projected for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedPhoto {
    pub id: i64,
    pub display_name: String,
    pub width: u32,
    pub height: u32,
    pub locator: Locator,
}

/// Values written into the media index when inserting an image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMediaEntry {
    pub display_name: String,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
}

impl NewMediaEntry {
    pub fn jpeg(display_name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            display_name: display_name.into(),
            mime_type: "image/jpeg".to_string(),
            width,
            height,
        }
    }
}

/// Raw row returned by a media index query (`_id`, `display_name`, `width`, `height`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRow {
    pub id: i64,
    pub display_name: String,
    pub width: u32,
    pub height: u32,
}

/// How a denied deletion can be confirmed by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfirmationKind {
    /// Platform delete dialog for a set of rows (API 30+)
    DeleteRequest,
    /// Recovery action carried by the security denial (API 29)
    RecoverableAction,
}

/// Request for the user to confirm a deletion the app may not perform alone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationRequest {
    pub locators: Vec<Locator>,
    pub kind: ConfirmationKind,
    /// Key under which the backend keeps the platform payload for this request
    pub token: u64,
}

/// User response to a [`ConfirmationRequest`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationResult {
    Confirmed,
    Denied,
}

/// Result of asking the shared store to delete a photo
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NeedsConfirmation(ConfirmationRequest),
    Failed,
}

impl DeleteOutcome {
    pub fn is_deleted(&self) -> bool {
        matches!(self, DeleteOutcome::Deleted)
    }
}

/// Details of a deletion refused by the media index ownership rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityDenial {
    pub locator: Locator,
    pub message: String,
    /// Token of the recovery payload stored by the backend, when the
    /// platform supplied one
    pub recovery_token: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_for_image_id() {
        let locator = Locator::for_image_id(42);
        assert_eq!(locator.as_str(), "content://media/external/images/media/42");
        assert_eq!(locator.row_id(), Some(42));
    }

    #[test]
    fn test_locator_without_id() {
        assert_eq!(Locator::new("content://media/external/images/media").row_id(), None);
    }
}
