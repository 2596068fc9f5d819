use crate::error::StoreError;
use crate::platform::API_R;
use crate::private_store::PHOTO_EXTENSION;
use crate::thumbnail::DEFAULT_JPEG_QUALITY;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the photo stores, read from `gallery.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    /// Directory of the private gallery
    pub private_dir: PathBuf,
    /// SQLite database of the off-device media index
    pub media_db: PathBuf,
    /// Directory holding the content of the off-device media index
    pub media_content_dir: PathBuf,
    /// Package name rows inserted by this app are owned by
    pub owner_package: String,
    /// API level assumed where it cannot be detected
    pub api_level: u32,
    pub jpeg_quality: u8,
    pub photo_extension: String,
    /// Answer to delete confirmations when there is no platform dialog
    pub auto_confirm: bool,
    /// Image used instead of the camera where there is none
    pub capture_fallback: Option<PathBuf>,
    /// Edge length of gallery thumbnails in pixels
    pub thumbnail_size: u32,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self::for_data_dir(Path::new("./data"))
    }
}

impl GalleryConfig {
    /// Defaults with every path placed under `data_dir`
    pub fn for_data_dir(data_dir: &Path) -> Self {
        Self {
            private_dir: data_dir.join("private"),
            media_db: data_dir.join("media").join("media.db"),
            media_content_dir: data_dir.join("media").join("content"),
            owner_package: "dev.dioxus.main".to_string(),
            api_level: API_R,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            photo_extension: PHOTO_EXTENSION.to_string(),
            auto_confirm: true,
            capture_fallback: None,
            thumbnail_size: 256,
        }
    }

    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Parses `s` on top of `base`; keys missing from `s` keep the value from `base`
    pub fn from_toml_over(s: &str, base: &Self) -> Result<Self, StoreError> {
        let overrides: toml::Table = toml::from_str(s)
            .map_err(|e| StoreError::Other(format!("Invalid config: {}", e)))?;
        let mut merged = toml::Table::try_from(base)
            .map_err(|e| StoreError::Other(format!("Config defaults: {}", e)))?;
        for (key, value) in overrides {
            merged.insert(key, value);
        }
        merged
            .try_into()
            .map_err(|e| StoreError::Other(format!("Invalid config: {}", e)))
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Loads `path` if it exists, otherwise the defaults for `data_dir`
    pub fn load_or_default(path: &Path, data_dir: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            log::debug!("No config at {:?}, using defaults", path);
            return Ok(Self::for_data_dir(data_dir));
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_over(&content, &Self::for_data_dir(data_dir))
            .map_err(|e| StoreError::Other(format!("{:?}: {}", path, e)))?;
        log::info!("Loaded config from {:?}", path);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = GalleryConfig::from_toml(
            r#"
            owner_package = "com.example.gallery"
            api_level = 29
            "#,
        )
        .unwrap();
        assert_eq!(config.owner_package, "com.example.gallery");
        assert_eq!(config.api_level, 29);
        assert_eq!(config.jpeg_quality, 95);
        assert_eq!(config.photo_extension, "jpg");
        assert_eq!(config.capture_fallback, None);
    }

    #[test]
    fn test_missing_file_uses_data_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = GalleryConfig::load_or_default(
            &temp_dir.path().join("gallery.toml"),
            temp_dir.path(),
        )
        .unwrap();
        assert_eq!(config.private_dir, temp_dir.path().join("private"));
    }

    #[test]
    fn test_partial_file_keeps_paths_under_data_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("gallery.toml");
        std::fs::write(&path, "auto_confirm = false\n").unwrap();

        let config = GalleryConfig::load_or_default(&path, temp_dir.path()).unwrap();
        assert!(!config.auto_confirm);
        assert_eq!(config.private_dir, temp_dir.path().join("private"));
        assert_eq!(
            config.media_db,
            temp_dir.path().join("media").join("media.db")
        );
        assert_eq!(config.thumbnail_size, 256);
    }

    #[test]
    fn test_file_paths_override_data_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("gallery.toml");
        std::fs::write(&path, "private_dir = \"/sdcard/hidden\"\n").unwrap();

        let config = GalleryConfig::load_or_default(&path, temp_dir.path()).unwrap();
        assert_eq!(config.private_dir, PathBuf::from("/sdcard/hidden"));
        assert_eq!(
            config.media_content_dir,
            temp_dir.path().join("media").join("content")
        );
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("gallery.toml");
        std::fs::write(&path, "jpeg_quality = \"high\"").unwrap();
        assert!(GalleryConfig::load_or_default(&path, temp_dir.path()).is_err());
    }

    #[test]
    fn test_written_config_reads_back() {
        let config = GalleryConfig {
            capture_fallback: Some(PathBuf::from("/tmp/sample.jpg")),
            ..GalleryConfig::default()
        };
        let parsed = GalleryConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }
}
