use crate::error::StoreError;
use crate::models::PrivatePhoto;
use crate::thumbnail::{encode_jpeg, DEFAULT_JPEG_QUALITY};
use image::DynamicImage;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Extension of the files the private gallery shows
pub const PHOTO_EXTENSION: &str = "jpg";

/// Photos in a directory only this app can see
#[derive(Debug, Clone)]
pub struct PrivateStore {
    dir: PathBuf,
    quality: u8,
    extension: String,
}

impl PrivateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_quality(dir, DEFAULT_JPEG_QUALITY)
    }

    pub fn with_quality(dir: impl Into<PathBuf>, quality: u8) -> Self {
        Self {
            dir: dir.into(),
            quality,
            extension: PHOTO_EXTENSION.to_string(),
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Resolves `name` inside the store, refusing anything that could leave it
    fn file_path(&self, name: &str) -> Result<PathBuf, StoreError> {
        if name.is_empty()
            || name == "."
            || name == ".."
            || name.contains('/')
            || name.contains('\\')
        {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        Ok(self.dir.join(name))
    }

    /// Writes `image` as JPEG under `name`
    pub fn save(&self, name: &str, image: &DynamicImage) -> Result<(), StoreError> {
        let path = self.file_path(name)?;
        fs::create_dir_all(&self.dir)?;

        let file = File::create(&path)?;
        let mut writer = BufWriter::new(file);
        encode_jpeg(image, &mut writer, self.quality)?;
        writer.flush()?;

        log::debug!(
            "Saved private photo {:?} ({}x{})",
            path,
            image.width(),
            image.height()
        );
        Ok(())
    }

    /// Decodes every readable photo file in the store, sorted by name
    pub fn list(&self) -> Result<Vec<PrivatePhoto>, StoreError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut photos = Vec::new();
        for entry in fs::read_dir(&self.dir)?.filter_map(|entry| entry.ok()) {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(self.extension.as_str()) {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            // Unreadable files are not part of the gallery
            let bytes = match fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    log::debug!("Skipping unreadable {:?}: {}", path, e);
                    continue;
                }
            };

            match image::load_from_memory(&bytes) {
                Ok(image) => photos.push(PrivatePhoto {
                    name: name.to_string(),
                    image,
                }),
                Err(e) => log::warn!("Could not decode {:?}: {}", path, e),
            }
        }

        photos.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(photos)
    }

    /// Removes the file called `name`. A missing file and an I/O failure both
    /// report `false`.
    pub fn delete(&self, name: &str) -> bool {
        let result = self
            .file_path(name)
            .and_then(|path| fs::remove_file(path).map_err(StoreError::from));

        match result {
            Ok(()) => {
                log::debug!("Deleted private photo {}", name);
                true
            }
            Err(e) => {
                log::error!("Failed to delete private photo {}: {}", name, e);
                false
            }
        }
    }
}
