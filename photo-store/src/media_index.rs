//! The shared media index: a queryable, insertable and deletable row store of
//! images visible to every app with permission.
//!
//! [`MediaIndex`] is implemented by the Android `MediaStore` bridge and by
//! [`SqliteMediaIndex`], which keeps rows in SQLite and image bytes on disk.

use crate::error::StoreError;
use crate::models::{
    ConfirmationKind, ConfirmationRequest, ConfirmationResult, Locator, MediaRow, NewMediaEntry,
    SecurityDenial,
};
use crate::platform::CollectionUri;
use crate::schema::init_media_schema;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

pub trait MediaIndex: Send + Sync {
    /// Inserts a row into `collection`. `None` means the index accepted the
    /// call but created no row.
    fn insert(
        &self,
        collection: CollectionUri,
        entry: &NewMediaEntry,
    ) -> Result<Option<Locator>, StoreError>;

    /// Streams the encoded image into the row behind `locator`
    fn write_content(&self, locator: &Locator, bytes: &[u8]) -> Result<(), StoreError>;

    fn read_content(&self, locator: &Locator) -> Result<Vec<u8>, StoreError>;

    /// All image rows of `collection`, newest insertion first
    fn query_images(&self, collection: CollectionUri) -> Result<Vec<MediaRow>, StoreError>;

    /// Removes the row behind `locator` and returns the number of rows deleted.
    /// Rows the app may not modify fail with [`StoreError::SecurityDenied`].
    fn delete(&self, locator: &Locator) -> Result<usize, StoreError>;

    /// Builds a platform delete request the user can approve
    fn create_delete_request(
        &self,
        locators: &[Locator],
    ) -> Result<ConfirmationRequest, StoreError>;

    /// Shows the confirmation to the user and waits for the answer
    fn present_confirmation(
        &self,
        request: &ConfirmationRequest,
    ) -> Result<ConfirmationResult, StoreError>;

    /// Carries out what the user approved: the deletion itself for a delete
    /// request, write access for a recoverable action.
    fn apply_confirmation(&self, request: &ConfirmationRequest) -> Result<(), StoreError>;

    /// Releases whatever the index keeps for a confirmation that will never be presented
    fn discard_confirmation(&self, _token: u64) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Media index kept in SQLite, with image content as files in a directory
pub struct SqliteMediaIndex {
    conn: Mutex<Connection>,
    content_dir: PathBuf,
    owner_package: String,
    enforce_ownership: bool,
    auto_confirm: bool,
    next_token: AtomicU64,
}

impl SqliteMediaIndex {
    /// Opens (and creates if needed) the index database at `db_path`
    pub fn open(
        db_path: &Path,
        content_dir: impl Into<PathBuf>,
        owner_package: impl Into<String>,
    ) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        Self::from_connection(conn, content_dir, owner_package)
    }

    pub fn from_connection(
        conn: Connection,
        content_dir: impl Into<PathBuf>,
        owner_package: impl Into<String>,
    ) -> Result<Self, StoreError> {
        init_media_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            content_dir: content_dir.into(),
            owner_package: owner_package.into(),
            enforce_ownership: true,
            auto_confirm: false,
            next_token: AtomicU64::new(1),
        })
    }

    /// Legacy storage lets any app holding write permission modify every row
    pub fn with_ownership(mut self, enforce: bool) -> Self {
        self.enforce_ownership = enforce;
        self
    }

    /// There is no dialog off-device; this decides what the "user" answers
    pub fn with_auto_confirm(mut self, auto_confirm: bool) -> Self {
        self.auto_confirm = auto_confirm;
        self
    }

    pub fn owner_package(&self) -> &str {
        &self.owner_package
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Other("Media index lock poisoned".to_string()))
    }

    fn row_id(locator: &Locator) -> Result<i64, StoreError> {
        locator
            .row_id()
            .ok_or_else(|| StoreError::NotFound(format!("No row id in {}", locator)))
    }

    fn data_path(conn: &Connection, id: i64) -> Result<Option<String>, StoreError> {
        Ok(conn
            .query_row(
                "SELECT data_path FROM media_images WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn may_modify(&self, conn: &Connection, id: i64, owner: &str) -> Result<bool, StoreError> {
        if !self.enforce_ownership || owner == self.owner_package {
            return Ok(true);
        }
        let granted: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM media_grants WHERE image_id = ?1 AND package = ?2",
            params![id, &self.owner_package],
            |row| row.get(0),
        )?;
        Ok(granted)
    }

    fn deny(&self, locator: &Locator, owner: &str) -> StoreError {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        StoreError::SecurityDenied(SecurityDenial {
            locator: locator.clone(),
            message: format!(
                "{} has no access to {} owned by {}",
                self.owner_package, locator, owner
            ),
            recovery_token: Some(token),
        })
    }

    /// Deletes the row and its content file without any ownership check
    fn remove_row(conn: &Connection, id: i64) -> Result<usize, StoreError> {
        let data_path = Self::data_path(conn, id)?;
        let rows = conn.execute("DELETE FROM media_images WHERE id = ?1", params![id])?;
        if let Some(path) = data_path {
            if let Err(e) = std::fs::remove_file(&path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("Could not remove media content {}: {}", path, e);
                }
            }
        }
        Ok(rows)
    }
}

impl MediaIndex for SqliteMediaIndex {
    fn insert(
        &self,
        collection: CollectionUri,
        entry: &NewMediaEntry,
    ) -> Result<Option<Locator>, StoreError> {
        let extension = Path::new(&entry.display_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("jpg");
        let data_path = self
            .content_dir
            .join(format!("{}.{}", Uuid::new_v4(), extension));

        let conn = self.lock()?;
        let rows = conn.execute(
            "INSERT INTO media_images (display_name, mime_type, width, height, volume, owner_package, data_path, date_added)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                &entry.display_name,
                &entry.mime_type,
                entry.width,
                entry.height,
                collection.volume(),
                &self.owner_package,
                data_path.to_string_lossy(),
                chrono::Utc::now().timestamp(),
            ],
        )?;
        if rows == 0 {
            return Ok(None);
        }

        let locator = Locator::for_image_id(conn.last_insert_rowid());
        log::debug!("Inserted media row {} ({})", locator, entry.display_name);
        Ok(Some(locator))
    }

    fn write_content(&self, locator: &Locator, bytes: &[u8]) -> Result<(), StoreError> {
        let id = Self::row_id(locator)?;
        let conn = self.lock()?;
        let row: Option<(String, String)> = conn
            .query_row(
                "SELECT data_path, owner_package FROM media_images WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let (data_path, owner) =
            row.ok_or_else(|| StoreError::NotFound(locator.to_string()))?;

        if !self.may_modify(&conn, id, &owner)? {
            return Err(self.deny(locator, &owner));
        }

        std::fs::create_dir_all(&self.content_dir)?;
        std::fs::write(&data_path, bytes)?;
        Ok(())
    }

    fn read_content(&self, locator: &Locator) -> Result<Vec<u8>, StoreError> {
        let id = Self::row_id(locator)?;
        let data_path = {
            let conn = self.lock()?;
            Self::data_path(&conn, id)?
        };
        let data_path = data_path.ok_or_else(|| StoreError::NotFound(locator.to_string()))?;
        Ok(std::fs::read(data_path)?)
    }

    fn query_images(&self, collection: CollectionUri) -> Result<Vec<MediaRow>, StoreError> {
        let conn = self.lock()?;
        // The external collection spans every volume
        let volume_filter = match collection {
            CollectionUri::External => None,
            CollectionUri::ExternalPrimary => Some(collection.volume()),
        };

        let mut stmt = conn.prepare(
            "SELECT id, display_name, width, height
             FROM media_images
             WHERE ?1 IS NULL OR volume = ?1
             ORDER BY date_added DESC, id DESC",
        )?;

        let rows = stmt.query_map(params![volume_filter], |row| {
            Ok(MediaRow {
                id: row.get(0)?,
                display_name: row.get(1)?,
                width: row.get(2)?,
                height: row.get(3)?,
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn delete(&self, locator: &Locator) -> Result<usize, StoreError> {
        let id = Self::row_id(locator)?;
        let conn = self.lock()?;
        let owner: Option<String> = conn
            .query_row(
                "SELECT owner_package FROM media_images WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        let Some(owner) = owner else {
            return Ok(0);
        };

        if !self.may_modify(&conn, id, &owner)? {
            return Err(self.deny(locator, &owner));
        }

        Self::remove_row(&conn, id)
    }

    fn create_delete_request(
        &self,
        locators: &[Locator],
    ) -> Result<ConfirmationRequest, StoreError> {
        Ok(ConfirmationRequest {
            locators: locators.to_vec(),
            kind: ConfirmationKind::DeleteRequest,
            token: self.next_token.fetch_add(1, Ordering::Relaxed),
        })
    }

    fn present_confirmation(
        &self,
        request: &ConfirmationRequest,
    ) -> Result<ConfirmationResult, StoreError> {
        let result = if self.auto_confirm {
            ConfirmationResult::Confirmed
        } else {
            ConfirmationResult::Denied
        };
        log::info!(
            "Confirmation {} for {} row(s): {:?}",
            request.token,
            request.locators.len(),
            result
        );
        Ok(result)
    }

    fn apply_confirmation(&self, request: &ConfirmationRequest) -> Result<(), StoreError> {
        let conn = self.lock()?;
        for locator in &request.locators {
            let id = Self::row_id(locator)?;
            match request.kind {
                ConfirmationKind::DeleteRequest => {
                    Self::remove_row(&conn, id)?;
                }
                ConfirmationKind::RecoverableAction => {
                    conn.execute(
                        "INSERT OR IGNORE INTO media_grants (image_id, package) VALUES (?1, ?2)",
                        params![id, &self.owner_package],
                    )?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_as(dir: &Path, owner: &str) -> SqliteMediaIndex {
        SqliteMediaIndex::open(&dir.join("media.db"), dir.join("content"), owner).unwrap()
    }

    #[test]
    fn test_insert_write_read() {
        let temp_dir = tempfile::tempdir().unwrap();
        let index = open_as(temp_dir.path(), "app.one");

        let locator = index
            .insert(
                CollectionUri::ExternalPrimary,
                &NewMediaEntry::jpeg("a.jpg", 3, 2),
            )
            .unwrap()
            .unwrap();
        index.write_content(&locator, b"bytes").unwrap();

        assert_eq!(index.read_content(&locator).unwrap(), b"bytes".to_vec());
        assert!(locator
            .as_str()
            .starts_with("content://media/external/images/media/"));
    }

    #[test]
    fn test_external_query_spans_volumes() {
        let conn = Connection::open_in_memory().unwrap();
        let temp_dir = tempfile::tempdir().unwrap();
        let index = SqliteMediaIndex::from_connection(conn, temp_dir.path(), "app.one").unwrap();

        index
            .insert(CollectionUri::External, &NewMediaEntry::jpeg("old.jpg", 1, 1))
            .unwrap();
        index
            .insert(
                CollectionUri::ExternalPrimary,
                &NewMediaEntry::jpeg("new.jpg", 1, 1),
            )
            .unwrap();

        assert_eq!(index.query_images(CollectionUri::External).unwrap().len(), 2);
        let primary = index.query_images(CollectionUri::ExternalPrimary).unwrap();
        assert_eq!(primary.len(), 1);
        assert_eq!(primary[0].display_name, "new.jpg");
    }

    #[test]
    fn test_query_orders_by_date_added() {
        let conn = Connection::open_in_memory().unwrap();
        let temp_dir = tempfile::tempdir().unwrap();
        let index = SqliteMediaIndex::from_connection(conn, temp_dir.path(), "app.one").unwrap();

        let mut ids = Vec::new();
        for name in ["a.jpg", "b.jpg", "c.jpg"] {
            let locator = index
                .insert(CollectionUri::External, &NewMediaEntry::jpeg(name, 1, 1))
                .unwrap()
                .unwrap();
            ids.push(locator.row_id().unwrap());
        }
        {
            let conn = index.lock().unwrap();
            for (id, date_added) in ids.iter().zip([2_000_i64, 3_000, 1_000]) {
                conn.execute(
                    "UPDATE media_images SET date_added = ?1 WHERE id = ?2",
                    params![date_added, id],
                )
                .unwrap();
            }
        }

        let names: Vec<_> = index
            .query_images(CollectionUri::External)
            .unwrap()
            .into_iter()
            .map(|row| row.display_name)
            .collect();
        assert_eq!(names, vec!["b.jpg", "a.jpg", "c.jpg"]);
    }

    #[test]
    fn test_foreign_row_is_denied() {
        let temp_dir = tempfile::tempdir().unwrap();
        let camera = open_as(temp_dir.path(), "other.camera");
        let gallery = open_as(temp_dir.path(), "app.gallery");

        let locator = camera
            .insert(CollectionUri::External, &NewMediaEntry::jpeg("x.jpg", 1, 1))
            .unwrap()
            .unwrap();

        match gallery.delete(&locator) {
            Err(StoreError::SecurityDenied(denial)) => {
                assert_eq!(denial.locator, locator);
                assert!(denial.recovery_token.is_some());
            }
            other => panic!("expected a security denial, got {:?}", other),
        }
        assert_eq!(camera.query_images(CollectionUri::External).unwrap().len(), 1);
    }

    #[test]
    fn test_legacy_storage_ignores_ownership() {
        let temp_dir = tempfile::tempdir().unwrap();
        let camera = open_as(temp_dir.path(), "other.camera");
        let gallery = open_as(temp_dir.path(), "app.gallery").with_ownership(false);

        let locator = camera
            .insert(CollectionUri::External, &NewMediaEntry::jpeg("x.jpg", 1, 1))
            .unwrap()
            .unwrap();
        assert_eq!(gallery.delete(&locator).unwrap(), 1);
    }

    #[test]
    fn test_recoverable_grant_allows_delete() {
        let temp_dir = tempfile::tempdir().unwrap();
        let camera = open_as(temp_dir.path(), "other.camera");
        let gallery = open_as(temp_dir.path(), "app.gallery");

        let locator = camera
            .insert(CollectionUri::External, &NewMediaEntry::jpeg("x.jpg", 1, 1))
            .unwrap()
            .unwrap();

        let request = ConfirmationRequest {
            locators: vec![locator.clone()],
            kind: ConfirmationKind::RecoverableAction,
            token: 7,
        };
        gallery.apply_confirmation(&request).unwrap();
        assert_eq!(gallery.delete(&locator).unwrap(), 1);
    }

    #[test]
    fn test_delete_unknown_row_is_zero() {
        let conn = Connection::open_in_memory().unwrap();
        let temp_dir = tempfile::tempdir().unwrap();
        let index = SqliteMediaIndex::from_connection(conn, temp_dir.path(), "app.one").unwrap();
        assert_eq!(index.delete(&Locator::for_image_id(99)).unwrap(), 0);
    }

    #[test]
    fn test_present_confirmation_follows_auto_confirm() {
        let conn = Connection::open_in_memory().unwrap();
        let temp_dir = tempfile::tempdir().unwrap();
        let index = SqliteMediaIndex::from_connection(conn, temp_dir.path(), "app.one").unwrap();
        let request = index.create_delete_request(&[Locator::for_image_id(1)]).unwrap();
        assert_eq!(
            index.present_confirmation(&request).unwrap(),
            ConfirmationResult::Denied
        );

        let index = index.with_auto_confirm(true);
        assert_eq!(
            index.present_confirmation(&request).unwrap(),
            ConfirmationResult::Confirmed
        );
    }
}
