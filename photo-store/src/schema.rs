use rusqlite::{Connection, Result};

/// Initialize the media index database schema
pub fn init_media_schema(conn: &Connection) -> Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS media_schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    let current_version: i32 = conn
        .query_row(
            "SELECT version FROM media_schema_version ORDER BY version DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current_version < 1 {
        create_media_schema_v1(conn)?;
        conn.execute("INSERT INTO media_schema_version (version) VALUES (1)", [])?;
    }

    Ok(())
}

/// Version 1: image rows and per-package access grants
fn create_media_schema_v1(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS media_images (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            display_name TEXT NOT NULL,
            mime_type TEXT NOT NULL,
            width INTEGER NOT NULL DEFAULT 0,
            height INTEGER NOT NULL DEFAULT 0,
            volume TEXT NOT NULL,
            owner_package TEXT NOT NULL,
            data_path TEXT NOT NULL,
            date_added INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_media_images_date_added
         ON media_images(date_added DESC, id DESC)",
        [],
    )?;

    // Rows a package was allowed to modify through a recovered security denial
    conn.execute(
        "CREATE TABLE IF NOT EXISTS media_grants (
            image_id INTEGER NOT NULL REFERENCES media_images(id) ON DELETE CASCADE,
            package TEXT NOT NULL,
            PRIMARY KEY (image_id, package)
        )",
        [],
    )?;

    Ok(())
}
