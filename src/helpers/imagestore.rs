use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{debug, error, info};
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use thiserror::Error;

/// Error types for the persistent artist image store
#[derive(Debug, Error)]
pub enum ImageStoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Store is not available")]
    Unavailable,
}

/// Durable key-value store mapping artist name to a stored image payload
/// or an explicit negative marker
///
/// `Some(payload)` means a resolved image, `None` means "attempted, found
/// nothing". The store is read in bulk once at startup and written through
/// on every settled resolution; `delete` backs the force-retry operation so
/// a cleared entry does not resurrect on the next start.
pub trait ImageStore: Send + Sync {
    fn load_all(&self) -> Result<HashMap<String, Option<String>>, ImageStoreError>;
    fn save(&self, artist: &str, payload: Option<&str>) -> Result<(), ImageStoreError>;
    fn delete(&self, artist: &str) -> Result<(), ImageStoreError>;
}

/// SQLite-backed implementation of [`ImageStore`]
pub struct SqliteImageStore {
    db_path: PathBuf,
    db: Mutex<Option<Connection>>,
}

impl SqliteImageStore {
    /// Open (or create) the store at the given database file
    pub fn with_database_file<P: AsRef<Path>>(db_file: P) -> Self {
        let db_path = db_file.as_ref().to_path_buf();

        if let Some(parent) = db_path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                error!("Failed to create directory for artist image store: {}", e);
            }
        }

        let db = Self::setup_database(&db_path);

        SqliteImageStore {
            db_path,
            db: Mutex::new(db),
        }
    }

    /// Setup the SQLite database and create the schema if needed
    fn setup_database(db_path: &Path) -> Option<Connection> {
        match Connection::open(db_path) {
            Ok(conn) => {
                if let Err(e) = conn.execute(
                    "CREATE TABLE IF NOT EXISTS artist_images (
                        artist TEXT PRIMARY KEY,
                        payload TEXT,
                        negative INTEGER NOT NULL DEFAULT 0,
                        updated_at INTEGER NOT NULL
                    )",
                    [],
                ) {
                    error!("Failed to create artist_images table: {}", e);
                    return None;
                }
                info!("Opened artist image store at {:?}", db_path);
                Some(conn)
            }
            Err(e) => {
                error!("Failed to open artist image store at {:?}: {}", db_path, e);
                None
            }
        }
    }

    pub fn database_path(&self) -> &Path {
        &self.db_path
    }
}

impl ImageStore for SqliteImageStore {
    fn load_all(&self) -> Result<HashMap<String, Option<String>>, ImageStoreError> {
        let guard = self.db.lock();
        let conn = guard.as_ref().ok_or(ImageStoreError::Unavailable)?;

        let mut stmt = conn
            .prepare("SELECT artist, payload, negative FROM artist_images")
            .map_err(|e| ImageStoreError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                let artist: String = row.get(0)?;
                let payload: Option<String> = row.get(1)?;
                let negative: i64 = row.get(2)?;
                Ok((artist, payload, negative))
            })
            .map_err(|e| ImageStoreError::Database(e.to_string()))?;

        let mut entries = HashMap::new();
        for row in rows {
            let (artist, payload, negative) =
                row.map_err(|e| ImageStoreError::Database(e.to_string()))?;
            // A row without a payload is a negative marker regardless of flag
            let entry = if negative != 0 { None } else { payload };
            entries.insert(artist, entry);
        }

        debug!("Loaded {} artist image entries from {:?}", entries.len(), self.db_path);
        Ok(entries)
    }

    fn save(&self, artist: &str, payload: Option<&str>) -> Result<(), ImageStoreError> {
        let guard = self.db.lock();
        let conn = guard.as_ref().ok_or(ImageStoreError::Unavailable)?;

        let negative = if payload.is_none() { 1 } else { 0 };
        conn.execute(
            "INSERT OR REPLACE INTO artist_images (artist, payload, negative, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![artist, payload, negative, chrono::Utc::now().timestamp()],
        )
        .map_err(|e| ImageStoreError::Database(e.to_string()))?;

        debug!(
            "Persisted {} entry for artist '{}'",
            if negative == 1 { "negative" } else { "resolved" },
            artist
        );
        Ok(())
    }

    fn delete(&self, artist: &str) -> Result<(), ImageStoreError> {
        let guard = self.db.lock();
        let conn = guard.as_ref().ok_or(ImageStoreError::Unavailable)?;

        conn.execute("DELETE FROM artist_images WHERE artist = ?1", params![artist])
            .map_err(|e| ImageStoreError::Database(e.to_string()))?;
        Ok(())
    }
}

/// In-memory implementation of [`ImageStore`] for tests and callers that
/// do not need durability
#[derive(Default)]
pub struct MemoryImageStore {
    entries: Mutex<HashMap<String, Option<String>>>,
}

impl MemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: HashMap<String, Option<String>>) -> Self {
        MemoryImageStore {
            entries: Mutex::new(entries),
        }
    }
}

impl ImageStore for MemoryImageStore {
    fn load_all(&self) -> Result<HashMap<String, Option<String>>, ImageStoreError> {
        Ok(self.entries.lock().clone())
    }

    fn save(&self, artist: &str, payload: Option<&str>) -> Result<(), ImageStoreError> {
        self.entries
            .lock()
            .insert(artist.to_string(), payload.map(|p| p.to_string()));
        Ok(())
    }

    fn delete(&self, artist: &str) -> Result<(), ImageStoreError> {
        self.entries.lock().remove(artist);
        Ok(())
    }
}
