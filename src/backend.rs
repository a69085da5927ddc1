// Key-value storage backends for persisted task state

use crate::error::BackendError;
use fs2::FileExt;
use rusqlite::{Connection, OptionalExtension};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::debug;

type Result<T> = std::result::Result<T, BackendError>;

/// A durable key-value store holding string values in named slots
pub trait Backend {
    /// Read a slot; `None` if it has never been written
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite a slot
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Slot keys become filenames and table keys, so keep them boring
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(BackendError::InvalidKey("key cannot be empty".to_string()));
    }
    if key.len() > 64 {
        return Err(BackendError::InvalidKey(format!("{} (max 64 chars)", key)));
    }
    if !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Err(BackendError::InvalidKey(format!(
            "{} (must be alphanumeric with _/-)",
            key
        )));
    }
    Ok(())
}

// ============================================================================
// File backend
// ============================================================================

/// One `<key>.json` file per slot inside a directory
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Open or create a file backend rooted at `dir`
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        debug!(dir = ?dir, "Opened file backend");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn tmp_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json.tmp", key))
    }

    fn lock_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.lock", key))
    }
}

impl Backend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let path = self.slot_path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    /// Write `<key>.json.tmp`, sync it, then rename it over `<key>.json`
    ///
    /// Readers see either the old or the new contents, never a partial file.
    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        let path = self.slot_path(key);
        let tmp = self.tmp_path(key);

        // Writers serialize on a sibling lock file, since the slot file gets replaced
        let lock = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path(key))?;
        lock.lock_exclusive()?;

        let mut file = OpenOptions::new().create(true).write(true).truncate(true).open(&tmp)?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp, &path)?;

        debug!(file = ?path, bytes = value.len(), "Wrote slot");
        // Released when `lock` is dropped
        Ok(())
    }
}

// ============================================================================
// SQLite backend
// ============================================================================

/// All slots in a single `slots` table
pub struct SqliteBackend {
    db: Connection,
}

impl SqliteBackend {
    /// Open or create `tasklist.db` inside `dir`
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        fs::create_dir_all(dir.as_ref())?;
        let db_path = dir.as_ref().join("tasklist.db");
        let db = Connection::open(&db_path)?;
        debug!(db = ?db_path, "Opened SQLite backend");
        Self::with_connection(db)
    }

    /// Use an existing connection, e.g. `Connection::open_in_memory()`
    pub fn with_connection(db: Connection) -> Result<Self> {
        db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS slots (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )?;
        Ok(Self { db })
    }
}

impl Backend for SqliteBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let value = self
            .db
            .query_row("SELECT value FROM slots WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        self.db.execute(
            "INSERT OR REPLACE INTO slots (key, value, updated_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![key, value, chrono::Utc::now().timestamp_millis()],
        )?;
        debug!(key, bytes = value.len(), "Wrote slot");
        Ok(())
    }
}

// ============================================================================
// In-memory backend
// ============================================================================

/// In-process slots; clones share the same map
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    slots: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Backend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        Ok(self.slots.borrow().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        self.slots.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }
}
