//! Local persistence for the cart.
//!
//! The cart is kept the way a browser keeps it in local storage: one JSON
//! document under a fixed key. [`SqliteCartStore`] keeps that document in a
//! small `SQLite` key/value table; [`MemoryCartStore`] keeps it in memory for
//! tests and one-off sessions.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

use crate::cart::CartItem;
use crate::error::{Error, Result};

/// Where the cart is persisted between sessions.
///
/// `load` returns an error for unreadable or corrupt data; the cart decides
/// what to do about it.
pub trait CartStore {
    /// Read the stored items. A missing entry is an empty cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the store can't be read or holds malformed data.
    fn load(&self) -> Result<Vec<CartItem>>;

    /// Replace the stored items.
    ///
    /// # Errors
    ///
    /// Returns an error if the items can't be written.
    fn save(&self, items: &[CartItem]) -> Result<()>;

    /// Remove the stored entry entirely.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry can't be removed.
    fn clear(&self) -> Result<()>;
}

fn decode(raw: Option<String>) -> Result<Vec<CartItem>> {
    match raw {
        Some(value) => Ok(serde_json::from_str(&value)?),
        None => Ok(Vec::new()),
    }
}

/// `SQLite`-backed cart store.
#[derive(Debug)]
pub struct SqliteCartStore {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
    /// Key the cart document is stored under.
    key: String,
}

impl SqliteCartStore {
    /// Open or create a store at the given path.
    ///
    /// Creates parent directories and initializes the schema as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>, key: impl Into<String>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening cart database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        info!("Cart database opened at {}", path.display());
        Ok(Self {
            path,
            conn,
            key: key.into(),
        })
    }

    /// Create an in-memory store.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory(key: impl Into<String>) -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
            key: key.into(),
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the storage key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the raw stored value for this store's key.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_raw(&self) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?1",
                [&self.key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Overwrite the raw stored value for this store's key.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn set_raw(&self, value: &str) -> Result<()> {
        self.conn.execute(
            r"
            INSERT INTO local_storage (key, value, updated_at)
            VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            ",
            (&self.key, value),
        )?;
        Ok(())
    }
}

impl CartStore for SqliteCartStore {
    fn load(&self) -> Result<Vec<CartItem>> {
        decode(self.get_raw()?)
    }

    fn save(&self, items: &[CartItem]) -> Result<()> {
        let value = serde_json::to_string(items)?;
        self.set_raw(&value)?;
        debug!("Saved {} cart item(s) under '{}'", items.len(), self.key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.conn
            .execute("DELETE FROM local_storage WHERE key = ?1", [&self.key])?;
        debug!("Removed cart entry '{}'", self.key);
        Ok(())
    }
}

/// In-memory cart store.
#[derive(Debug, Default)]
pub struct MemoryCartStore {
    raw: Mutex<Option<String>>,
}

impl MemoryCartStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding the given raw document.
    #[must_use]
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Mutex::new(Some(raw.into())),
        }
    }

    /// The raw stored document, if any.
    #[must_use]
    pub fn raw(&self) -> Option<String> {
        self.raw
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CartStore for MemoryCartStore {
    fn load(&self) -> Result<Vec<CartItem>> {
        decode(self.raw())
    }

    fn save(&self, items: &[CartItem]) -> Result<()> {
        let value = serde_json::to_string(items)?;
        *self.raw.lock().unwrap_or_else(PoisonError::into_inner) = Some(value);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.raw.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

impl<S: CartStore + ?Sized> CartStore for &S {
    fn load(&self) -> Result<Vec<CartItem>> {
        (**self).load()
    }

    fn save(&self, items: &[CartItem]) -> Result<()> {
        (**self).save(items)
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }
}
