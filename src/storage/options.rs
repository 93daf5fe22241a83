//! OptionStore trait: the host's key-value option table
//!
//! Values are JSON documents. Each entry also carries an `autoload` flag that
//! hosts use to decide whether to preload the option on every request; the
//! pilot stores its entry with `autoload = false`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use sled::transaction::{ConflictableTransactionError, TransactionError, Transactional};

/// Option storage errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("storage lock poisoned: {0}")]
    Poisoned(String),
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        StorageError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Trait for the host's persistent option table
///
/// Implementations must be thread-safe and must apply `set_option` atomically:
/// a reader either sees the previous value or the new one, never a mix.
pub trait OptionStore: Send + Sync {
    /// Read an option, `None` if it was never set
    fn get_option(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError>;

    /// Write an option.
    ///
    /// Returns `Ok(false)` when the stored value was already identical.
    fn set_option(
        &self,
        key: &str,
        value: &serde_json::Value,
        autoload: bool,
    ) -> Result<bool, StorageError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

// ============================================================================
// Sled backend
// ============================================================================

const OPTIONS_TREE: &str = "options";
const AUTOLOAD_TREE: &str = "options_autoload";

/// Durable option store on a sled database
///
/// Values live in the `options` tree and autoload flags in
/// `options_autoload`. Both are written in one sled transaction.
#[derive(Clone)]
pub struct SledOptionStore {
    db: Arc<sled::Db>,
    options: sled::Tree,
    autoload: sled::Tree,
}

impl SledOptionStore {
    /// Open or create the option store at the specified path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path_ref = path.as_ref();
        let db = sled::open(path_ref)?;
        let options = db.open_tree(OPTIONS_TREE)?;
        let autoload = db.open_tree(AUTOLOAD_TREE)?;

        tracing::info!(path = ?path_ref, "Option store opened");

        Ok(Self {
            db: Arc::new(db),
            options,
            autoload,
        })
    }

    /// Autoload flag recorded for `key`, `None` if the option was never set
    pub fn autoload(&self, key: &str) -> Result<Option<bool>, StorageError> {
        Ok(self
            .autoload
            .get(key.as_bytes())?
            .map(|flag| flag.first().copied() == Some(1)))
    }
}

impl OptionStore for SledOptionStore {
    fn get_option(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError> {
        match self.options.get(key.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn set_option(
        &self,
        key: &str,
        value: &serde_json::Value,
        autoload: bool,
    ) -> Result<bool, StorageError> {
        let bytes = serde_json::to_vec(value)?;

        if let Some(existing) = self.options.get(key.as_bytes())? {
            if existing.as_ref() == bytes.as_slice() && self.autoload(key)? == Some(autoload) {
                return Ok(false);
            }
        }

        let flag = [u8::from(autoload)];
        (&self.options, &self.autoload)
            .transaction(|(options, autoload_tree)| {
                options.insert(key.as_bytes(), bytes.as_slice())?;
                autoload_tree.insert(key.as_bytes(), &flag[..])?;
                Ok::<_, ConflictableTransactionError<()>>(())
            })
            .map_err(|e| match e {
                TransactionError::Storage(err) => StorageError::from(err),
                TransactionError::Abort(()) => {
                    StorageError::Database(format!("write of option {key} aborted"))
                }
            })?;

        self.db.flush()?;

        tracing::debug!(key, bytes = bytes.len(), autoload, "Option written");

        Ok(true)
    }

    fn backend_name(&self) -> &'static str {
        "sled"
    }
}

// ============================================================================
// In-memory backend
// ============================================================================

/// In-memory option store for testing and minimal deployments
///
/// Thread-safe via `RwLock`. Not durable: data lost on restart.
#[derive(Default)]
pub struct InMemoryOptionStore {
    entries: RwLock<HashMap<String, (serde_json::Value, bool)>>,
}

impl InMemoryOptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Autoload flag recorded for `key`, `None` if the option was never set
    pub fn autoload(&self, key: &str) -> Result<Option<bool>, StorageError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| StorageError::Poisoned(e.to_string()))?;

        Ok(entries.get(key).map(|(_, autoload)| *autoload))
    }
}

impl OptionStore for InMemoryOptionStore {
    fn get_option(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| StorageError::Poisoned(e.to_string()))?;

        Ok(entries.get(key).map(|(value, _)| value.clone()))
    }

    fn set_option(
        &self,
        key: &str,
        value: &serde_json::Value,
        autoload: bool,
    ) -> Result<bool, StorageError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| StorageError::Poisoned(e.to_string()))?;

        let entry = (value.clone(), autoload);
        if entries.get(key) == Some(&entry) {
            return Ok(false);
        }

        entries.insert(key.to_string(), entry);
        Ok(true)
    }

    fn backend_name(&self) -> &'static str {
        "in-memory"
    }
}
