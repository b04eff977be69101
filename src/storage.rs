//! Local key-value persistence.
//!
//! Values are written as `{"data": <value>}` so a reader can tell a stored
//! value apart from whatever else might be sitting under the same key.
//! [`LocalStore::load`] treats anything it cannot read back as absent.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::app_dirs::AppDirs;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("stored value is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid storage key `{0}`")]
    InvalidKey(String),
}

/// Raw string storage, in the shape of the browser's `localStorage`.
pub trait StorageBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
}

/// In-memory backend. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn with_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// The per-user data directory, or the working directory as a last resort.
    pub fn default_location() -> Self {
        Self::with_dir(AppDirs::data_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl StorageBackend for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;
        fs::write(path, value)?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)?) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T: ?Sized> {
    data: &'a T,
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

/// Typed `store`/`load` on top of a [`StorageBackend`].
#[derive(Debug, Clone)]
pub struct LocalStore<B: StorageBackend> {
    backend: B,
}

impl<B: StorageBackend> LocalStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn store<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(&EnvelopeRef { data: value })?;
        self.backend.set_item(key, &raw)
    }

    /// The stored value, or `None` if it is missing or unreadable.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.try_load(key) {
            Ok(value) => value,
            Err(e) => {
                debug!(key, error = %e, "ignoring unreadable stored value");
                None
            }
        }
    }

    /// Like [`LocalStore::load`], but says why a present value was rejected.
    pub fn try_load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.backend.get_item(key)? else {
            return Ok(None);
        };
        let envelope: Envelope<T> = serde_json::from_str(&raw)?;
        Ok(Some(envelope.data))
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        self.backend.remove_item(key)
    }
}

/// A value mirrored to storage: read once on creation, written on every change.
#[derive(Debug)]
pub struct PersistentValue<T, B: StorageBackend> {
    key: String,
    value: T,
    store: LocalStore<B>,
}

impl<T, B> PersistentValue<T, B>
where
    T: Serialize + DeserializeOwned,
    B: StorageBackend,
{
    pub fn new(store: LocalStore<B>, key: impl Into<String>, fallback: T) -> Self {
        let key = key.into();
        let value = store.load(&key).unwrap_or(fallback);
        Self { key, value, store }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn set(&mut self, value: T) -> Result<()> {
        self.value = value;
        self.flush()
    }

    pub fn update(&mut self, f: impl FnOnce(&mut T)) -> Result<()> {
        f(&mut self.value);
        self.flush()
    }

    fn flush(&self) -> Result<()> {
        self.store.store(&self.key, &self.value)
    }
}
