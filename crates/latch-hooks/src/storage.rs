//! Persisted key-value storage.
//!
//! Backends store strings under string keys; [`LocalStore`] layers typed JSON
//! values and key namespacing on top. Which backend the hooks use is a
//! composition local: `with_storage` overrides it for a subtree and
//! `set_default_storage` replaces the thread default (an in-memory map, or the
//! browser's `localStorage` on `wasm32`).

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use latch_core::{local, with_local};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored value is not valid JSON for this type: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

pub trait StorageBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
}

/// Process-lifetime map. Clones share the same entries.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    items: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
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

/// All entries in one JSON object file, rewritten on every change.
pub struct FileStorage {
    path: PathBuf,
    items: RefCell<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Opens `path`, starting empty if the file does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let items = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        log::debug!("storage: opened {} ({} keys)", path.display(), items.len());
        Ok(Self {
            path,
            items: RefCell::new(items),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_back(&self) -> Result<()> {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir)?;
        }
        let raw = serde_json::to_string_pretty(&*self.items.borrow())?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl StorageBackend for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self.write_back()
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let removed = self.items.borrow_mut().remove(key);
        if removed.is_some() {
            self.write_back()?;
        }
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::WebStorage;

#[cfg(target_arch = "wasm32")]
mod web {
    use super::{Result, StorageBackend, StorageError};

    /// The browser's `window.localStorage`.
    pub struct WebStorage {
        storage: web_sys::Storage,
    }

    impl WebStorage {
        pub fn local() -> Result<Self> {
            let window = web_sys::window()
                .ok_or_else(|| StorageError::Unavailable("no window".into()))?;
            let storage = window
                .local_storage()
                .map_err(|e| StorageError::Unavailable(format!("{e:?}")))?
                .ok_or_else(|| StorageError::Unavailable("localStorage disabled".into()))?;
            Ok(Self { storage })
        }
    }

    impl StorageBackend for WebStorage {
        fn get_item(&self, key: &str) -> Result<Option<String>> {
            self.storage
                .get_item(key)
                .map_err(|e| StorageError::Unavailable(format!("{e:?}")))
        }

        fn set_item(&self, key: &str, value: &str) -> Result<()> {
            self.storage
                .set_item(key, value)
                .map_err(|e| StorageError::Unavailable(format!("{e:?}")))
        }

        fn remove_item(&self, key: &str) -> Result<()> {
            self.storage
                .remove_item(key)
                .map_err(|e| StorageError::Unavailable(format!("{e:?}")))
        }
    }
}

#[derive(Clone)]
struct StorageLocal(Rc<dyn StorageBackend>);

thread_local! {
    static DEFAULT_STORAGE: RefCell<Rc<dyn StorageBackend>> = RefCell::new(default_backend());
}

#[cfg(target_arch = "wasm32")]
fn default_backend() -> Rc<dyn StorageBackend> {
    match WebStorage::local() {
        Ok(web) => Rc::new(web),
        Err(e) => {
            log::warn!("storage: {e}; falling back to memory");
            Rc::new(MemoryStorage::new())
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn default_backend() -> Rc<dyn StorageBackend> {
    Rc::new(MemoryStorage::new())
}

pub fn set_default_storage(backend: Rc<dyn StorageBackend>) {
    DEFAULT_STORAGE.with(|s| *s.borrow_mut() = backend);
}

/// Uses `backend` for everything `f` composes.
pub fn with_storage<R>(backend: Rc<dyn StorageBackend>, f: impl FnOnce() -> R) -> R {
    with_local(StorageLocal(backend), f)
}

/// The backend in effect here.
pub fn storage() -> Rc<dyn StorageBackend> {
    match local::<StorageLocal>() {
        Some(StorageLocal(backend)) => backend,
        None => DEFAULT_STORAGE.with(|s| s.borrow().clone()),
    }
}

/// Typed JSON value under one namespaced key.
pub struct LocalStore<T> {
    backend: Rc<dyn StorageBackend>,
    key: String,
    _value: PhantomData<fn() -> T>,
}

impl<T> Clone for LocalStore<T> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            key: self.key.clone(),
            _value: PhantomData,
        }
    }
}

impl<T: Serialize + DeserializeOwned> LocalStore<T> {
    pub fn new(backend: Rc<dyn StorageBackend>, namespace: &str, key: &str) -> Self {
        let key = if namespace.is_empty() {
            key.to_string()
        } else {
            format!("{namespace}:{key}")
        };
        Self {
            backend,
            key,
            _value: PhantomData,
        }
    }

    /// The key as stored in the backend, namespace included.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn load(&self) -> Result<Option<T>> {
        match self.backend.get_item(&self.key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn save(&self, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.backend.set_item(&self.key, &raw)
    }

    pub fn clear(&self) -> Result<()> {
        self.backend.remove_item(&self.key)
    }
}
