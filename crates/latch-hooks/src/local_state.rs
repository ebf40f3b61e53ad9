use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use latch_core::{Signal, hook_config, remember_with_key, signal};

use crate::storage::{LocalStore, storage};

/// State that survives restarts: an in-memory signal written through to the
/// storage backend.
///
/// Writes are last-write-wins on the key. A failed write is logged and the
/// in-memory value is kept.
pub struct LocalState<T: 'static> {
    store: LocalStore<T>,
    value: Signal<T>,
    default: Rc<dyn Fn() -> T>,
}

impl<T> Clone for LocalState<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            value: self.value.clone(),
            default: self.default.clone(),
        }
    }
}

impl<T> LocalState<T>
where
    T: Serialize + DeserializeOwned + Clone + 'static,
{
    /// Loads the stored value, falling back to `default` when the key is
    /// missing or holds something that no longer parses.
    pub fn load(store: LocalStore<T>, default: impl Fn() -> T + 'static) -> Self {
        let initial = match store.load() {
            Ok(Some(v)) => v,
            Ok(None) => default(),
            Err(e) => {
                log::warn!("local_storage: ignoring stored '{}': {e}", store.key());
                default()
            }
        };
        Self {
            store,
            value: signal(initial),
            default: Rc::new(default),
        }
    }

    pub fn get(&self) -> T {
        self.value.get()
    }

    pub fn set(&self, value: T) {
        self.persist(&value);
        self.value.set(value);
    }

    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.value.update(f);
        let value = self.value.get();
        self.persist(&value);
    }

    /// Deletes the key and goes back to the default value.
    pub fn remove(&self) {
        if let Err(e) = self.store.clear() {
            log::warn!("local_storage: could not remove '{}': {e}", self.store.key());
        }
        self.value.set((self.default)());
    }

    pub fn signal(&self) -> Signal<T> {
        self.value.clone()
    }

    pub fn key(&self) -> &str {
        self.store.key()
    }

    fn persist(&self, value: &T) {
        if let Err(e) = self.store.save(value) {
            log::warn!("local_storage: could not persist '{}': {e}", self.store.key());
        }
    }
}

/// Persisted state for `key`, shared by every use of the same stored key and
/// backend within one composition root.
///
/// ```rust
/// use latch_core::Recomposer;
/// use latch_hooks::use_local_storage;
///
/// let mut root = Recomposer::new();
/// let theme = root.compose(|| use_local_storage("theme", || "dark".to_string()));
/// theme.set("light".to_string());
///
/// // A fresh root reads the value back from the thread's default storage.
/// let mut next = Recomposer::new();
/// let theme = next.compose(|| use_local_storage("theme", || "dark".to_string()));
/// assert_eq!(theme.get(), "light");
/// ```
pub fn use_local_storage<T>(key: &str, default: impl Fn() -> T + 'static) -> LocalState<T>
where
    T: Serialize + DeserializeOwned + Clone + 'static,
{
    let backend = storage();
    let identity = Rc::as_ptr(&backend).cast::<()>();
    let store = LocalStore::new(backend, &hook_config().storage_namespace, key);
    let slot = format!("local_storage:{identity:p}:{}", store.key());
    let state = remember_with_key(slot, || LocalState::load(store, default));
    (*state).clone()
}
