pub use crate::async_callback::{AsyncCallback, AsyncState, use_async_callback};
pub use crate::debounce::{
    Debouncer, use_debounce_callback, use_debounce_callback_default, use_debounced_value,
};
pub use crate::deps::{use_deps_changed, use_memo};
pub use crate::executor::{set_spawner, spawn_local, with_spawner};
pub use crate::local_state::{LocalState, use_local_storage};
pub use crate::mutex::{GuardedInvoker, MutexCallback, use_mutex_callback};
pub use crate::static_ref::{StaticCallback, use_static_callback, use_static_ref};
pub use crate::storage::{
    FileStorage, MemoryStorage, StorageBackend, set_default_storage, storage, with_storage,
};
