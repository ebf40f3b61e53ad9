//! # Hooks
//!
//! Small, composable hooks on top of `latch-core`'s slot runtime:
//!
//! - `use_mutex_callback` — single-flight async callback; calls made while one
//!   is in flight are dropped.
//! - `use_debounce_callback` / `use_debounced_value` — collapse bursts.
//! - `use_local_storage` — state written through to a key-value backend.
//! - `use_static_ref` / `use_static_callback` — stable identity, latest value.
//! - `use_deps_changed` / `use_memo` — dependency-change detection.
//! - `use_async_callback` — async call with its outcome tracked in a `Signal`.
//!
//! Async hooks spawn onto the thread's spawner (`executor::set_spawner`), and
//! timers are delivered by `latch_core::clock::fire_due_timers`. A desktop
//! host typically does both once per frame:
//!
//! ```rust
//! use futures::executor::LocalPool;
//! use latch_core::{Recomposer, clock};
//! use latch_hooks::prelude::*;
//!
//! let mut pool = LocalPool::new();
//! set_spawner(pool.spawner());
//!
//! let mut root = Recomposer::new();
//! let submit = root.compose(|| {
//!     use_mutex_callback(|form: String| async move {
//!         log::info!("submitting {form}");
//!         Ok::<(), std::io::Error>(())
//!     })
//! });
//!
//! submit.call("a".into());
//! submit.call("b".into()); // dropped: "a" is still in flight
//! assert!(submit.is_busy());
//!
//! // frame
//! clock::fire_due_timers();
//! pool.run_until_stalled();
//! assert!(!submit.is_busy());
//! ```

pub mod async_callback;
pub mod debounce;
pub mod deps;
pub mod executor;
pub mod local_state;
pub mod mutex;
pub mod prelude;
pub mod static_ref;
pub mod storage;


pub use async_callback::{AsyncCallback, AsyncState, use_async_callback};
pub use debounce::{
    Debouncer, Edge, use_debounce_callback, use_debounce_callback_default, use_debounced_value,
};
pub use deps::{use_deps_changed, use_memo};
pub use local_state::{LocalState, use_local_storage};
pub use mutex::{GuardedInvoker, MutexCallback, Outcome, use_mutex_callback};
pub use static_ref::{StaticCallback, use_static_callback, use_static_ref};
pub use storage::{
    FileStorage, LocalStore, MemoryStorage, StorageBackend, StorageError, storage, with_storage,
};
