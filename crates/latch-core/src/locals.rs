//! # Configuration locals
//!
//! Latch keeps hook configuration in thread‑local “composition locals”: a
//! stack of typed values that a subtree can override.
//!
//! - `HookConfig` — default debounce delay and the storage key namespace.
//! - any `Clone + 'static` value through `with_local` / `local`, which is how
//!   `latch-hooks` provides the storage backend and the task spawner.
//!
//! ```rust
//! use latch_core::*;
//! use web_time::Duration;
//!
//! let fast = HookConfig {
//!     debounce_delay: Duration::from_millis(50),
//!     ..HookConfig::default()
//! };
//!
//! with_hook_config(fast, || {
//!     assert_eq!(hook_config().debounce_delay, Duration::from_millis(50));
//! });
//! assert_eq!(hook_config().debounce_delay, Duration::from_millis(300));
//! ```

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;

use web_time::Duration;

thread_local! {
    static LOCALS_STACK: RefCell<Vec<HashMap<TypeId, Box<dyn Any>>>> = RefCell::new(Vec::new());
}

fn with_locals_frame<R>(f: impl FnOnce() -> R) -> R {
    // Non-panicking frame guard (ensures pop on unwind)
    struct Guard;
    impl Drop for Guard {
        fn drop(&mut self) {
            LOCALS_STACK.with(|st| {
                st.borrow_mut().pop();
            });
        }
    }
    LOCALS_STACK.with(|st| st.borrow_mut().push(HashMap::new()));
    let _guard = Guard;
    f()
}

fn set_local_boxed(t: TypeId, v: Box<dyn Any>) {
    LOCALS_STACK.with(|st| {
        let mut st = st.borrow_mut();
        if let Some(top) = st.last_mut() {
            top.insert(t, v);
        } else {
            // no frame: create a temporary one
            let mut m = HashMap::new();
            m.insert(t, v);
            st.push(m);
        }
    });
}

/// Provides `value` to everything `f` composes or calls.
pub fn with_local<T: Clone + 'static, R>(value: T, f: impl FnOnce() -> R) -> R {
    with_locals_frame(|| {
        set_local_boxed(TypeId::of::<T>(), Box::new(value));
        f()
    })
}

/// The innermost provided `T`, if any.
pub fn local<T: Clone + 'static>() -> Option<T> {
    LOCALS_STACK.with(|st| {
        for frame in st.borrow().iter().rev() {
            if let Some(v) = frame.get(&TypeId::of::<T>())
                && let Some(t) = v.downcast_ref::<T>()
            {
                return Some(t.clone());
            }
        }
        None
    })
}

/// Tunables shared by the hooks.
#[derive(Clone, Debug, PartialEq)]
pub struct HookConfig {
    /// Delay used by debounce hooks when the caller does not pass one.
    pub debounce_delay: Duration,
    /// Prefix for persisted keys: values are stored under `"{namespace}:{key}"`.
    pub storage_namespace: String,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            debounce_delay: Duration::from_millis(300),
            storage_namespace: "latch".to_string(),
        }
    }
}

pub fn with_hook_config<R>(config: HookConfig, f: impl FnOnce() -> R) -> R {
    with_local(config, f)
}

pub fn hook_config() -> HookConfig {
    local::<HookConfig>().unwrap_or_default()
}
