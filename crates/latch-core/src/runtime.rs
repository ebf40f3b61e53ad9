use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::scope::Scope;

thread_local! {
    pub static COMPOSER: RefCell<Composer> = RefCell::new(Composer::default());
}

/// Slot table for one composition root.
#[derive(Default)]
pub struct Composer {
    pub slots: Vec<Box<dyn Any>>,
    pub cursor: usize,
    pub keyed_slots: HashMap<String, Box<dyn Any>>,
    /// Scope that outlives passes; `remember` initializers run inside it.
    pub root: Option<Scope>,
}

impl Composer {
    pub fn clear(&mut self) {
        self.slots.clear();
        self.keyed_slots.clear();
        self.cursor = 0;
    }
}

// Placeholder held by a slot while its initializer runs.
struct Reserved;

// Disposers registered by an initializer belong to the slot, not to the pass.
fn init_in_root<T>(init: impl FnOnce() -> T) -> T {
    let root = COMPOSER.with(|c| c.borrow().root.clone());
    match root {
        Some(scope) => scope.run(init),
        None => init(),
    }
}

/// Installs a root's slot table as the thread's active composer for one pass.
///
/// The previous table is swapped back in on drop, including on unwind.
pub struct ComposeGuard<'a> {
    table: &'a mut Composer,
}

impl<'a> ComposeGuard<'a> {
    pub fn begin(table: &'a mut Composer) -> Self {
        COMPOSER.with(|c| {
            let mut c = c.borrow_mut();
            std::mem::swap(&mut *c, table);
            c.cursor = 0;
        });
        ComposeGuard { table }
    }
}

impl Drop for ComposeGuard<'_> {
    fn drop(&mut self) {
        COMPOSER.with(|c| {
            std::mem::swap(&mut *c.borrow_mut(), self.table);
        });
    }
}

/// Slot-based remember (sequential composition only)
///
/// `init` runs without the slot table borrowed, so it may use
/// `remember_with_key`; a positional `remember` inside `init` would shift the
/// slots of later passes.
pub fn remember<T: 'static>(init: impl FnOnce() -> T) -> Rc<T> {
    let cursor = COMPOSER.with(|c| {
        let mut c = c.borrow_mut();
        let cursor = c.cursor;
        c.cursor += 1;

        if cursor >= c.slots.len() {
            c.slots.push(Box::new(Reserved));
            return Err(cursor);
        }

        if let Some(rc) = c.slots[cursor].downcast_ref::<Rc<T>>() {
            Ok(rc.clone())
        } else {
            if !c.slots[cursor].is::<Reserved>() {
                log::warn!(
                    "remember: slot {} type changed; replacing. \
                     If this is due to conditional composition, prefer remember_with_key.",
                    cursor
                );
            }
            Err(cursor)
        }
    });

    match cursor {
        Ok(rc) => rc,
        Err(cursor) => {
            let rc: Rc<T> = Rc::new(init_in_root(init));
            COMPOSER.with(|c| {
                let mut c = c.borrow_mut();
                if cursor < c.slots.len() {
                    c.slots[cursor] = Box::new(rc.clone());
                }
            });
            rc
        }
    }
}

/// Key-based remember
pub fn remember_with_key<T: 'static>(key: impl Into<String>, init: impl FnOnce() -> T) -> Rc<T> {
    let key = key.into();
    let existing = COMPOSER.with(|c| {
        let c = c.borrow();
        let slot = c.keyed_slots.get(&key)?;
        let rc = slot.downcast_ref::<Rc<T>>().cloned();
        if rc.is_none() {
            log::warn!(
                "remember_with_key: key '{}' reused with a different type; replacing.",
                key
            );
        }
        rc
    });
    if let Some(rc) = existing {
        return rc;
    }

    let rc: Rc<T> = Rc::new(init_in_root(init));
    COMPOSER.with(|c| {
        c.borrow_mut().keyed_slots.insert(key, Box::new(rc.clone()));
    });
    rc
}

pub fn remember_state<T: 'static>(init: impl FnOnce() -> T) -> Rc<RefCell<T>> {
    remember(|| RefCell::new(init()))
}

pub fn remember_state_with_key<T: 'static>(
    key: impl Into<String>,
    init: impl FnOnce() -> T,
) -> Rc<RefCell<T>> {
    remember_with_key(key, || RefCell::new(init()))
}

/// Drops every slot of the thread's active composer.
pub fn reset_composition() {
    COMPOSER.with(|c| c.borrow_mut().clear());
}

/// One composition root: its own slot table and a root `Scope` that outlives
/// individual passes.
///
/// Each pass runs in a fresh child scope. Effects registered by a pass are
/// cleaned up when the next pass starts; disposers registered from a
/// `remember` initializer stay with the root until `dispose`.
///
/// ```rust
/// use latch_core::*;
///
/// let mut root = Recomposer::new();
/// let first = root.compose(|| remember(|| 7));
/// let again = root.compose(|| remember(|| 8));
/// assert_eq!(*again, 7);
/// assert!(std::rc::Rc::ptr_eq(&first, &again));
/// root.dispose();
/// ```
pub struct Recomposer {
    table: Composer,
    scope: Scope,
    pass: Option<Scope>,
    passes: u64,
}

impl Default for Recomposer {
    fn default() -> Self {
        Self::new()
    }
}

impl Recomposer {
    pub fn new() -> Self {
        let scope = Scope::new();
        Self {
            table: Composer {
                root: Some(scope.clone()),
                ..Composer::default()
            },
            scope,
            pass: None,
            passes: 0,
        }
    }

    /// Runs `build` as one composition pass over this root's slots.
    pub fn compose<R>(&mut self, build: impl FnOnce() -> R) -> R {
        if let Some(previous) = self.pass.take() {
            previous.dispose();
        }
        let pass = self.scope.child();
        self.pass = Some(pass.clone());
        let out = {
            let _guard = ComposeGuard::begin(&mut self.table);
            pass.run(build)
        };
        self.passes += 1;
        log::trace!("compose: pass {} finished", self.passes);
        out
    }

    pub fn passes(&self) -> u64 {
        self.passes
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Unmounts the root: runs the last pass's cleanups, then the root's, and
    /// drops the remembered values.
    pub fn dispose(mut self) {
        self.pass = None;
        self.scope.clone().dispose();
        self.table.clear();
    }
}
