use std::cell::RefCell;
use std::rc::Rc;

use crate::{remember, scope::current_scope};

#[derive(Clone)]
pub struct Dispose(Rc<RefCell<Option<Box<dyn FnOnce()>>>>);

impl Dispose {
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Rc::new(RefCell::new(Some(Box::new(f)))))
    }

    /// A handle with nothing to clean up.
    pub fn noop() -> Self {
        Self(Rc::new(RefCell::new(None)))
    }

    /// Runs at most once (safe to call multiple times).
    pub fn run(&self) {
        let f = self.0.borrow_mut().take();
        if let Some(f) = f {
            f()
        }
    }

    pub fn is_spent(&self) -> bool {
        self.0.borrow().is_none()
    }
}

/// Runs `f()` immediately and returns its `Dispose`.
pub fn effect<F>(f: F) -> Dispose
where
    F: FnOnce() -> Dispose + 'static,
{
    let d = f();

    // auto-register cleanup in the current scope if one exists
    if let Some(scope) = current_scope() {
        let d2 = d.clone();
        scope.add_disposer(move || d2.run());
    }

    d
}

/// Helper to register cleanup inside effect.
pub fn on_unmount(f: impl FnOnce() + 'static) -> Dispose {
    Dispose::new(f)
}

/// Runs `effect` on the first pass and again whenever `key` changes, running
/// the previous cleanup first. The last cleanup runs when the scope goes away.
pub fn disposable_effect<K: PartialEq + 'static>(key: K, effect: impl FnOnce() -> Dispose) {
    struct Slot<K> {
        key: RefCell<Option<K>>,
        cleanup: Rc<RefCell<Option<Dispose>>>,
    }

    let slot = remember(|| {
        let cleanup: Rc<RefCell<Option<Dispose>>> = Rc::new(RefCell::new(None));
        if let Some(scope) = current_scope() {
            let cleanup = cleanup.clone();
            scope.add_disposer(move || {
                let d = cleanup.borrow_mut().take();
                if let Some(d) = d {
                    d.run();
                }
            });
        }
        Slot {
            key: RefCell::new(None::<K>),
            cleanup,
        }
    });

    let changed = slot.key.borrow().as_ref() != Some(&key);
    if changed {
        *slot.key.borrow_mut() = Some(key);

        let previous = slot.cleanup.borrow_mut().take();
        if let Some(d) = previous {
            d.run();
        }

        let d = effect();
        *slot.cleanup.borrow_mut() = Some(d);
    }
}

/// runs on every recomposition
pub fn side_effect(effect: impl FnOnce()) {
    effect();
}
