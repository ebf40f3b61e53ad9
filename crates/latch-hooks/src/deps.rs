//! Dependency-change detection.

use std::cell::RefCell;
use std::rc::Rc;

use latch_core::remember;

/// True on the first pass and on every pass where `deps` differs from the
/// previous one.
pub fn use_deps_changed<D: PartialEq + 'static>(deps: D) -> bool {
    let last = remember(|| RefCell::new(None::<D>));
    let mut last = last.borrow_mut();
    let changed = last.as_ref() != Some(&deps);
    if changed {
        *last = Some(deps);
    }
    changed
}

/// Recomputes only when `deps` change.
pub fn use_memo<D, T>(deps: D, compute: impl FnOnce(&D) -> T) -> Rc<T>
where
    D: PartialEq + 'static,
    T: 'static,
{
    let slot = remember(|| RefCell::new(None::<(D, Rc<T>)>));
    let mut slot = slot.borrow_mut();
    if let Some((last, value)) = slot.as_ref()
        && *last == deps
    {
        return value.clone();
    }
    let value = Rc::new(compute(&deps));
    *slot = Some((deps, value.clone()));
    value
}
