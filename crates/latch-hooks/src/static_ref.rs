//! Values and closures with a stable identity across recompositions.

use std::cell::RefCell;
use std::rc::Rc;

use latch_core::remember;

/// One cell per callsite, overwritten with `value` on every pass.
///
/// Closures created on an earlier pass can read the cell and always see the
/// latest value. Holding a borrow of the cell across a recomposition panics.
pub fn use_static_ref<T: 'static>(value: T) -> Rc<RefCell<T>> {
    let slot = remember(|| RefCell::new(None::<Rc<RefCell<T>>>));
    let mut slot = slot.borrow_mut();
    match slot.as_ref() {
        Some(cell) => {
            *cell.borrow_mut() = value;
            cell.clone()
        }
        None => {
            let cell = Rc::new(RefCell::new(value));
            *slot = Some(cell.clone());
            cell
        }
    }
}

/// A cloneable callable whose identity survives recomposition while its body
/// is replaced by the closure passed on the latest pass.
pub struct StaticCallback<A, R = ()> {
    latest: Rc<RefCell<Rc<dyn Fn(A) -> R>>>,
}

impl<A, R> Clone for StaticCallback<A, R> {
    fn clone(&self) -> Self {
        Self {
            latest: self.latest.clone(),
        }
    }
}

impl<A: 'static, R: 'static> StaticCallback<A, R> {
    pub fn new(f: impl Fn(A) -> R + 'static) -> Self {
        Self {
            latest: Rc::new(RefCell::new(Rc::new(f))),
        }
    }

    pub fn replace(&self, f: impl Fn(A) -> R + 'static) {
        *self.latest.borrow_mut() = Rc::new(f);
    }

    pub fn call(&self, args: A) -> R {
        // Clone out first: the body may re-enter and replace itself.
        let f = self.latest.borrow().clone();
        f(args)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.latest, &other.latest)
    }
}

pub fn use_static_callback<A: 'static, R: 'static>(
    f: impl Fn(A) -> R + 'static,
) -> StaticCallback<A, R> {
    let slot = remember(|| RefCell::new(None::<StaticCallback<A, R>>));
    let mut slot = slot.borrow_mut();
    match slot.as_ref() {
        Some(cb) => {
            cb.replace(f);
            cb.clone()
        }
        None => {
            let cb = StaticCallback::new(f);
            *slot = Some(cb.clone());
            cb
        }
    }
}
