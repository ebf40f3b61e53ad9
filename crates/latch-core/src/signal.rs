use std::cell::RefCell;
use std::rc::Rc;

pub type SubId = usize;

/// Cloneable, observable value.
///
/// Subscribers run after every `set`/`update` and receive the new value. They
/// may read the signal, but writing or (un)subscribing from inside the
/// notification panics.
pub struct Signal<T: 'static>(Rc<RefCell<Inner<T>>>);

struct Inner<T> {
    value: T,
    subs: Vec<Option<Rc<dyn Fn(&T)>>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Signal<T> {
    pub fn new(value: T) -> Self {
        Self(Rc::new(RefCell::new(Inner {
            value,
            subs: Vec::new(),
        })))
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.0.borrow().value.clone()
    }

    /// Reads the value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.0.borrow().value)
    }

    pub fn set(&self, v: T) {
        self.0.borrow_mut().value = v;
        self.notify();
    }

    pub fn update<F: FnOnce(&mut T)>(&self, f: F) {
        f(&mut self.0.borrow_mut().value);
        self.notify();
    }

    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> SubId {
        let mut inner = self.0.borrow_mut();
        let f: Rc<dyn Fn(&T)> = Rc::new(f);
        // Ids of removed subscribers are handed out again.
        if let Some(id) = inner.subs.iter().position(Option::is_none) {
            inner.subs[id] = Some(f);
            return id;
        }
        inner.subs.push(Some(f));
        inner.subs.len() - 1
    }

    /// Removes a subscriber. Its id may be handed to a later `subscribe`.
    pub fn unsubscribe(&self, id: SubId) {
        if let Some(slot) = self.0.borrow_mut().subs.get_mut(id) {
            *slot = None;
        }
    }

    /// Length of the subscriber table, free slots included.
    pub fn subscriber_slots(&self) -> usize {
        self.0.borrow().subs.len()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn notify(&self) {
        let subs: Vec<Rc<dyn Fn(&T)>> = self.0.borrow().subs.iter().flatten().cloned().collect();
        for s in subs {
            let inner = self.0.borrow();
            s(&inner.value);
        }
    }
}

pub fn signal<T>(t: T) -> Signal<T> {
    Signal::new(t)
}
