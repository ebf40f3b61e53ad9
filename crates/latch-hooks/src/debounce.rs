//! Debounced callbacks.
//!
//! A [`Debouncer`] collapses a burst of calls into one. In trailing mode (the
//! default) the callback runs with the *last* arguments once `delay` has
//! passed without a new call; in leading mode it runs with the *first*
//! arguments right away and ignores the rest of the burst.
//!
//! Timing goes through `latch_core::clock`: each call arms a timer, and the
//! host's `fire_due_timers()` delivers it. `poll()` can be used instead of (or
//! next to) timers by hosts that prefer to check once per frame.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use latch_core::clock::{self, TimerId};
use latch_core::{Signal, current_scope, hook_config, remember, signal};
use web_time::{Duration, Instant};

use crate::static_ref::use_static_callback;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    Leading,
    Trailing,
}

struct State<A> {
    delay: Duration,
    pending: Option<A>,
    // End of the current quiet window; None when idle.
    deadline: Option<Instant>,
    timer: Option<TimerId>,
}

struct Inner<A> {
    edge: Edge,
    state: RefCell<State<A>>,
    callback: Rc<dyn Fn(A)>,
}

/// Cheap, cloneable handle; clones share the same pending call.
pub struct Debouncer<A: 'static>(Rc<Inner<A>>);

impl<A> Clone for Debouncer<A> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<A: 'static> Debouncer<A> {
    pub fn trailing(delay: Duration, f: impl Fn(A) + 'static) -> Self {
        Self::with_edge(Edge::Trailing, delay, f)
    }

    pub fn leading(delay: Duration, f: impl Fn(A) + 'static) -> Self {
        Self::with_edge(Edge::Leading, delay, f)
    }

    pub fn with_edge(edge: Edge, delay: Duration, f: impl Fn(A) + 'static) -> Self {
        Self(Rc::new(Inner {
            edge,
            state: RefCell::new(State {
                delay,
                pending: None,
                deadline: None,
                timer: None,
            }),
            callback: Rc::new(f),
        }))
    }

    pub fn edge(&self) -> Edge {
        self.0.edge
    }

    pub fn delay(&self) -> Duration {
        self.0.state.borrow().delay
    }

    /// Applies to windows opened after this call.
    pub fn set_delay(&self, delay: Duration) {
        self.0.state.borrow_mut().delay = delay;
    }

    pub fn call(&self, args: A) {
        let now = clock::now();
        let fire_now = {
            let mut st = self.0.state.borrow_mut();
            let window_open = st.deadline.is_some_and(|d| now < d);
            let deadline = now + st.delay;
            st.deadline = Some(deadline);
            self.rearm(&mut st, deadline);

            match self.0.edge {
                Edge::Trailing => {
                    st.pending = Some(args);
                    None
                }
                Edge::Leading if window_open => None,
                Edge::Leading => Some(args),
            }
        };
        if let Some(args) = fire_now {
            (self.0.callback)(args);
        }
    }

    /// Fires the pending call if its window has passed. Returns whether the
    /// callback ran.
    pub fn poll(&self) -> bool {
        let now = clock::now();
        let due = {
            let mut st = self.0.state.borrow_mut();
            match st.deadline {
                Some(d) if now >= d => {
                    st.deadline = None;
                    if let Some(id) = st.timer.take() {
                        clock::cancel_timer(id);
                    }
                    st.pending.take()
                }
                _ => None,
            }
        };
        match due {
            Some(args) => {
                (self.0.callback)(args);
                true
            }
            None => false,
        }
    }

    /// Runs the pending call now, if any.
    pub fn flush(&self) -> bool {
        let due = {
            let mut st = self.0.state.borrow_mut();
            self.disarm(&mut st);
            st.pending.take()
        };
        match due {
            Some(args) => {
                (self.0.callback)(args);
                true
            }
            None => false,
        }
    }

    /// Drops the pending call without running it.
    pub fn cancel(&self) {
        let dropped = {
            let mut st = self.0.state.borrow_mut();
            self.disarm(&mut st);
            st.pending.take()
        };
        if dropped.is_some() {
            log::trace!("debounce: pending call cancelled");
        }
    }

    pub fn is_pending(&self) -> bool {
        self.0.state.borrow().pending.is_some()
    }

    fn rearm(&self, st: &mut State<A>, deadline: Instant) {
        if let Some(id) = st.timer.take() {
            clock::cancel_timer(id);
        }
        let weak: Weak<Inner<A>> = Rc::downgrade(&self.0);
        st.timer = Some(clock::schedule_at(deadline, move || {
            if let Some(inner) = weak.upgrade() {
                let this = Debouncer(inner);
                this.0.state.borrow_mut().timer = None;
                this.poll();
            }
        }));
    }

    fn disarm(&self, st: &mut State<A>) {
        st.deadline = None;
        if let Some(id) = st.timer.take() {
            clock::cancel_timer(id);
        }
    }
}

impl<A> Drop for Inner<A> {
    fn drop(&mut self) {
        if let Some(id) = self.state.get_mut().timer.take() {
            clock::cancel_timer(id);
        }
    }
}

/// Remembers a trailing debouncer for this callsite.
///
/// Calls always reach the closure passed on the latest pass. A pending call is
/// cancelled when the owning scope is disposed.
pub fn use_debounce_callback<A: 'static>(
    delay: Duration,
    f: impl Fn(A) + 'static,
) -> Debouncer<A> {
    let latest = use_static_callback(f);
    let debouncer = remember(move || {
        let d = Debouncer::trailing(delay, move |args| latest.call(args));
        if let Some(scope) = current_scope() {
            let d = d.clone();
            scope.add_disposer(move || d.cancel());
        }
        d
    });
    if debouncer.delay() != delay {
        debouncer.set_delay(delay);
    }
    (*debouncer).clone()
}

/// [`use_debounce_callback`] with `HookConfig::debounce_delay`.
pub fn use_debounce_callback_default<A: 'static>(f: impl Fn(A) + 'static) -> Debouncer<A> {
    use_debounce_callback(hook_config().debounce_delay, f)
}

/// The last `value` that stayed unchanged for `delay`.
///
/// The first pass returns `value` itself. Later changes show up once the
/// window passes and the host fires timers (or on the next pass after that).
pub fn use_debounced_value<T>(value: T, delay: Duration) -> T
where
    T: Clone + PartialEq + 'static,
{
    struct Slot<T: 'static> {
        settled: Signal<T>,
        last_seen: RefCell<T>,
        debouncer: Debouncer<T>,
    }

    let slot = remember(|| {
        let settled = signal(value.clone());
        let debouncer = Debouncer::trailing(delay, {
            let settled = settled.clone();
            move |v| settled.set(v)
        });
        Slot {
            settled,
            last_seen: RefCell::new(value.clone()),
            debouncer,
        }
    });

    slot.debouncer.set_delay(delay);
    let changed = *slot.last_seen.borrow() != value;
    if changed {
        *slot.last_seen.borrow_mut() = value.clone();
        slot.debouncer.call(value);
    } else {
        slot.debouncer.poll();
    }
    slot.settled.get()
}
