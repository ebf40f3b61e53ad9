//! Time source and frame-driven timers.
//!
//! Hooks never read the wall clock directly; they go through [`now`], which the
//! host (or a test) can replace with [`set_clock`]. Timers are kept in a
//! thread-local queue and fire when the host calls [`fire_due_timers`], usually
//! once per frame.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use web_time::{Duration, Instant};

pub trait Clock: 'static {
    fn now(&self) -> Instant;
}

pub struct SystemClock;
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A shared clock you can drive deterministically.
#[derive(Clone)]
pub struct ManualClock {
    t: Rc<Cell<Instant>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Instant::now())
    }
}

impl ManualClock {
    pub fn new(start: Instant) -> Self {
        Self {
            t: Rc::new(Cell::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.t.set(self.t.get() + by);
    }

    pub fn set(&self, t: Instant) {
        self.t.set(t);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.t.get()
    }
}

thread_local! {
    static CLOCK: RefCell<Option<Rc<dyn Clock>>> = const { RefCell::new(None) };
    static TIMERS: RefCell<TimerQueue> = RefCell::new(TimerQueue::default());
}

/// Install the clock for the current thread. Without one, `now()` uses the
/// system clock.
pub fn set_clock(clock: Rc<dyn Clock>) {
    CLOCK.with(|c| *c.borrow_mut() = Some(clock));
}

pub fn clear_clock() {
    CLOCK.with(|c| *c.borrow_mut() = None);
}

pub fn now() -> Instant {
    let clock = CLOCK.with(|c| c.borrow().clone());
    match clock {
        Some(c) => c.now(),
        None => Instant::now(),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

enum Entry {
    Wake(Waker),
    Call(Box<dyn FnOnce()>),
}

#[derive(Default)]
struct TimerQueue {
    next_id: u64,
    entries: BTreeMap<(Instant, TimerId), Entry>,
    deadlines: HashMap<TimerId, Instant>,
}

impl TimerQueue {
    fn insert(&mut self, deadline: Instant, entry: Entry) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.entries.insert((deadline, id), entry);
        self.deadlines.insert(id, deadline);
        id
    }

    fn remove(&mut self, id: TimerId) -> bool {
        match self.deadlines.remove(&id) {
            Some(deadline) => self.entries.remove(&(deadline, id)).is_some(),
            None => false,
        }
    }

    // Earliest entry that is due and was scheduled before `cutoff`.
    fn pop_due(&mut self, now: Instant, cutoff: u64) -> Option<Entry> {
        let key = *self
            .entries
            .range(..=(now, TimerId(u64::MAX)))
            .map(|(k, _)| k)
            .find(|(_, id)| id.0 < cutoff)?;
        self.deadlines.remove(&key.1);
        self.entries.remove(&key)
    }
}

/// Runs `f` once `now()` has reached `deadline` and the host fires timers.
pub fn schedule_at(deadline: Instant, f: impl FnOnce() + 'static) -> TimerId {
    TIMERS.with(|t| t.borrow_mut().insert(deadline, Entry::Call(Box::new(f))))
}

pub fn schedule(after: Duration, f: impl FnOnce() + 'static) -> TimerId {
    schedule_at(now() + after, f)
}

/// Returns false if the timer already fired or was cancelled.
pub fn cancel_timer(id: TimerId) -> bool {
    // The queue may already be gone during thread teardown.
    TIMERS
        .try_with(|t| t.borrow_mut().remove(id))
        .unwrap_or(false)
}

pub fn next_deadline() -> Option<Instant> {
    TIMERS.with(|t| t.borrow().entries.keys().next().map(|(d, _)| *d))
}

pub fn pending_timers() -> usize {
    TIMERS.with(|t| t.borrow().entries.len())
}

/// Fires every timer whose deadline has passed, in deadline order, and returns
/// how many fired. Timers scheduled by the callbacks themselves wait for the
/// next call.
pub fn fire_due_timers() -> usize {
    let now = now();
    let cutoff = TIMERS.with(|t| t.borrow().next_id);
    let mut fired = 0;
    loop {
        let entry = TIMERS.with(|t| t.borrow_mut().pop_due(now, cutoff));
        match entry {
            Some(Entry::Wake(w)) => w.wake(),
            Some(Entry::Call(f)) => f(),
            None => break,
        }
        fired += 1;
    }
    if fired > 0 {
        log::trace!("timers: fired {fired}");
    }
    fired
}

/// Future that completes once `now()` reaches its deadline.
///
/// It is woken through the timer queue, so the host must keep calling
/// [`fire_due_timers`] for it to make progress.
pub struct Sleep {
    deadline: Instant,
    timer: Option<TimerId>,
}

pub fn sleep(d: Duration) -> Sleep {
    sleep_until(now() + d)
}

pub fn sleep_until(deadline: Instant) -> Sleep {
    Sleep {
        deadline,
        timer: None,
    }
}

impl Sleep {
    pub fn deadline(&self) -> Instant {
        self.deadline
    }
}

impl Future for Sleep {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if let Some(id) = self.timer.take() {
            cancel_timer(id);
        }
        if now() >= self.deadline {
            return Poll::Ready(());
        }
        let deadline = self.deadline;
        let waker = cx.waker().clone();
        self.timer = Some(TIMERS.with(|t| t.borrow_mut().insert(deadline, Entry::Wake(waker))));
        Poll::Pending
    }
}

impl Drop for Sleep {
    fn drop(&mut self) {
        if let Some(id) = self.timer.take() {
            cancel_timer(id);
        }
    }
}
