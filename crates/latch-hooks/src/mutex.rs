//! Single-flight guard for async callbacks.
//!
//! A [`GuardedInvoker`] wraps an async operation and lets at most one call of
//! it be in flight. Calls made while one is running are dropped, not queued:
//! the typical use is a submit button that must not fire twice while the
//! request is pending.
//!
//! ```rust
//! use latch_hooks::mutex::GuardedInvoker;
//!
//! let save = GuardedInvoker::new(|doc: String| async move { doc.len() });
//!
//! let first = save.try_call("draft".to_string()).unwrap();
//! assert!(save.is_locked());
//! assert!(save.try_call("again".to_string()).is_none());
//!
//! assert_eq!(pollster::block_on(first), 5);
//! assert!(!save.is_locked());
//! ```

use std::borrow::Cow;
use std::cell::Cell;
use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, ready};

use futures::future::{FutureExt, LocalBoxFuture};
use futures::task::LocalSpawn;

use latch_core::remember;

use crate::executor;
use crate::static_ref::use_static_callback;

/// How a finished fire-and-forget call reports its result.
pub trait Outcome {
    fn report(self, name: &str);
}

impl Outcome for () {
    fn report(self, _name: &str) {}
}

impl<T, E: Display> Outcome for Result<T, E> {
    fn report(self, name: &str) {
        if let Err(e) = self {
            log::error!("{name}: guarded call failed: {e}");
        }
    }
}

/// Holds the lock for one accepted call; releases it when dropped.
struct LockGuard {
    lock: Rc<Cell<bool>>,
}

impl LockGuard {
    fn acquire(lock: &Rc<Cell<bool>>) -> Option<Self> {
        if lock.replace(true) {
            return None;
        }
        Some(Self { lock: lock.clone() })
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.lock.set(false);
    }
}

pub struct GuardedInvoker<F> {
    lock: Rc<Cell<bool>>,
    f: F,
    name: Cow<'static, str>,
}

impl<F> GuardedInvoker<F> {
    pub fn new(f: F) -> Self {
        Self {
            lock: Rc::new(Cell::new(false)),
            f,
            name: Cow::Borrowed("guarded"),
        }
    }

    /// Name used in log lines.
    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_locked(&self) -> bool {
        self.lock.get()
    }

    /// Starts a call unless one is in flight.
    ///
    /// The lock is taken before this returns, so a second `try_call` in the
    /// same turn already sees it. It is released when the returned future
    /// completes or is dropped, whichever comes first. `None` means the call
    /// was dropped and the wrapped function was not called.
    pub fn try_call<A, Fut>(&self, args: A) -> Option<Guarded<Fut>>
    where
        F: Fn(A) -> Fut,
        Fut: Future,
    {
        let Some(guard) = LockGuard::acquire(&self.lock) else {
            log::debug!("{}: call in flight; dropping", self.name);
            return None;
        };
        let fut = (self.f)(args);
        Some(Guarded {
            fut: Box::pin(fut),
            guard: Some(guard),
        })
    }

    /// Fire-and-forget: starts a call on the thread's spawner unless one is in
    /// flight. An `Err` outcome is logged. Without a spawner the call is
    /// dropped before the wrapped function runs.
    pub fn invoke<A, Fut>(&self, args: A)
    where
        F: Fn(A) -> Fut,
        Fut: Future + 'static,
        Fut::Output: Outcome,
    {
        if !executor::has_spawner() {
            log::error!("{}: no spawner installed; dropping call", self.name);
            return;
        }
        if let Some(call) = self.try_call(args) {
            let task = report_when_done(call, self.name.clone().into_owned());
            if let Err(e) = executor::spawn_local(task) {
                log::error!("{}: could not spawn call: {e}", self.name);
            }
        }
    }

    /// Like [`invoke`](Self::invoke), on an explicit spawner.
    pub fn invoke_on<A, Fut>(&self, args: A, spawner: &(impl LocalSpawn + ?Sized))
    where
        F: Fn(A) -> Fut,
        Fut: Future + 'static,
        Fut::Output: Outcome,
    {
        if let Some(call) = self.try_call(args) {
            let task = report_when_done(call, self.name.clone().into_owned());
            if let Err(e) = executor::spawn_on(spawner, task) {
                log::error!("{}: could not spawn call: {e}", self.name);
            }
        }
    }
}

async fn report_when_done<Fut>(call: Guarded<Fut>, name: String)
where
    Fut: Future,
    Fut::Output: Outcome,
{
    call.await.report(&name);
}

/// An accepted call. Resolves to the wrapped function's output and holds the
/// invoker's lock until then.
#[must_use = "the lock is held until this future completes or is dropped"]
pub struct Guarded<Fut> {
    fut: Pin<Box<Fut>>,
    guard: Option<LockGuard>,
}

impl<Fut: Future> Future for Guarded<Fut> {
    type Output = Fut::Output;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Fut::Output> {
        let out = ready!(self.fut.as_mut().poll(cx));
        self.guard.take();
        Poll::Ready(out)
    }
}

type BoxedOp<A, R> = Box<dyn Fn(A) -> LocalBoxFuture<'static, R>>;

/// Stable single-flight callback returned by [`use_mutex_callback`].
pub struct MutexCallback<A: 'static, R: 'static = ()> {
    invoker: Rc<GuardedInvoker<BoxedOp<A, R>>>,
}

impl<A, R> Clone for MutexCallback<A, R> {
    fn clone(&self) -> Self {
        Self {
            invoker: self.invoker.clone(),
        }
    }
}

impl<A: 'static, R: Outcome + 'static> MutexCallback<A, R> {
    pub fn call(&self, args: A) {
        self.invoker.invoke(args);
    }

    /// Awaitable variant; `None` when a call is already in flight.
    pub fn try_call(&self, args: A) -> Option<Guarded<LocalBoxFuture<'static, R>>> {
        self.invoker.try_call(args)
    }

    pub fn is_busy(&self) -> bool {
        self.invoker.is_locked()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.invoker, &other.invoker)
    }
}

/// Remembers one guarded invoker for this callsite.
///
/// The returned handle keeps its identity and its lock across passes, while
/// every call runs the closure passed on the most recent pass.
pub fn use_mutex_callback<A, R, F, Fut>(f: F) -> MutexCallback<A, R>
where
    A: 'static,
    R: Outcome + 'static,
    F: Fn(A) -> Fut + 'static,
    Fut: Future<Output = R> + 'static,
{
    let latest = use_static_callback(move |args: A| f(args).boxed_local());
    let invoker = remember(move || {
        let op: BoxedOp<A, R> = Box::new(move |args| latest.call(args));
        GuardedInvoker::new(op).named("mutex_callback")
    });
    MutexCallback { invoker }
}
