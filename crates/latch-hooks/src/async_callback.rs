//! Async callbacks that publish their latest result to a signal.

use std::cell::Cell;
use std::future::Future;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture};

use latch_core::{Signal, remember, signal};

use crate::executor;
use crate::static_ref::{StaticCallback, use_static_callback};

#[derive(Clone, Debug, PartialEq)]
pub enum AsyncState<T, E> {
    Idle,
    Pending,
    Done(Result<T, E>),
}

impl<T, E> AsyncState<T, E> {
    pub fn is_pending(&self) -> bool {
        matches!(self, AsyncState::Pending)
    }
}

/// Async callback whose outcome is tracked in a signal.
///
/// Every call starts the operation; only the most recently started call may
/// write its result, so a slow earlier call cannot overwrite a newer one.
pub struct AsyncCallback<A: 'static, T: 'static, E: 'static> {
    op: StaticCallback<A, LocalBoxFuture<'static, Result<T, E>>>,
    state: Signal<AsyncState<T, E>>,
    generation: Rc<Cell<u64>>,
}

impl<A, T, E> Clone for AsyncCallback<A, T, E> {
    fn clone(&self) -> Self {
        Self {
            op: self.op.clone(),
            state: self.state.clone(),
            generation: self.generation.clone(),
        }
    }
}

impl<A: 'static, T: 'static, E: 'static> AsyncCallback<A, T, E> {
    pub fn call(&self, args: A) {
        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        self.state.set(AsyncState::Pending);

        let fut = self.op.call(args);
        let state = self.state.clone();
        let latest = self.generation.clone();
        let task = async move {
            let result = fut.await;
            if latest.get() == generation {
                state.set(AsyncState::Done(result));
            } else {
                log::trace!("async_callback: discarding result of superseded call");
            }
        };
        if let Err(e) = executor::spawn_local(task) {
            log::error!("async_callback: could not spawn call: {e}");
            self.state.set(AsyncState::Idle);
        }
    }

    pub fn state(&self) -> Signal<AsyncState<T, E>> {
        self.state.clone()
    }

    pub fn is_pending(&self) -> bool {
        self.state.with(AsyncState::is_pending)
    }
}

pub fn use_async_callback<A, T, E, F, Fut>(f: F) -> AsyncCallback<A, T, E>
where
    A: 'static,
    T: 'static,
    E: 'static,
    F: Fn(A) -> Fut + 'static,
    Fut: Future<Output = Result<T, E>> + 'static,
{
    let op = use_static_callback(move |args: A| f(args).boxed_local());
    let cb = remember(move || AsyncCallback {
        op,
        state: signal(AsyncState::Idle),
        generation: Rc::new(Cell::new(0)),
    });
    (*cb).clone()
}
