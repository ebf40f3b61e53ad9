//! Where hook-started futures run.
//!
//! Latch does not own an event loop. The host installs a `LocalSpawn` (a
//! `futures::executor::LocalPool` spawner on desktop and in tests); on `wasm32`
//! the browser's microtask queue is used when nothing was installed.

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use futures::task::{LocalFutureObj, LocalSpawn, SpawnError};

thread_local! {
    static SPAWNER: RefCell<Option<Rc<dyn LocalSpawn>>> = const { RefCell::new(None) };
}

/// Installs the spawner used by `spawn_local` on this thread.
pub fn set_spawner(spawner: impl LocalSpawn + 'static) {
    SPAWNER.with(|s| *s.borrow_mut() = Some(Rc::new(spawner)));
}

pub fn clear_spawner() {
    SPAWNER.with(|s| *s.borrow_mut() = None);
}

/// Runs `f` with `spawner` installed, restoring the previous one afterwards.
pub fn with_spawner<R>(spawner: impl LocalSpawn + 'static, f: impl FnOnce() -> R) -> R {
    struct Restore(Option<Rc<dyn LocalSpawn>>);
    impl Drop for Restore {
        fn drop(&mut self) {
            let prev = self.0.take();
            SPAWNER.with(|s| *s.borrow_mut() = prev);
        }
    }

    let spawner: Rc<dyn LocalSpawn> = Rc::new(spawner);
    let prev = SPAWNER.with(|s| s.replace(Some(spawner)));
    let _restore = Restore(prev);
    f()
}

/// Whether `spawn_local` has somewhere to run futures on this thread.
pub fn has_spawner() -> bool {
    SPAWNER.with(|s| s.borrow().is_some()) || cfg!(target_arch = "wasm32")
}

/// Spawns `fut` on the installed spawner.
pub fn spawn_local(fut: impl Future<Output = ()> + 'static) -> Result<(), SpawnError> {
    let spawner = SPAWNER.with(|s| s.borrow().clone());
    match spawner {
        Some(spawner) => spawn_on(&*spawner, fut),
        None => spawn_fallback(fut),
    }
}

pub fn spawn_on(
    spawner: &(impl LocalSpawn + ?Sized),
    fut: impl Future<Output = ()> + 'static,
) -> Result<(), SpawnError> {
    spawner.spawn_local_obj(LocalFutureObj::new(Box::new(fut)))
}

#[cfg(target_arch = "wasm32")]
fn spawn_fallback(fut: impl Future<Output = ()> + 'static) -> Result<(), SpawnError> {
    wasm_bindgen_futures::spawn_local(fut);
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
fn spawn_fallback(fut: impl Future<Output = ()> + 'static) -> Result<(), SpawnError> {
    drop(fut);
    log::error!("spawn_local: no spawner installed on this thread; call set_spawner first");
    Err(SpawnError::shutdown())
}
