//! # Composition, Scopes, and Effects
//!
//! `latch-core` is the small single-threaded runtime the Latch hooks sit on.
//! There are four pieces:
//!
//! - `remember*` — storage bound to a slot of the current composition.
//! - `Scope` / `effect` — cleanups that run when the UI owning them goes away.
//! - `Signal<T>` — cloneable observable value.
//! - `clock` — a replaceable time source plus frame-driven timers.
//!
//! ## Remembered state
//!
//! A `Recomposer` owns one root's slot table. Each `compose` call is one pass;
//! the Nth `remember` in a pass always refers to the Nth stored value:
//!
//! ```rust
//! use latch_core::*;
//!
//! let mut root = Recomposer::new();
//! for _ in 0..3 {
//!     root.compose(|| {
//!         let clicks = remember_state(|| 0);
//!         *clicks.borrow_mut() += 1;
//!     });
//! }
//! let clicks = root.compose(|| remember_state(|| 0));
//! assert_eq!(*clicks.borrow(), 3);
//! ```
//!
//! - `remember` and `remember_state` are order‑based.
//! - `remember_with_key` and `remember_state_with_key` are key‑based and stable
//!   across conditional branches.
//!
//! ## Effects and cleanup
//!
//! ```rust
//! use latch_core::*;
//!
//! let mut root = Recomposer::new();
//! root.compose(|| {
//!     scoped_effect(|| {
//!         log::info!("mounted");
//!         Box::new(|| log::info!("unmounted"))
//!     });
//! });
//! root.dispose(); // logs "unmounted"
//! ```
//!
//! ## Time
//!
//! Hooks read time through `clock::now()` and wait through `clock::sleep` or
//! `clock::schedule`. The host calls `clock::fire_due_timers()` once per frame;
//! tests install a `ManualClock` and advance it by hand.

pub mod clock;
pub mod effects;
pub mod locals;
pub mod prelude;
pub mod runtime;
pub mod scope;
pub mod signal;

#[cfg(test)]
mod tests;

pub use clock::{Clock, ManualClock, SystemClock, TimerId};
pub use effects::*;
pub use locals::*;
pub use runtime::*;
pub use scope::*;
pub use signal::*;
