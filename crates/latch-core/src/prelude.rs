pub use crate::clock::{
    Clock, ManualClock, Sleep, SystemClock, TimerId, cancel_timer, fire_due_timers, now,
    schedule, set_clock, sleep,
};
pub use crate::effects::{Dispose, disposable_effect, effect, on_unmount, side_effect};
pub use crate::locals::{HookConfig, hook_config, local, with_hook_config, with_local};
pub use crate::runtime::{
    Recomposer, remember, remember_state, remember_state_with_key, remember_with_key,
    reset_composition,
};
pub use crate::scope::{Scope, current_scope, scoped_effect};
pub use crate::signal::{Signal, signal};
