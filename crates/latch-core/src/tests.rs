use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::executor::LocalPool;
use futures::task::LocalSpawnExt;
use web_time::{Duration, Instant};

use crate::clock::{self, Clock, ManualClock};
use crate::locals::*;
use crate::runtime::*;
use crate::scope::*;
use crate::signal::*;
use crate::{Dispose, disposable_effect, effect, on_unmount};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn manual_clock() -> ManualClock {
    let clock = ManualClock::new(Instant::now());
    clock::set_clock(Rc::new(clock.clone()));
    clock
}

#[test]
fn test_signal_basic() {
    let sig = signal(42);
    assert_eq!(sig.get(), 42);

    sig.set(100);
    assert_eq!(sig.get(), 100);

    sig.update(|v| *v += 1);
    assert_eq!(sig.get(), 101);
}

#[test]
fn test_signal_subscription() {
    let sig = signal(0);
    let seen = Rc::new(RefCell::new(Vec::new()));

    let id = sig.subscribe({
        let seen = seen.clone();
        move |v| seen.borrow_mut().push(*v)
    });

    sig.set(42);
    sig.update(|v| *v += 1);
    sig.unsubscribe(id);
    sig.set(7);

    assert_eq!(*seen.borrow(), vec![42, 43]);
}

#[test]
fn test_signal_reuses_unsubscribed_slots() {
    let sig = signal(0);
    let calls = Rc::new(Cell::new(0));
    let first = sig.subscribe(|_| {});

    for _ in 0..100 {
        let calls = calls.clone();
        let id = sig.subscribe(move |_| calls.set(calls.get() + 1));
        sig.set(1);
        sig.unsubscribe(id);
    }
    assert_eq!(calls.get(), 100);
    assert_eq!(sig.subscriber_slots(), 2);

    sig.unsubscribe(first);
    sig.set(2);
    assert_eq!(calls.get(), 100);
}

#[test]
fn test_signal_subscriber_can_read() {
    let sig = signal(String::from("a"));
    let echoed = Rc::new(RefCell::new(String::new()));
    sig.subscribe({
        let sig = sig.clone();
        let echoed = echoed.clone();
        move |_| *echoed.borrow_mut() = sig.get()
    });
    sig.set("b".into());
    assert_eq!(*echoed.borrow(), "b");
}

#[test]
fn test_scope_explicit_dispose() {
    let cleaned_up = Rc::new(Cell::new(false));

    let scope = Scope::new();
    let cleaned_up_clone = cleaned_up.clone();
    scope.add_disposer(move || cleaned_up_clone.set(true));

    assert!(!cleaned_up.get());
    scope.dispose();
    assert!(cleaned_up.get());
}

#[test]
fn test_scope_children_dispose_first() {
    let order = Rc::new(RefCell::new(Vec::new()));

    let parent = Scope::new();
    let child = parent.child();
    parent.add_disposer({
        let order = order.clone();
        move || order.borrow_mut().push("parent")
    });
    child.add_disposer({
        let order = order.clone();
        move || order.borrow_mut().push("child")
    });

    parent.clone().dispose();
    assert_eq!(*order.borrow(), vec!["child", "parent"]);
    assert!(parent.is_disposed());

    // Late disposers run immediately.
    parent.add_disposer({
        let order = order.clone();
        move || order.borrow_mut().push("late")
    });
    assert_eq!(order.borrow().last(), Some(&"late"));
}

#[test]
fn test_scope_run_restores_previous() {
    let outer = Scope::new();
    let inner = Scope::new();
    outer.run(|| {
        inner.run(|| {
            let cur = current_scope();
            assert!(cur.is_some());
        });
        let cur = current_scope();
        assert!(cur.is_some());
    });
    assert!(current_scope().is_none());
}

#[test]
fn test_key_based_remember() {
    reset_composition();

    let val1 = remember_with_key("test", || 42);
    let val2 = remember_with_key("test", || 100);

    assert_eq!(*val1, 42);
    assert_eq!(*val2, 42); // Not 100, because key exists
}

#[test]
fn test_recomposer_keeps_slots_across_passes() {
    let mut root = Recomposer::new();
    let inits = Rc::new(Cell::new(0));

    for _ in 0..3 {
        let inits = inits.clone();
        root.compose(move || {
            let a = remember(|| {
                inits.set(inits.get() + 1);
                String::from("a")
            });
            let b = remember_state(|| 0u32);
            *b.borrow_mut() += 1;
            assert_eq!(*a, "a");
        });
    }

    assert_eq!(inits.get(), 1);
    assert_eq!(root.passes(), 3);
    let b = root.compose(|| {
        let _ = remember(|| String::new());
        remember_state(|| 0u32)
    });
    assert_eq!(*b.borrow(), 3);
}

#[test]
fn test_recomposers_are_isolated() {
    let mut left = Recomposer::new();
    let mut right = Recomposer::new();

    let l = left.compose(|| remember(|| "left"));
    let r = right.compose(|| remember(|| "right"));
    assert_eq!(*l, "left");
    assert_eq!(*r, "right");

    // The thread's own table is untouched by either root.
    reset_composition();
    let own = remember(|| "own");
    assert_eq!(*own, "own");
}

#[test]
fn test_keyed_remember_inside_initializer() {
    let mut root = Recomposer::new();
    let build = || {
        let outer = remember(|| {
            let inner = remember_with_key("inner", || 2);
            *inner * 10
        });
        let next = remember(|| 3);
        (*outer, *next)
    };
    assert_eq!(root.compose(build), (20, 3));
    assert_eq!(root.compose(build), (20, 3));
}

#[test]
fn test_remember_type_change_replaces_slot() {
    reset_composition();
    COMPOSER.with(|c| c.borrow_mut().cursor = 0);
    let _ = remember(|| 1u8);
    COMPOSER.with(|c| c.borrow_mut().cursor = 0);
    let s = remember(|| "now a string");
    assert_eq!(*s, "now a string");
}

#[test]
fn test_effect_cleanup_runs_on_dispose() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut root = Recomposer::new();
    root.compose({
        let log = log.clone();
        move || {
            let _ = effect(move || {
                log.borrow_mut().push("run");
                on_unmount(move || log.borrow_mut().push("cleanup"))
            });
        }
    });
    assert_eq!(*log.borrow(), vec!["run"]);
    root.dispose();
    assert_eq!(*log.borrow(), vec!["run", "cleanup"]);
}

#[test]
fn test_effects_cleaned_up_by_next_pass() {
    let runs = Rc::new(Cell::new(0));
    let cleanups = Rc::new(Cell::new(0));
    let mut root = Recomposer::new();

    for _ in 0..10 {
        let runs = runs.clone();
        let cleanups = cleanups.clone();
        root.compose(move || {
            scoped_effect(move || {
                runs.set(runs.get() + 1);
                Box::new(move || cleanups.set(cleanups.get() + 1))
            });
        });
    }
    assert_eq!(runs.get(), 10);
    assert_eq!(cleanups.get(), 9);

    root.dispose();
    assert_eq!(cleanups.get(), 10);
}

#[test]
fn test_initializer_disposers_outlive_passes() {
    let cleaned = Rc::new(Cell::new(false));
    let mut root = Recomposer::new();

    for _ in 0..3 {
        let cleaned = cleaned.clone();
        root.compose(move || {
            remember(move || {
                if let Some(scope) = current_scope() {
                    scope.add_disposer(move || cleaned.set(true));
                }
            });
        });
    }
    assert!(!cleaned.get());

    root.dispose();
    assert!(cleaned.get());
}

#[test]
fn test_dispose_runs_once() {
    let count = Rc::new(Cell::new(0));
    let d = Dispose::new({
        let count = count.clone();
        move || count.set(count.get() + 1)
    });
    d.run();
    d.clone().run();
    assert_eq!(count.get(), 1);
    assert!(d.is_spent());
}

#[test]
fn test_disposable_effect_reruns_on_key_change() {
    let log = Rc::new(RefCell::new(Vec::<String>::new()));
    let mut root = Recomposer::new();

    for key in [1, 1, 2] {
        let log = log.clone();
        root.compose(move || {
            disposable_effect(key, || {
                log.borrow_mut().push(format!("start {key}"));
                let log = log.clone();
                on_unmount(move || log.borrow_mut().push(format!("stop {key}")))
            });
        });
    }
    assert_eq!(*log.borrow(), vec!["start 1", "stop 1", "start 2"]);

    root.dispose();
    assert_eq!(log.borrow().last().map(String::as_str), Some("stop 2"));
}

#[test]
fn test_timers_fire_in_deadline_order() {
    let clock = manual_clock();
    let fired = Rc::new(RefCell::new(Vec::new()));

    for (name, after) in [("b", 20), ("a", 10), ("c", 30)] {
        let fired = fired.clone();
        clock::schedule(ms(after), move || fired.borrow_mut().push(name));
    }
    let cancelled = clock::schedule(ms(15), || panic!("cancelled timer fired"));
    assert!(clock::cancel_timer(cancelled));
    assert!(!clock::cancel_timer(cancelled));

    clock.advance(ms(5));
    assert_eq!(clock::fire_due_timers(), 0);

    clock.advance(ms(20));
    assert_eq!(clock::fire_due_timers(), 2);
    assert_eq!(*fired.borrow(), vec!["a", "b"]);
    assert_eq!(clock::pending_timers(), 1);
    assert_eq!(clock::next_deadline(), Some(clock.now() + ms(5)));
}

#[test]
fn test_timer_scheduled_while_firing_waits() {
    let _clock = manual_clock();
    let count = Rc::new(Cell::new(0));
    clock::schedule(Duration::ZERO, {
        let count = count.clone();
        move || {
            count.set(count.get() + 1);
            let count = count.clone();
            clock::schedule(Duration::ZERO, move || count.set(count.get() + 1));
        }
    });
    assert_eq!(clock::fire_due_timers(), 1);
    assert_eq!(count.get(), 1);
    assert_eq!(clock::fire_due_timers(), 1);
    assert_eq!(count.get(), 2);
}

#[test]
fn test_sleep_wakes_through_timer_queue() {
    let clock = manual_clock();
    let mut pool = LocalPool::new();
    let done = Rc::new(Cell::new(false));

    pool.spawner()
        .spawn_local({
            let done = done.clone();
            async move {
                clock::sleep(ms(10)).await;
                done.set(true);
            }
        })
        .unwrap();

    pool.run_until_stalled();
    assert!(!done.get());

    clock.advance(ms(9));
    clock::fire_due_timers();
    pool.run_until_stalled();
    assert!(!done.get());

    clock.advance(ms(1));
    clock::fire_due_timers();
    pool.run_until_stalled();
    assert!(done.get());
    assert_eq!(clock::pending_timers(), 0);
}

#[test]
fn test_locals_override_and_restore() {
    assert_eq!(hook_config(), HookConfig::default());
    assert_eq!(local::<u32>(), None);

    let cfg = HookConfig {
        storage_namespace: "app".into(),
        ..HookConfig::default()
    };
    with_hook_config(cfg.clone(), || {
        assert_eq!(hook_config().storage_namespace, "app");
        with_local(5u32, || assert_eq!(local::<u32>(), Some(5)));
        assert_eq!(local::<u32>(), None);
    });
    assert_eq!(hook_config().storage_namespace, "latch");
}
