//! Integration Tests for Reactive System
//!
//! These tests verify that signals, owners, memos, and effects work together
//! correctly.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use weft_core::reactive::{
    cleanup, create_child_context, create_effect, create_memo, create_root, create_signal,
    get_owner, on_cleanup, on_mount, run_with_owner, take_diagnostics, untrack, Owner,
    ReactiveError,
};

fn counter() -> (Rc<Cell<usize>>, impl Fn() + Clone) {
    let count = Rc::new(Cell::new(0));
    let bump = {
        let count = count.clone();
        move || count.set(count.get() + 1)
    };
    (count, bump)
}

/// Count logs 0, then exactly one more entry per write.
#[test]
fn effect_logs_each_write_once() {
    let (count, set_count) = create_signal(0);
    let log = Rc::new(RefCell::new(Vec::new()));
    let log_clone = log.clone();

    create_root(|_| {
        create_effect(move || log_clone.borrow_mut().push(count.get()));
    });
    assert_eq!(*log.borrow(), vec![0]);

    set_count.set(1);
    assert_eq!(*log.borrow(), vec![0, 1]);

    set_count.update(|v| v + 1);
    assert_eq!(*log.borrow(), vec![0, 1, 2]);
}

/// Reading a signal several times in one run still means one re-run per write.
#[test]
fn subscription_is_sound() {
    let (a, set_a) = create_signal(1);
    let (b, set_b) = create_signal(2);
    let (runs, bump) = counter();

    create_root(|_| {
        create_effect(move || {
            a.get();
            b.get();
            a.get();
            bump();
        });
    });

    set_a.set(10);
    assert_eq!(runs.get(), 2);

    set_b.set(20);
    assert_eq!(runs.get(), 3);
}

/// A dependency that is not read on the latest run no longer triggers.
#[test]
fn dependencies_are_pruned() {
    let (use_left, set_use_left) = create_signal(true);
    let (left, set_left) = create_signal("left");
    let (right, set_right) = create_signal("right");
    let seen = Rc::new(RefCell::new(Vec::new()));
    let seen_clone = seen.clone();

    let left_probe = left.clone();
    create_root(|_| {
        create_effect(move || {
            let value = if use_left.get() { left.get() } else { right.get() };
            seen_clone.borrow_mut().push(value);
        });
    });
    assert_eq!(left_probe.observer_count(), 1);

    set_use_left.set(false);
    assert_eq!(left_probe.observer_count(), 0);

    // No longer read: must not re-run
    set_left.set("LEFT");
    assert_eq!(*seen.borrow(), vec!["left", "right"]);

    set_right.set("RIGHT");
    assert_eq!(*seen.borrow(), vec!["left", "right", "RIGHT"]);
}

/// Disposal runs every cleanup and disposes every descendant before returning.
#[test]
fn disposal_is_complete() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let (value, set_value) = create_signal(0);

    let (root, inner) = create_root(|dispose| {
        let log_outer = log.clone();
        let value_outer = value.clone();
        let inner = Rc::new(RefCell::new(None));
        let inner_slot = inner.clone();

        create_effect(move || {
            value_outer.get();
            let log_a = log_outer.clone();
            on_cleanup(move || log_a.borrow_mut().push("outer cleanup"));

            let log_child = log_outer.clone();
            let value_inner = value_outer.clone();
            let child = create_effect(move || {
                value_inner.get();
                let log_b = log_child.clone();
                on_cleanup(move || log_b.borrow_mut().push("inner cleanup"));
            });
            *inner_slot.borrow_mut() = Some(child.owner().clone());
        });

        (dispose, inner)
    });

    let inner_owner: Owner = inner.borrow().clone().expect("inner effect created");
    let outer_owner = inner_owner.parent().expect("inner effect has a parent");

    root.dispose();

    assert_eq!(*log.borrow(), vec!["inner cleanup", "outer cleanup"]);
    assert!(!outer_owner.is_active());
    assert!(!inner_owner.is_active());
    assert_eq!(outer_owner.child_count(), 0);
    assert_eq!(outer_owner.cleanup_count(), 0);
    assert_eq!(root.owner().child_count(), 0);
    assert_eq!(value.observer_count(), 0);

    // Nothing re-runs after disposal
    log.borrow_mut().clear();
    set_value.set(1);
    assert!(log.borrow().is_empty());
}

/// Re-running a parent disposes the children of its previous run.
#[test]
fn rerun_disposes_previous_children() {
    let (outer, set_outer) = create_signal(0);
    let (inner, set_inner) = create_signal(0);
    let (inner_runs, bump) = counter();

    create_root(|_| {
        create_effect(move || {
            outer.get();
            let inner = inner.clone();
            let bump = bump.clone();
            create_effect(move || {
                inner.get();
                bump();
            });
        });
    });
    assert_eq!(inner_runs.get(), 1);

    // Outer re-run: old child disposed, new child created and run
    set_outer.set(1);
    assert_eq!(inner_runs.get(), 2);

    // Only the live child reacts
    set_inner.set(1);
    assert_eq!(inner_runs.get(), 3);
}

/// A memo collapses writes that do not change its value.
#[test]
fn memo_collapses_identical_results() {
    let (count, set_count) = create_signal(0);
    let (reader_runs, bump) = counter();

    create_root(|_| {
        let bucket = create_memo(move |_| count.get() / 10);
        create_effect(move || {
            bucket.get();
            bump();
        });
    });

    for value in 1..10 {
        set_count.set(value);
    }
    assert_eq!(reader_runs.get(), 1);

    set_count.set(10);
    assert_eq!(reader_runs.get(), 2);
}

/// Independent roots: disposing the outer root leaves the inner one alone.
#[test]
fn nested_roots_are_independent() {
    let (outer_signal, set_outer) = create_signal(0);
    let (inner_signal, set_inner) = create_signal(0);
    let (outer_runs, bump_outer) = counter();
    let (inner_runs, bump_inner) = counter();

    let (outer_effect, inner_effect) = create_root(|dispose| {
        let outer_effect = create_effect(move || {
            outer_signal.get();
            bump_outer();
        });

        let inner_effect = create_root(|_inner_dispose| {
            create_effect(move || {
                inner_signal.get();
                bump_inner();
            })
        });

        dispose.dispose();
        (outer_effect, inner_effect)
    });

    assert!(outer_effect.is_disposed());
    assert!(!inner_effect.is_disposed());

    set_outer.set(1);
    set_inner.set(1);
    assert_eq!(outer_runs.get(), 1);
    assert_eq!(inner_runs.get(), 2);
}

/// Subscriptions made during a notification pass wait for the next write.
#[test]
fn resubscription_during_notification_waits_for_next_write() {
    let (source, set_source) = create_signal(0);
    let (late_runs, bump) = counter();

    create_root(|_| {
        let source_reader = source.clone();
        let spawned = Rc::new(Cell::new(false));
        create_effect(move || {
            // Writing creates a new subscriber of `source` on the first
            // notification only.
            if source_reader.get() == 1 && !spawned.replace(true) {
                let source = source_reader.clone();
                let bump = bump.clone();
                create_root(move |_| {
                    create_effect(move || {
                        source.get();
                        bump();
                    });
                });
            }
        });
    });

    set_source.set(1);
    assert_eq!(late_runs.get(), 1);

    set_source.set(2);
    assert_eq!(late_runs.get(), 2);
}

/// Effects writing other signals cascade synchronously, depth-first.
#[test]
fn writes_cascade_depth_first() {
    let (a, set_a) = create_signal(0);
    let (b, set_b) = create_signal(0);
    let log = Rc::new(RefCell::new(Vec::new()));

    create_root(|_| {
        let log_first = log.clone();
        create_effect(move || {
            let value = a.get();
            log_first.borrow_mut().push(format!("a={value}"));
            set_b.set(value * 10);
        });

        let log_second = log.clone();
        create_effect(move || {
            log_second.borrow_mut().push(format!("b={}", b.get()));
        });
    });
    log.borrow_mut().clear();

    set_a.set(2);

    assert_eq!(*log.borrow(), vec!["a=2", "b=20"]);
}

/// An effect that writes a signal it read re-runs once the write settles and
/// keeps its subscription.
#[test]
fn self_writing_effect_stays_subscribed() {
    take_diagnostics();
    let (value, set_value) = create_signal(0);
    let (runs, bump) = counter();
    let probe = value.clone();
    let writer = set_value.clone();

    create_root(|_| {
        create_effect(move || {
            bump();
            if value.get() > 10 {
                set_value.set(10);
            }
        });
    });

    writer.set(50);
    assert_eq!(probe.get_untracked(), 10);
    assert_eq!(runs.get(), 3);
    assert_eq!(probe.observer_count(), 1);

    writer.set(3);
    assert_eq!(runs.get(), 4);
    assert_eq!(probe.observer_count(), 1);
    assert!(take_diagnostics().is_empty());
}

/// Signal reads inside cleanups never subscribe the owner being cleaned.
#[test]
fn cleanups_run_untracked() {
    let (trigger, set_trigger) = create_signal(0);
    let (watched, set_watched) = create_signal(0);
    let (runs, bump) = counter();

    create_root(|_| {
        create_effect(move || {
            trigger.get();
            bump();
            let watched = watched.clone();
            on_cleanup(move || {
                watched.get();
            });
        });
    });

    set_trigger.set(1);
    assert_eq!(runs.get(), 2);

    set_watched.set(1);
    assert_eq!(runs.get(), 2);
}

/// `untrack` reads inside an effect do not create dependencies.
#[test]
fn untracked_reads_inside_effects() {
    let (tracked, set_tracked) = create_signal(0);
    let (ignored, set_ignored) = create_signal(0);
    let (runs, bump) = counter();

    create_root(|_| {
        create_effect(move || {
            tracked.get();
            untrack(|| ignored.get());
            bump();
        });
    });

    set_ignored.set(1);
    assert_eq!(runs.get(), 1);

    set_tracked.set(1);
    assert_eq!(runs.get(), 2);
}

/// A captured owner can be re-entered later to attach more resources.
#[test]
fn run_with_owner_reenters_a_captured_scope() {
    let cleaned = Rc::new(Cell::new(false));

    let (owner, dispose) = create_root(|dispose| {
        (get_owner().expect("root is active"), dispose)
    });

    let cleaned_clone = cleaned.clone();
    run_with_owner(&owner, || {
        on_cleanup(move || cleaned_clone.set(true));
        create_child_context(|| {});
    });
    assert_eq!(owner.child_count(), 1);
    assert_eq!(owner.cleanup_count(), 1);

    dispose.dispose();
    assert!(cleaned.get());
}

/// A panicking body unwinds through `set`, leaving the stack consistent.
#[test]
fn computation_panics_propagate_through_set() {
    let (value, set_value) = create_signal(0);

    create_root(|_| {
        create_effect(move || {
            if value.get() == 13 {
                panic!("unlucky");
            }
        });
    });

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| set_value.set(13)));
    assert!(result.is_err());
    assert!(get_owner().is_none());
}

/// `cleanup` without dispose clears an owner but keeps it usable.
#[test]
fn cleanup_without_dispose_keeps_owner_active() {
    let (value, set_value) = create_signal(0);
    let (runs, bump) = counter();

    let effect = create_root(|_| {
        create_effect(move || {
            value.get();
            bump();
        })
    });

    cleanup(effect.owner(), false);
    assert!(effect.owner().is_active());

    // The subscription went with the cleanup
    set_value.set(1);
    assert_eq!(runs.get(), 1);

    // Executing re-establishes it
    effect.execute();
    set_value.set(2);
    assert_eq!(runs.get(), 3);
}

/// Mount callbacks run once the outermost scope returns.
#[test]
fn on_mount_runs_after_root_body() {
    let order = Rc::new(RefCell::new(Vec::new()));

    create_root(|_| {
        let order_effect = order.clone();
        create_effect(move || {
            let order_mount = order_effect.clone();
            on_mount(move || order_mount.borrow_mut().push("mount"));
            order_effect.borrow_mut().push("effect");
        });
        order.borrow_mut().push("root body end");
    });

    assert_eq!(*order.borrow(), vec!["effect", "root body end", "mount"]);
}

/// Usage errors are reported and the operation degrades to a no-op.
#[test]
fn usage_errors_degrade_gracefully() {
    take_diagnostics();

    on_cleanup(|| {});
    let root = create_root(|dispose| dispose.owner().clone());
    root.execute();

    assert_eq!(
        take_diagnostics(),
        vec![
            ReactiveError::NoOwner {
                operation: "on_cleanup"
            },
            ReactiveError::RootExecuted(root.id()),
        ]
    );
}
