//! Effect Implementation
//!
//! An Effect is a side-effecting computation that re-runs whenever a signal
//! it read during its last run is written.
//!
//! # How Effects Work
//!
//! 1. When created, the effect allocates a child owner under the active owner
//!    and runs its body once, immediately, to establish its dependencies.
//!
//! 2. When any dependency is written, the signal executes the effect's owner
//!    synchronously.
//!
//! 3. Executing first cleans the owner: child owners created by the last run
//!    are disposed, cleanups registered by the last run (including the
//!    subscriptions) are invoked. Then the body runs again and tracks afresh.
//!
//! # Cleanup
//!
//! Effects register teardown work with
//! [`on_cleanup`](super::on_cleanup). It runs before the next re-run and when
//! the effect is disposed.
//!
//! # Reducer Effects
//!
//! [`create_reducer_effect`] threads a value through runs: each run receives
//! the result of the previous one, starting from an initial value.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::owner::{Computation, Owner};

/// A side-effecting computation that runs when dependencies change.
///
/// # Example
///
/// ```rust
/// use weft_core::reactive::{create_root, create_signal, Effect};
///
/// let (count, set_count) = create_signal(0);
///
/// let effect = create_root(|_| {
///     Effect::new(move || println!("Count is: {}", count.get()))
/// });
///
/// set_count.set(5); // Prints: "Count is: 5"
/// assert_eq!(effect.run_count(), 2);
/// ```
#[derive(Clone)]
pub struct Effect {
    /// The owner the body runs in.
    owner: Owner,

    /// Number of runs that completed.
    run_count: Rc<Cell<usize>>,
}

/// Fold body: receives the previous result, returns the next one.
struct Reducer<T, F> {
    body: RefCell<F>,
    previous: RefCell<T>,
}

impl<T, F> Computation for Reducer<T, F>
where
    T: Clone,
    F: FnMut(T) -> T,
{
    fn run(&self) {
        let previous = self.previous.borrow().clone();
        let next = {
            let mut body = self.body.borrow_mut();
            (*body)(previous)
        };
        *self.previous.borrow_mut() = next;
    }
}

impl Effect {
    /// Create a new effect with the given body and run it once.
    pub fn new(body: impl FnMut() + 'static) -> Self {
        let run_count = Rc::new(Cell::new(0));
        let counter = Rc::clone(&run_count);
        let mut body = body;

        let owner = Owner::new_child("create_effect");
        owner.set_computation(Rc::new(RefCell::new(move || {
            body();
            counter.set(counter.get() + 1);
        })));
        owner.execute();

        Self { owner, run_count }
    }

    /// Create a reducer effect and run it once with `initial`.
    pub fn with_reducer<T>(body: impl FnMut(T) -> T + 'static, initial: T) -> Self
    where
        T: Clone + 'static,
    {
        let run_count = Rc::new(Cell::new(0));
        let counter = Rc::clone(&run_count);
        let mut body = body;

        let owner = Owner::new_child("create_reducer_effect");
        owner.set_computation(Rc::new(Reducer {
            body: RefCell::new(move |previous: T| {
                let next = body(previous);
                counter.set(counter.get() + 1);
                next
            }),
            previous: RefCell::new(initial),
        }));
        owner.execute();

        Self { owner, run_count }
    }

    /// The owner this effect runs in.
    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    /// Re-run the effect now, as if a dependency had changed.
    pub fn execute(&self) {
        self.owner.execute();
    }

    /// Dispose of the effect.
    ///
    /// Runs its cleanups, disposes its children and unsubscribes it. After
    /// disposal the effect will not run again.
    pub fn dispose(&self) {
        self.owner.dispose();
    }

    /// Check if the effect has been disposed.
    pub fn is_disposed(&self) -> bool {
        !self.owner.is_active()
    }

    /// Get the number of times the effect has run to completion.
    pub fn run_count(&self) -> usize {
        self.run_count.get()
    }
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect")
            .field("owner", &self.owner.id())
            .field("run_count", &self.run_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Create an effect under the active owner and run it once.
pub fn create_effect(body: impl FnMut() + 'static) -> Effect {
    Effect::new(body)
}

/// Create an effect whose body folds over its previous result.
///
/// The first run receives `initial`; every later run receives what the run
/// before it returned.
pub fn create_reducer_effect<T>(body: impl FnMut(T) -> T + 'static, initial: T) -> Effect
where
    T: Clone + 'static,
{
    Effect::with_reducer(body, initial)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{create_root, create_signal, on_cleanup, take_diagnostics, ReactiveError};

    #[test]
    fn effect_runs_on_creation() {
        let run_count = Rc::new(Cell::new(0));
        let run_count_clone = run_count.clone();

        create_root(|_| {
            create_effect(move || run_count_clone.set(run_count_clone.get() + 1));
        });

        // Effect should have run once on creation
        assert_eq!(run_count.get(), 1);
    }

    #[test]
    fn effect_reruns_on_dependency_write() {
        let (count, set_count) = create_signal(0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();

        let effect = create_root(|_| {
            create_effect(move || seen_clone.borrow_mut().push(count.get()))
        });

        set_count.set(1);
        set_count.update(|v| v + 1);

        assert_eq!(*seen.borrow(), vec![0, 1, 2]);
        assert_eq!(effect.run_count(), 3);
    }

    #[test]
    fn effect_does_not_run_after_disposal() {
        let (count, set_count) = create_signal(0);
        let effect = create_root(|_| {
            create_effect(move || {
                count.get();
            })
        });

        effect.dispose();
        assert!(effect.is_disposed());

        set_count.set(1);
        effect.execute();
        assert_eq!(effect.run_count(), 1);
    }

    #[test]
    fn cleanups_run_before_each_rerun() {
        let (count, set_count) = create_signal(0);
        let log = Rc::new(RefCell::new(Vec::new()));
        let log_clone = log.clone();

        create_root(|_| {
            create_effect(move || {
                let value = count.get();
                log_clone.borrow_mut().push(format!("run {value}"));
                let log_inner = log_clone.clone();
                on_cleanup(move || log_inner.borrow_mut().push(format!("cleanup {value}")));
            });
        });

        set_count.set(1);

        assert_eq!(*log.borrow(), vec!["run 0", "cleanup 0", "run 1"]);
    }

    #[test]
    fn reducer_effect_threads_previous_value() {
        let (count, set_count) = create_signal(1);
        let totals = Rc::new(RefCell::new(Vec::new()));
        let totals_clone = totals.clone();

        create_root(|_| {
            create_reducer_effect(
                move |total: i32| {
                    let next = total + count.get();
                    totals_clone.borrow_mut().push(next);
                    next
                },
                100,
            );
        });

        set_count.set(10);
        set_count.set(5);

        assert_eq!(*totals.borrow(), vec![101, 111, 116]);
    }

    #[test]
    fn effect_without_owner_still_runs_and_reports() {
        take_diagnostics();
        let effect = create_effect(|| {});

        assert_eq!(effect.run_count(), 1);
        assert_eq!(
            take_diagnostics(),
            vec![ReactiveError::NoOwner {
                operation: "create_effect"
            }]
        );
    }

    #[test]
    fn effect_clone_shares_state() {
        let effect1 = create_root(|_| create_effect(|| {}));
        let effect2 = effect1.clone();

        assert_eq!(effect1.owner(), effect2.owner());

        effect1.execute();
        assert_eq!(effect1.run_count(), 2);
        assert_eq!(effect2.run_count(), 2);

        // Shared disposal state
        effect1.dispose();
        assert!(effect2.is_disposed());
    }
}
