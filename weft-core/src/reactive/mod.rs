//! Reactive Primitives
//!
//! This module implements the core reactive system: signals, owners, effects
//! and memos. These primitives form the foundation of Weft's fine-grained
//! reactivity.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is a container for mutable state. When a signal's value is read
//! while an owner is running, the signal registers that owner as an observer.
//! When the signal is written, every observer re-runs, synchronously.
//!
//! ## Owners
//!
//! An Owner is a node in the ownership tree. It owns the child owners and
//! cleanup callbacks created while it runs, and disposes them before it runs
//! again. Roots own subtrees without ever running themselves.
//!
//! ## Effects
//!
//! An Effect is a side-effecting computation that runs whenever its
//! dependencies change.
//!
//! ## Memos
//!
//! A Memo is a derived value that only re-notifies its own readers when the
//! computed value actually changes.
//!
//! # Implementation Notes
//!
//! The reactive system uses a thread-local context stack to attribute reads,
//! cleanups and child creation to the running owner. There is no scheduler:
//! every write propagates to completion, depth-first, before `set` returns.

mod context;
mod effect;
mod error;
mod id;
mod memo;
mod owner;
mod runtime;
mod signal;

pub use context::{get_owner, run_in_context, run_with_owner, untrack};
pub use effect::{create_effect, create_reducer_effect, Effect};
pub use error::ReactiveError;
pub use id::{OwnerId, SignalId};
pub use memo::{create_memo, create_memo_with_options, Memo, MemoOptions};
pub use owner::{cleanup, create_child_context, create_root, on_cleanup, Disposer, Owner};
pub use runtime::{on_mount, take_diagnostics};
pub use signal::{
    create_signal, create_signal_with_options, Equals, ReadSignal, SignalOptions, WriteSignal,
};

pub(crate) use owner::Computation;
