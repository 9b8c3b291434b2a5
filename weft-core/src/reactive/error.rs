//! Usage errors reported by the reactive core.

use thiserror::Error;

use super::id::OwnerId;

/// A misuse of the reactive API.
///
/// These are never returned from the reactive operations themselves. They are
/// reported through the diagnostic channel (see
/// [`take_diagnostics`](super::take_diagnostics)) and the operation that hit
/// them degrades to a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReactiveError {
    /// An operation that needs an active owner ran outside of any.
    #[error("`{operation}` called without an active owner")]
    NoOwner {
        /// Name of the operation that needed an owner.
        operation: &'static str,
    },

    /// Something tried to execute a root owner. Roots only own resources.
    #[error("root {0} cannot be executed")]
    RootExecuted(OwnerId),

    /// An owner kept re-triggering itself from inside its own body and was
    /// given up on after the maximum number of runs.
    #[error("{0} kept re-triggering itself while its body was running")]
    ReentrantExecution(OwnerId),
}
