//! Synchronisation primitives built around one condition variable
pub mod condition;
pub mod queue;
pub mod broadcast;

/// Counting barrier.
///
/// Every clone counts as one participant, dropping a clone marks it as done
/// and [`WaitGroup::wait`] blocks until all other clones are dropped.
pub use crossbeam::sync::WaitGroup;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// When observer handlers run relative to the registry lock
pub enum Dispatch {
    /// Release the lock before invoking the handler.
    /// Handlers run in parallel and may use the registry.
    Parallel,
    /// Invoke the handler while holding the lock.
    /// Handlers run one at a time and must not touch the registry.
    Serialized,
}

impl Default for Dispatch {
    fn default() -> Self {
        Dispatch::Parallel
    }
}
