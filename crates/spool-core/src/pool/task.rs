//! Task and worker-callback types

use std::sync::Arc;

/// A queued unit of work: zero arguments, no return value, executed at
/// most once by whichever worker dequeues it.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Per-worker initialization callback, run with the worker's index before
/// any task is considered.
pub(crate) type InitFn = Box<dyn Fn(usize) + Send + Sync + 'static>;

/// Per-worker cleanup callback, run with the worker's index on exit.
/// Shared so it can be replaced after construction.
pub(crate) type CleanupFn = Arc<dyn Fn(usize) + Send + Sync + 'static>;

/// The fixed job every worker runs exactly once in job mode.
pub(crate) type JobFn = Box<dyn Fn() + Send + Sync + 'static>;
