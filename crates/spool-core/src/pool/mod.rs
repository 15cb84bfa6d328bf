//! Worker-thread pool with compile-time option flags
//!
//! A fixed set of OS threads drains a FIFO task queue, with optional
//! pause/resume, reentrant-wait detection and a fixed-job mode where each
//! thread runs one long-lived function instead of consuming the queue.

pub mod options;
#[allow(clippy::module_inception)]
mod pool;
mod shared;
mod task;
mod worker;

pub use pool::{JobPool, TaskPool, ThreadPool};
pub use task::Task;
