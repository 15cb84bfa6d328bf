//! Spool core runtime
//!
//! This crate provides the foundation utilities shared across Spool:
//! - Worker-thread pool with compile-time option flags
//! - Per-thread worker identity and OS thread accessors
//! - Cooperative cancellation token
//! - Asynchronous logger with daily file rotation
//! - MurmurHash3, growable byte buffer, semantic-version value type

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod buffer;
pub mod hash;
pub mod log;
pub mod pool;
pub mod stop;
pub mod thread_id;
pub mod version;

pub use buffer::Buffer;
pub use pool::{options, JobPool, TaskPool, ThreadPool};
pub use stop::StopToken;
pub use thread_id::PoolId;
pub use version::Version;

/// Thread-pool protocol errors
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// A worker thread called `wait()` on its own pool
    #[error("wait would deadlock: called from a worker thread of this pool")]
    WouldDeadlock,
}

/// Thread-pool operation result
pub type PoolResult<T> = Result<T, PoolError>;
