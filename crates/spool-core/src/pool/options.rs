//! Pool option flags resolved at compile time
//!
//! Options are a bitmask passed as the const generic parameter of
//! [`ThreadPool`](crate::pool::ThreadPool), so the cost of disabled
//! behavior is compiled away.

/// No optional behavior: a plain FIFO task pool.
pub const NONE: u8 = 0;

/// Compile in [`pause`](crate::pool::ThreadPool::pause) /
/// [`resume`](crate::pool::ThreadPool::resume) support.
pub const PAUSE: u8 = 1 << 0;

/// Compile in reentrant-wait detection: a worker calling
/// [`wait`](crate::pool::ThreadPool::wait) on its own pool fails with
/// [`PoolError::WouldDeadlock`](crate::PoolError::WouldDeadlock) instead
/// of blocking forever.
pub const DEADLOCK_DETECT: u8 = 1 << 1;

/// Fixed-job mode: each worker runs one caller-supplied function exactly
/// once instead of draining a queue.
pub const JOB: u8 = 1 << 2;
