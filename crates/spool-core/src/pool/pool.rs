//! Pool façade: construction, submission, drain-wait, pause, teardown

use crate::pool::options;
use crate::pool::shared::PoolShared;
use crate::pool::task::{InitFn, JobFn};
use crate::pool::worker::Worker;
use crate::thread_id::{self, PoolId};
use crate::{PoolError, PoolResult};
use std::sync::Arc;

/// A fixed-size worker-thread pool.
///
/// `OPTS` is a bitmask of [`options`] flags resolved at compile time;
/// behavior that is not compiled in costs nothing at runtime. The worker
/// count is fixed at construction and never changes. Dropping the pool
/// blocks until all queued work has drained and every worker has been
/// joined.
///
/// ```
/// use spool_core::pool::TaskPool;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let pool = TaskPool::new(4);
/// let counter = Arc::new(AtomicUsize::new(0));
/// for _ in 0..16 {
///     let counter = Arc::clone(&counter);
///     pool.submit(move || {
///         counter.fetch_add(1, Ordering::Relaxed);
///     });
/// }
/// pool.wait().unwrap();
/// assert_eq!(counter.load(Ordering::Relaxed), 16);
/// ```
pub struct ThreadPool<const OPTS: u8 = { options::NONE }> {
    shared: Arc<PoolShared>,
    workers: Vec<Worker>,
    thread_count: usize,
}

/// Plain FIFO task pool with no optional behavior.
pub type TaskPool = ThreadPool<{ options::NONE }>;

/// Pool whose workers each run one long-lived job exactly once instead of
/// draining a queue.
pub type JobPool = ThreadPool<{ options::JOB }>;

impl<const OPTS: u8> ThreadPool<OPTS> {
    /// Whether [`pause`](Self::pause) / [`resume`](Self::resume) are
    /// compiled in.
    pub const PAUSE_ENABLED: bool = OPTS & options::PAUSE != 0;
    /// Whether [`wait`](Self::wait) refuses reentrant waits.
    pub const DEADLOCK_DETECT_ENABLED: bool = OPTS & options::DEADLOCK_DETECT != 0;
    /// Whether workers run one fixed job instead of draining the queue.
    pub const JOB_MODE: bool = OPTS & options::JOB != 0;

    /// Create a pool with `thread_count` workers and no init callback.
    ///
    /// A count of zero resolves to the detected hardware concurrency.
    pub fn new(thread_count: usize) -> Self {
        Self::with_init(thread_count, |_| {})
    }

    /// Create a pool whose workers run `init` (with their index) before
    /// considering any task.
    ///
    /// # Panics
    ///
    /// Panics if the JOB flag is set; fixed-job pools are constructed
    /// with [`with_job`](Self::with_job).
    pub fn with_init<F>(thread_count: usize, init: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        assert!(
            !Self::JOB_MODE,
            "fixed-job pools are constructed with `with_job`"
        );
        Self::build(thread_count, Box::new(init), None)
    }

    /// Create a fixed-job pool: after `init`, every worker runs `job`
    /// exactly once and exits. There is no queue; [`wait`](Self::wait)
    /// blocks until all jobs have finished.
    ///
    /// # Panics
    ///
    /// Panics unless the JOB flag is set.
    pub fn with_job<F, J>(thread_count: usize, init: F, job: J) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
        J: Fn() + Send + Sync + 'static,
    {
        assert!(Self::JOB_MODE, "`with_job` requires the JOB option flag");
        Self::build(thread_count, Box::new(init), Some(Box::new(job)))
    }

    fn build(thread_count: usize, init: InitFn, job: Option<JobFn>) -> Self {
        let thread_count = resolve_thread_count(thread_count);
        let shared = Arc::new(PoolShared::new(thread_count, init, job));
        let id = PoolId::from_addr(Arc::as_ptr(&shared) as usize);
        let workers = (0..thread_count)
            .map(|index| {
                Worker::spawn(
                    index,
                    Arc::clone(&shared),
                    id,
                    Self::PAUSE_ENABLED,
                    Self::JOB_MODE,
                )
            })
            .collect();
        Self {
            shared,
            workers,
            thread_count,
        }
    }

    /// Number of worker threads, fixed at construction.
    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    /// Identity of this pool, as recorded in each worker's thread-local
    /// context.
    pub fn id(&self) -> PoolId {
        PoolId::from_addr(Arc::as_ptr(&self.shared) as usize)
    }

    /// Queue a task for execution. Ownership moves to the queue and then
    /// to whichever worker dequeues it. Never blocks on capacity.
    ///
    /// # Panics
    ///
    /// Panics on a fixed-job pool, which has no queue to submit into.
    pub fn submit<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        assert!(!Self::JOB_MODE, "submit is only valid on a task-queue pool");
        self.shared.submit(Box::new(task));
    }

    /// Block until no task is executing and none is queued (or the pool
    /// is paused). Returns immediately when the predicate already holds.
    ///
    /// With deadlock detection compiled in, calling this from one of the
    /// pool's own workers fails with [`PoolError::WouldDeadlock`] instead
    /// of blocking forever.
    pub fn wait(&self) -> PoolResult<()> {
        if Self::DEADLOCK_DETECT_ENABLED && thread_id::pool_id() == Some(self.id()) {
            return Err(PoolError::WouldDeadlock);
        }
        self.shared.wait_for_drain(Self::PAUSE_ENABLED);
        Ok(())
    }

    /// Suspend dequeuing. In-flight tasks finish; pending tasks stay
    /// queued. While paused, [`wait`](Self::wait) treats the pending
    /// queue as drained.
    ///
    /// # Panics
    ///
    /// Panics unless the PAUSE flag is set.
    pub fn pause(&self) {
        assert!(Self::PAUSE_ENABLED, "pool was not built with the PAUSE flag");
        let notify = {
            let mut state = self.shared.state.lock();
            state.paused = true;
            state.waiters > 0 && PoolShared::drained_now(&state, true)
        };
        if notify {
            self.shared.drained.notify_all();
        }
    }

    /// Resume dequeuing of pending tasks.
    ///
    /// # Panics
    ///
    /// Panics unless the PAUSE flag is set.
    pub fn resume(&self) {
        assert!(Self::PAUSE_ENABLED, "pool was not built with the PAUSE flag");
        self.shared.state.lock().paused = false;
        self.shared.work_available.notify_all();
    }

    /// Whether dequeuing is currently suspended.
    ///
    /// # Panics
    ///
    /// Panics unless the PAUSE flag is set.
    pub fn is_paused(&self) -> bool {
        assert!(Self::PAUSE_ENABLED, "pool was not built with the PAUSE flag");
        self.shared.state.lock().paused
    }

    /// Replace the cleanup callback run by each worker (with its index)
    /// on exit. Call this before work is in flight; replacement races
    /// with nothing here, but a worker that already exited has already
    /// run the previous callback.
    pub fn set_cleanup<F>(&self, cleanup: F)
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        *self.shared.cleanup.lock() = Arc::new(cleanup);
    }
}

impl<const OPTS: u8> Drop for ThreadPool<OPTS> {
    fn drop(&mut self) {
        // Final drain: never propagates. Reentrant-wait errors cannot
        // occur here since workers do not own their pool.
        self.shared.wait_for_drain(Self::PAUSE_ENABLED);
        if !Self::JOB_MODE {
            // Fixed jobs run to completion unconditionally; queue workers
            // are told to stop and woken.
            self.shared.shutdown();
        }
        for worker in &mut self.workers {
            worker.join();
        }
    }
}

fn resolve_thread_count(requested: usize) -> usize {
    if requested == 0 {
        num_cpus::get()
    } else {
        requested
    }
}
