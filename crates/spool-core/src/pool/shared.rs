//! Task queue and synchronization core shared between a pool façade and
//! its workers
//!
//! One mutex guards all queue state; two condition variables implement
//! the producer/consumer plus drain-barrier protocol: `work_available`
//! means "work arrived or a stop was requested", `drained` means "nothing
//! is running and nothing is runnable".

use crate::pool::task::{CleanupFn, InitFn, JobFn, Task};
use crate::stop::StopToken;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;

/// Queue state. Mutation only happens while the pool mutex is held.
pub(crate) struct PoolState {
    /// Pending tasks in submission order.
    pub tasks: VecDeque<Task>,
    /// Tasks currently executing or about to execute. Pre-seeded with the
    /// worker count at construction so a drain-wait cannot return before
    /// every worker has reached its first dequeue.
    pub running: usize,
    /// Callers currently blocked in a drain-wait.
    pub waiters: usize,
    /// While set, workers treat the queue as empty without discarding it.
    pub paused: bool,
}

/// State shared between the façade and every worker.
pub(crate) struct PoolShared {
    /// The single pool lock.
    pub state: Mutex<PoolState>,
    /// Signaled when work arrives or a stop is requested.
    pub work_available: Condvar,
    /// Signaled when the drain predicate becomes true.
    pub drained: Condvar,
    /// One-shot cooperative cancellation flag.
    pub stop: StopToken,
    /// Worker initialization callback.
    pub init: InitFn,
    /// Worker cleanup callback, replaceable via the façade.
    pub cleanup: Mutex<CleanupFn>,
    /// The fixed job, present only in job mode.
    pub job: Option<JobFn>,
}

impl PoolShared {
    pub fn new(thread_count: usize, init: InitFn, job: Option<JobFn>) -> Self {
        Self {
            state: Mutex::new(PoolState {
                tasks: VecDeque::new(),
                running: thread_count,
                waiters: 0,
                paused: false,
            }),
            work_available: Condvar::new(),
            drained: Condvar::new(),
            stop: StopToken::new(),
            init,
            cleanup: Mutex::new(std::sync::Arc::new(|_| {})),
            job,
        }
    }

    /// Drain predicate: nothing executing, and nothing runnable (the
    /// queue is empty, or dequeuing is suspended by a pause).
    pub fn drained_now(state: &PoolState, pause_enabled: bool) -> bool {
        state.running == 0 && ((pause_enabled && state.paused) || state.tasks.is_empty())
    }

    /// Append a task and wake exactly one idle worker. Never blocks on
    /// capacity; the queue is unbounded.
    pub fn submit(&self, task: Task) {
        let mut state = self.state.lock();
        state.tasks.push_back(task);
        drop(state);
        self.work_available.notify_one();
    }

    /// Block the calling thread until the drain predicate holds or a stop
    /// has been requested.
    pub fn wait_for_drain(&self, pause_enabled: bool) {
        let mut state = self.state.lock();
        state.waiters += 1;
        while !self.stop.stop_requested() && !Self::drained_now(&state, pause_enabled) {
            self.drained.wait(&mut state);
        }
        state.waiters -= 1;
    }

    /// Request a stop and wake every worker. The stop flag is flipped
    /// under the lock so blocked workers cannot miss the transition.
    pub fn shutdown(&self) {
        {
            let _state = self.state.lock();
            self.stop.request_stop();
        }
        self.work_available.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_shared(thread_count: usize) -> PoolShared {
        PoolShared::new(thread_count, Box::new(|_| {}), None)
    }

    #[test]
    fn test_drain_predicate_empty_pool() {
        let shared = bare_shared(0);
        let state = shared.state.lock();
        assert!(PoolShared::drained_now(&state, false));
    }

    #[test]
    fn test_drain_predicate_counts_seeded_workers() {
        let shared = bare_shared(2);
        let state = shared.state.lock();
        assert!(!PoolShared::drained_now(&state, false));
    }

    #[test]
    fn test_pause_masks_pending_queue() {
        let shared = bare_shared(0);
        shared.submit(Box::new(|| {}));
        let mut state = shared.state.lock();
        assert!(!PoolShared::drained_now(&state, true));
        state.paused = true;
        assert!(PoolShared::drained_now(&state, true));
        // Without pause support the flag is dead weight and ignored.
        assert!(!PoolShared::drained_now(&state, false));
    }

    #[test]
    fn test_wait_returns_immediately_when_drained() {
        let shared = bare_shared(0);
        shared.wait_for_drain(false);
        assert_eq!(shared.state.lock().waiters, 0);
    }
}
