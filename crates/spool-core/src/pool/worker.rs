//! Worker thread running the pool's state machine

use crate::pool::shared::PoolShared;
use crate::thread_id::{self, PoolId};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// One worker thread of a pool.
pub(crate) struct Worker {
    index: usize,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Spawn the worker thread. The pause/job flags arrive as plain
    /// booleans; the façade passes its compile-time constants.
    pub fn spawn(
        index: usize,
        shared: Arc<PoolShared>,
        pool: PoolId,
        pause_enabled: bool,
        job_mode: bool,
    ) -> Self {
        let handle = thread::Builder::new()
            .name(format!("spool-worker-{}", index))
            .spawn(move || Self::run(index, &shared, pool, pause_enabled, job_mode))
            .expect("failed to spawn worker thread");
        Self {
            index,
            handle: Some(handle),
        }
    }

    /// Worker index within the owning pool.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Join the worker thread, swallowing its panic payload if it died.
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// Thread body: install identity, run init, serve, clean up.
    fn run(index: usize, shared: &PoolShared, pool: PoolId, pause_enabled: bool, job_mode: bool) {
        thread_id::enter(index, pool);

        if panic::catch_unwind(AssertUnwindSafe(|| (shared.init)(index))).is_err() {
            Self::abort_startup(shared);
            thread_id::exit();
            return;
        }

        if job_mode {
            Self::run_job(shared, pause_enabled);
        } else {
            Self::run_queue(shared, pause_enabled);
        }

        let cleanup = Arc::clone(&*shared.cleanup.lock());
        let _ = panic::catch_unwind(AssertUnwindSafe(|| (*cleanup)(index)));
        thread_id::exit();
    }

    /// A panicking init callback aborts pool startup: keep the accounting
    /// sound, stop the pool and release anyone already draining.
    fn abort_startup(shared: &PoolShared) {
        let mut state = shared.state.lock();
        state.running -= 1;
        shared.stop.request_stop();
        drop(state);
        shared.work_available.notify_all();
        shared.drained.notify_all();
    }

    /// Queue mode: wait for work or stop, execute outside the lock.
    fn run_queue(shared: &PoolShared, pause_enabled: bool) {
        loop {
            let mut state = shared.state.lock();
            state.running -= 1;

            if state.waiters > 0 && PoolShared::drained_now(&state, pause_enabled) {
                shared.drained.notify_all();
            }

            // The pause flag is re-read after every wakeup; dequeuing must
            // observe the live value, not the one from before blocking.
            while !shared.stop.stop_requested()
                && ((pause_enabled && state.paused) || state.tasks.is_empty())
            {
                shared.work_available.wait(&mut state);
            }

            if shared.stop.stop_requested() {
                break;
            }

            let task = state.tasks.pop_front().expect("woken with an empty queue");
            state.running += 1;
            drop(state);

            // A panicking task must not take the worker down with it; the
            // failure stays invisible to the submitter.
            let _ = panic::catch_unwind(AssertUnwindSafe(task));
        }
    }

    /// Job mode: run the fixed job exactly once, then report completion.
    fn run_job(shared: &PoolShared, pause_enabled: bool) {
        if let Some(job) = &shared.job {
            let _ = panic::catch_unwind(AssertUnwindSafe(|| job()));
        }
        let mut state = shared.state.lock();
        state.running -= 1;
        if state.waiters > 0 && PoolShared::drained_now(&state, pause_enabled) {
            shared.drained.notify_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::shared::PoolShared;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn spawn_workers(shared: &Arc<PoolShared>, count: usize, job_mode: bool) -> Vec<Worker> {
        let pool = PoolId::from_addr(Arc::as_ptr(shared) as usize);
        (0..count)
            .map(|i| Worker::spawn(i, Arc::clone(shared), pool, false, job_mode))
            .collect()
    }

    #[test]
    fn test_worker_executes_submitted_task() {
        let shared = Arc::new(PoolShared::new(1, Box::new(|_| {}), None));
        let mut workers = spawn_workers(&shared, 1, false);
        assert_eq!(workers[0].index(), 0);

        let ran = Arc::new(AtomicUsize::new(0));
        let observer = Arc::clone(&ran);
        shared.submit(Box::new(move || {
            observer.fetch_add(1, Ordering::SeqCst);
        }));

        shared.wait_for_drain(false);
        assert_eq!(ran.load(Ordering::SeqCst), 1);

        shared.shutdown();
        for worker in &mut workers {
            worker.join();
        }
    }

    #[test]
    fn test_worker_survives_panicking_task() {
        let shared = Arc::new(PoolShared::new(1, Box::new(|_| {}), None));
        let mut workers = spawn_workers(&shared, 1, false);

        shared.submit(Box::new(|| panic!("boom")));
        let ran = Arc::new(AtomicUsize::new(0));
        let observer = Arc::clone(&ran);
        shared.submit(Box::new(move || {
            observer.fetch_add(1, Ordering::SeqCst);
        }));

        shared.wait_for_drain(false);
        assert_eq!(ran.load(Ordering::SeqCst), 1);

        shared.shutdown();
        for worker in &mut workers {
            worker.join();
        }
    }

    #[test]
    fn test_init_panic_aborts_startup() {
        let shared = Arc::new(PoolShared::new(
            2,
            Box::new(|index| {
                if index == 0 {
                    panic!("init failure");
                }
            }),
            None,
        ));
        let mut workers = spawn_workers(&shared, 2, false);

        // The drain-wait must not hang on the aborted pool.
        shared.wait_for_drain(false);
        assert!(shared.stop.stop_requested());

        for worker in &mut workers {
            worker.join();
        }
    }

    #[test]
    fn test_job_runs_once_per_worker() {
        let ran = Arc::new(AtomicUsize::new(0));
        let observer = Arc::clone(&ran);
        let shared = Arc::new(PoolShared::new(
            3,
            Box::new(|_| {}),
            Some(Box::new(move || {
                observer.fetch_add(1, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(5));
            })),
        ));
        let mut workers = spawn_workers(&shared, 3, true);

        shared.wait_for_drain(false);
        assert_eq!(ran.load(Ordering::SeqCst), 3);

        for worker in &mut workers {
            worker.join();
        }
    }
}
