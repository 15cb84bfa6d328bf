//! Cooperative cancellation token

use std::sync::atomic::{AtomicBool, Ordering};

/// One-shot cooperative stop flag shared between a pool and its workers.
///
/// The flag transitions from not-requested to requested exactly once and
/// never resets. Requesting a stop does not interrupt work already
/// executing; observers are expected to poll [`StopToken::stop_requested`]
/// at their suspension points.
#[derive(Debug, Default)]
pub struct StopToken {
    stopped: AtomicBool,
}

impl StopToken {
    /// Create a token with no stop requested.
    pub fn new() -> Self {
        Self {
            stopped: AtomicBool::new(false),
        }
    }

    /// Request a stop. Idempotent.
    pub fn request_stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    /// Non-blocking check whether a stop has been requested.
    pub fn stop_requested(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}
