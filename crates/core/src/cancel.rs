//! Cooperative cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared cancellation flag threaded through request handling.
///
/// Cloning yields a handle to the same flag. Work checks the flag at its
/// cancellation points; nothing is interrupted preemptively.
#[derive(Debug, Clone, Default)]
pub struct CancellationSignal {
    cancelled: Arc<AtomicBool>,
}

impl CancellationSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let signal = CancellationSignal::new();
        let handle = signal.clone();
        assert!(!handle.is_cancelled());
        signal.cancel();
        assert!(handle.is_cancelled());
    }
}
