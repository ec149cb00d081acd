use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// One-way stop flag shared by the supervisor and every worker
///
/// Starts unset, can be set exactly once, never resets. Clones observe the
/// same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationSignal {
    token: CancellationToken,
    flipped: Arc<AtomicBool>,
}

impl CancellationSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag. Returns `true` only for the call that flipped it.
    pub fn cancel(&self) -> bool {
        if self.flipped.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.token.cancel();
        true
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the flag is set
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// Sleep for `duration`, waking early on cancellation
    ///
    /// Returns `true` if the sleep was cut short.
    pub async fn sleep(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.token.cancelled() => true,
            _ = tokio::time::sleep(duration) => self.token.is_cancelled(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_is_one_way() {
        let signal = CancellationSignal::new();
        let observer = signal.clone();
        assert!(!observer.is_cancelled());

        assert!(signal.cancel());
        assert!(!signal.cancel());
        assert!(observer.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_wakes_on_cancel() {
        let signal = CancellationSignal::new();
        let waiter = signal.clone();
        let handle = tokio::spawn(async move { waiter.sleep(Duration::from_secs(3600)).await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        signal.cancel();

        let woke_early = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sleep should end promptly")
            .unwrap();
        assert!(woke_early);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_runs_full_duration() {
        let signal = CancellationSignal::new();
        assert!(!signal.sleep(Duration::from_secs(5)).await);
    }
}
