//! Second-look policy for presence reads.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

/// How to treat a presence read that implies something drastic.
///
/// Presence is eventually consistent: a member that just entered (or is
/// about to re-enter) can be missing from one read. Anything that acts on
/// a read — tearing a room down, rejecting a seat claim — must therefore
/// give the set one settle interval to catch up and read again before
/// concluding. A single stale read never triggers teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmPolicy {
    /// Wait between a suspect first read and the confirming re-read. The
    /// same interval is used wherever the system pauses for presence to
    /// propagate.
    pub settle: Duration,
}

impl Default for ConfirmPolicy {
    fn default() -> Self {
        Self {
            settle: Duration::from_secs(2),
        }
    }
}

impl ConfirmPolicy {
    /// A policy with a custom settle interval.
    pub fn with_settle(settle: Duration) -> Self {
        Self { settle }
    }

    /// Waits one settle interval. Used after presence writes that later
    /// reads need to observe, not just before re-reads.
    pub async fn wait(&self) {
        sleep(self.settle).await;
    }

    /// Runs `probe`; if `suspect` holds for the result, sleeps one settle
    /// interval and returns a single re-probe's result instead.
    ///
    /// The second read is final either way — there is no third. Probe
    /// errors propagate immediately without a retry.
    pub async fn confirm<T, E, P, Fut, S>(&self, mut probe: P, suspect: S) -> Result<T, E>
    where
        P: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        S: Fn(&T) -> bool,
    {
        let first = probe().await?;
        if !suspect(&first) {
            return Ok(first);
        }
        debug!(settle_ms = self.settle.as_millis() as u64, "suspect read, re-sampling");
        sleep(self.settle).await;
        probe().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    /// Probe that returns how many times it has been called: 1, 2, ...
    fn counting_probe(
        calls: &AtomicUsize,
    ) -> impl FnMut() -> std::future::Ready<Result<usize, io::Error>> + '_ {
        || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            std::future::ready(Ok(n))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirm_healthy_first_read_returns_immediately() {
        let policy = ConfirmPolicy::default();
        let calls = AtomicUsize::new(0);
        let start = Instant::now();

        let value = policy
            .confirm(counting_probe(&calls), |_| false)
            .await
            .unwrap();

        assert_eq!(value, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirm_suspect_read_waits_and_resamples_once() {
        let policy = ConfirmPolicy::default();
        let calls = AtomicUsize::new(0);
        let start = Instant::now();

        // First read (1) is suspect, second read (2) is healthy.
        let value = policy
            .confirm(counting_probe(&calls), |n| *n == 1)
            .await
            .unwrap();

        assert_eq!(value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(start.elapsed() >= policy.settle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirm_second_read_is_final_even_when_suspect() {
        let policy = ConfirmPolicy::default();
        let calls = AtomicUsize::new(0);

        let value = policy
            .confirm(counting_probe(&calls), |_| true)
            .await
            .unwrap();

        // Still the second read's value, and no third probe.
        assert_eq!(value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirm_propagates_probe_errors_without_retry() {
        let policy = ConfirmPolicy::default();
        let calls = AtomicUsize::new(0);

        let result: Result<usize, io::Error> = policy
            .confirm(
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    std::future::ready(Err(io::Error::other("presence down")))
                },
                |_| true,
            )
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_settle_overrides_interval() {
        let policy = ConfirmPolicy::with_settle(Duration::from_millis(50));
        let calls = AtomicUsize::new(0);
        let start = Instant::now();

        policy
            .confirm(counting_probe(&calls), |n| *n == 1)
            .await
            .unwrap();

        assert_eq!(start.elapsed(), Duration::from_millis(50));
    }
}
