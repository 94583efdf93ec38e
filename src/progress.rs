//! Stage-scoped percentage reporting.
//!
//! Adapters are the only writers of the percentage; readers watch the latest
//! value. Within a stage the reported value never decreases.

use std::sync::Arc;
use tokio::sync::watch;

/// Integer percentage of `transferred` over `total`, clamped to 0..=100.
/// An unknown (zero) total reports 0.
pub fn percent_of(transferred: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (transferred as u128 * 100) / total as u128;
    pct.min(100) as u8
}

#[derive(Clone)]
pub struct ProgressReporter {
    tx: Arc<watch::Sender<u8>>,
}

impl ProgressReporter {
    pub fn new() -> (Self, watch::Receiver<u8>) {
        let (tx, rx) = watch::channel(0);
        (Self { tx: Arc::new(tx) }, rx)
    }

    /// Reporter with no readers; updates are dropped.
    pub fn detached() -> Self {
        Self::new().0
    }

    pub fn subscribe(&self) -> watch::Receiver<u8> {
        self.tx.subscribe()
    }

    /// Publish a percentage. Values below the current one are ignored.
    pub fn set(&self, percent: u8) {
        let percent = percent.min(100);
        self.tx.send_if_modified(|current| {
            if percent > *current {
                *current = percent;
                true
            } else {
                false
            }
        });
    }

    pub fn bytes(&self, transferred: u64, total: u64) {
        self.set(percent_of(transferred, total));
    }

    /// Start a new stage at 0%.
    pub fn reset(&self) {
        self.tx.send_replace(0);
    }

    pub fn current(&self) -> u8 {
        *self.tx.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_of_bounds() {
        assert_eq!(percent_of(0, 100), 0);
        assert_eq!(percent_of(50, 200), 25);
        assert_eq!(percent_of(200, 200), 100);
        assert_eq!(percent_of(300, 200), 100);
        assert_eq!(percent_of(10, 0), 0);
        assert_eq!(percent_of(u64::MAX, u64::MAX), 100);
    }

    #[test]
    fn test_monotonic_for_monotonic_bytes() {
        let (reporter, rx) = ProgressReporter::new();
        let total = 7_919;
        let mut last = 0;
        for transferred in (0..=total).step_by(13) {
            reporter.bytes(transferred, total);
            let now = *rx.borrow();
            assert!(now >= last, "{now} < {last} at {transferred}");
            last = now;
        }
        reporter.bytes(total, total);
        assert_eq!(*rx.borrow(), 100);
    }

    #[test]
    fn test_lower_values_are_ignored_until_reset() {
        let (reporter, rx) = ProgressReporter::new();
        reporter.set(60);
        reporter.set(40);
        assert_eq!(*rx.borrow(), 60);

        reporter.reset();
        assert_eq!(reporter.current(), 0);
        reporter.set(5);
        assert_eq!(*rx.borrow(), 5);
    }

    #[tokio::test]
    async fn test_reader_sees_latest_value() {
        let (reporter, mut rx) = ProgressReporter::new();
        for p in [10, 20, 30] {
            reporter.set(p);
        }
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 30);
    }
}
