//! Shared request pacing across concurrent collection tasks.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Serializes request starts so that successive API calls are at least
/// `interval` apart, no matter how many tasks share the pacer.
///
/// The mutex is held across the sleep, so waiters queue up and are
/// released one interval at a time.
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    next_allowed: Mutex<Instant>,
}

impl Pacer {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Pacer {
            interval,
            next_allowed: Mutex::new(Instant::now()),
        }
    }

    /// Waits until the shared interval admits another request start.
    pub async fn wait(&self) {
        if self.interval.is_zero() {
            return;
        }
        let mut next_allowed = self.next_allowed.lock().await;
        let now = Instant::now();
        if *next_allowed > now {
            tokio::time::sleep_until(*next_allowed).await;
        }
        *next_allowed = Instant::now() + self.interval;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Assertions below are lower bounds only, so scheduler delays cannot
    // make them flaky.

    #[tokio::test]
    async fn spaces_out_consecutive_requests() {
        let pacer = Pacer::new(Duration::from_millis(30));
        let start = Instant::now();
        pacer.wait().await;
        pacer.wait().await;
        pacer.wait().await;
        assert!(
            start.elapsed() >= Duration::from_millis(60),
            "three paced requests should span two intervals, got {:?}",
            start.elapsed()
        );
    }

    #[tokio::test]
    async fn concurrent_waiters_are_serialized() {
        use std::sync::Arc;

        let pacer = Arc::new(Pacer::new(Duration::from_millis(20)));
        let start = Instant::now();
        let mut handles = Vec::new();
        for _ in 0..4 {
            let pacer = Arc::clone(&pacer);
            handles.push(tokio::spawn(async move { pacer.wait().await }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert!(
            start.elapsed() >= Duration::from_millis(60),
            "four waiters should span three intervals, got {:?}",
            start.elapsed()
        );
    }

    #[tokio::test]
    async fn zero_interval_never_sleeps() {
        let pacer = Pacer::new(Duration::ZERO);
        let start = Instant::now();
        for _ in 0..10 {
            pacer.wait().await;
        }
        assert!(start.elapsed() < Duration::from_millis(100));
    }
}
