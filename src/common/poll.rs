//! Bounded polling with a wall-clock deadline

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

/// Poll `condition` until it returns true or `give_up_after` has elapsed.
///
/// The condition is checked immediately, then every `interval`. The last
/// sleep is clipped to the deadline and one final check is made there, so a
/// condition that becomes true just before the deadline is still observed.
/// Returns whether the condition was met.
pub async fn wait_until<F, Fut>(
    mut condition: F,
    give_up_after: Duration,
    interval: Duration,
) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + give_up_after;

    loop {
        if condition().await {
            return true;
        }

        let now = Instant::now();
        if now >= deadline {
            return false;
        }

        tokio::time::sleep(interval.min(deadline - now)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_condition_met_immediately() {
        let start = Instant::now();
        let met = wait_until(
            || async { true },
            Duration::from_secs(10),
            Duration::from_millis(100),
        )
        .await;
        assert!(met);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_condition_met_just_before_deadline() {
        let start = Instant::now();
        let met = wait_until(
            move || async move { start.elapsed() >= Duration::from_millis(9_900) },
            Duration::from_secs(10),
            Duration::from_millis(100),
        )
        .await;
        assert!(met);
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_at_deadline() {
        let checks = Arc::new(AtomicU32::new(0));
        let counter = checks.clone();
        let start = Instant::now();

        let met = wait_until(
            move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    false
                }
            },
            Duration::from_secs(10),
            Duration::from_millis(300),
        )
        .await;

        assert!(!met);
        assert_eq!(start.elapsed(), Duration::from_secs(10));
        // 0ms, 300ms, ..., 9900ms, then the final check at 10s
        assert_eq!(checks.load(Ordering::SeqCst), 35);
    }
}
