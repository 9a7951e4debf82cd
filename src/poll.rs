//! Bounded polling for conditions without a completion event.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

/// Poll `predicate` at a fixed `interval` up to `max_attempts` times.
///
/// Returns `true` as soon as the predicate holds, `false` once the attempts
/// are exhausted. The predicate is checked before each sleep, so an already
/// true condition resolves without waiting.
///
/// `sleep` is injected so tests can run without wall-clock delays; production
/// callers pass `tokio::time::sleep`.
pub(crate) async fn poll_until<P, S, F>(
    mut predicate: P,
    mut sleep: S,
    interval: Duration,
    max_attempts: u32,
) -> bool
where
    P: FnMut() -> bool,
    S: FnMut(Duration) -> F,
    F: Future<Output = ()>,
{
    for attempt in 0..max_attempts {
        if predicate() {
            debug!("Poll condition met after {} attempts", attempt);
            return true;
        }
        sleep(interval).await;
    }

    debug!("Poll condition not met within {} attempts", max_attempts);
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn no_sleep(_: Duration) -> std::future::Ready<()> {
        std::future::ready(())
    }

    #[tokio::test]
    async fn test_immediate_success_skips_sleeping() {
        let sleeps = AtomicU32::new(0);
        let result = poll_until(
            || true,
            |d| {
                sleeps.fetch_add(1, Ordering::SeqCst);
                no_sleep(d)
            },
            Duration::from_millis(10),
            50,
        )
        .await;

        assert!(result);
        assert_eq!(sleeps.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_resolves_once_predicate_flips() {
        let checks = AtomicU32::new(0);
        let result = poll_until(
            || checks.fetch_add(1, Ordering::SeqCst) >= 3,
            no_sleep,
            Duration::from_millis(10),
            50,
        )
        .await;

        assert!(result);
        assert_eq!(checks.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let sleeps = AtomicU32::new(0);
        let result = poll_until(
            || false,
            |d| {
                sleeps.fetch_add(1, Ordering::SeqCst);
                no_sleep(d)
            },
            Duration::from_millis(10),
            50,
        )
        .await;

        assert!(!result);
        assert_eq!(sleeps.load(Ordering::SeqCst), 50);
    }
}
