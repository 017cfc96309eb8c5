//! User-visible error notifications.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::{ApiError, ErrorKind};

/// Receives classified errors for display to the user.
pub trait Notifier: Send + Sync {
    /// Shows a transient notification for the error.
    fn notify(&self, error: &ApiError);
}

/// Notifier that writes errors to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, error: &ApiError) {
        warn!(kind = %error.kind, status = ?error.status, "{}", error.message);
    }
}

/// Suppresses repeated notifications for the same failure.
///
/// A notification is forwarded for the first error of a given class and
/// status; repeats are swallowed until the window passes without one.
pub struct NotificationGate {
    notifier: Arc<dyn Notifier>,
    window: Duration,
    last_seen: Mutex<HashMap<(ErrorKind, Option<u16>), Instant>>,
}

impl std::fmt::Debug for NotificationGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationGate")
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

impl NotificationGate {
    /// Creates a gate in front of `notifier`.
    #[must_use]
    pub fn new(notifier: Arc<dyn Notifier>, window: Duration) -> Self {
        Self {
            notifier,
            window,
            last_seen: Mutex::new(HashMap::new()),
        }
    }

    /// Reports an error; returns whether the notifier was called.
    pub fn report(&self, error: &ApiError) -> bool {
        let now = Instant::now();
        let key = (error.kind, error.status);
        let forward = {
            let mut last_seen = self.last_seen.lock().unwrap_or_else(PoisonError::into_inner);
            let forward = last_seen
                .get(&key)
                .is_none_or(|seen| now.duration_since(*seen) >= self.window);
            last_seen.insert(key, now);
            last_seen.retain(|_, seen| now.duration_since(*seen) < self.window);
            forward
        };

        if forward {
            self.notifier.notify(error);
        } else {
            debug!("Suppressed repeated {} notification", error.kind);
        }
        forward
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Default)]
    struct Counting(AtomicUsize);

    impl Notifier for Counting {
        fn notify(&self, _error: &ApiError) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_is_notified_once() {
        let counter = Arc::new(Counting::default());
        let gate = NotificationGate::new(counter.clone(), Duration::from_secs(3));
        let err = ApiError::from_response(500, b"");

        assert!(gate.report(&err));
        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(!gate.report(&err));
        tokio::time::advance(Duration::from_secs(2)).await;
        // Still inside the window measured from the last repeat
        assert!(!gate.report(&err));
        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(gate.report(&err));

        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_statuses_are_notified_separately() {
        let counter = Arc::new(Counting::default());
        let gate = NotificationGate::new(counter.clone(), Duration::from_secs(3));

        assert!(gate.report(&ApiError::from_response(404, b"")));
        assert!(gate.report(&ApiError::from_response(500, b"")));
        assert!(gate.report(&ApiError::network("refused")));
        assert!(!gate.report(&ApiError::from_response(404, b"")));

        assert_eq!(counter.0.load(Ordering::SeqCst), 3);
    }
}
