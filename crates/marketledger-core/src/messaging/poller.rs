//! Cancellable periodic tasks.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Shortest period a poller will run at.
const MIN_PERIOD: Duration = Duration::from_millis(100);

/// A spawned loop that calls `tick` on a fixed period until stopped.
///
/// Dropping the poller cancels the loop and aborts any tick in progress.
pub(crate) struct Poller {
    name: &'static str,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Poller {
    /// Spawns the loop. With `immediate` the first tick runs right away,
    /// otherwise after one period. The loop ends when `tick` returns `false`.
    pub fn spawn<F, Fut>(name: &'static str, period: Duration, immediate: bool, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        let period = period.max(MIN_PERIOD);
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let start = if immediate {
                Instant::now()
            } else {
                Instant::now() + period
            };
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = interval.tick() => {
                        tokio::select! {
                            () = token.cancelled() => break,
                            keep_going = tick() => {
                                if !keep_going {
                                    break;
                                }
                            }
                        }
                    }
                }
            }
            debug!("{name} poller finished");
        });

        debug!("{name} poller started ({period:?})");
        Self {
            name,
            cancel,
            handle,
        }
    }

    /// Whether the loop is still running.
    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled() && !self.handle.is_finished()
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.handle.abort();
        debug!("{} poller stopped", self.name);
    }
}
