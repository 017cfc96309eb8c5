//! Desktop notifications for failed requests.

use marketledger_api::{ApiError, Notifier, Redirect};
use notify_rust::Notification;
use tracing::{debug, warn};

/// Shows request failures as desktop notifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, error: &ApiError) {
        let summary = match error.redirect() {
            Some(Redirect::Login) => "Please sign in again",
            Some(Redirect::Forbidden) => "Access denied",
            Some(Redirect::NotFound) => "Not found",
            Some(Redirect::ServerError) => "Server error",
            None => "Request failed",
        };

        let shown = Notification::new()
            .appname("MarketLedger")
            .summary(summary)
            .body(&error.message)
            .show();
        match shown {
            Ok(_) => debug!("Notified: {summary}: {}", error.message),
            Err(e) => warn!("Desktop notification failed ({e}): {summary}: {}", error.message),
        }
    }
}
