//! Transient notification banner.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    expires_at: Instant,
}

/// Holds at most one banner; a new one replaces the old. Banners expire on
/// their own and can be dismissed early.
#[derive(Debug)]
pub struct NotificationCenter {
    ttl: Duration,
    current: Mutex<Option<Notification>>,
}

impl NotificationCenter {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            current: Mutex::new(None),
        }
    }

    pub fn show(&self, kind: NotificationKind, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(?kind, %message, "Notification");
        *self.current.lock() = Some(Notification {
            kind,
            message,
            expires_at: Instant::now() + self.ttl,
        });
    }

    /// The visible banner, if it has not expired
    pub fn current(&self) -> Option<Notification> {
        let mut current = self.current.lock();
        if current
            .as_ref()
            .is_some_and(|n| Instant::now() >= n.expires_at)
        {
            *current = None;
        }
        current.clone()
    }

    pub fn dismiss(&self) {
        self.current.lock().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_notification_expires_after_ttl() {
        let center = NotificationCenter::new(Duration::from_secs(6));
        center.show(NotificationKind::Error, "Unable to join");
        assert_eq!(center.current().unwrap().message, "Unable to join");

        tokio::time::advance(Duration::from_millis(5_999)).await;
        assert!(center.current().is_some());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(center.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_and_replace() {
        let center = NotificationCenter::new(Duration::from_secs(6));
        center.show(NotificationKind::Info, "first");
        center.show(NotificationKind::Warning, "second");
        assert_eq!(center.current().unwrap().kind, NotificationKind::Warning);

        center.dismiss();
        assert!(center.current().is_none());
    }
}
