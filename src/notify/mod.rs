//! Notification bus.
//!
//! One short-lived, user-facing status message at a time. Emitting replaces
//! whatever is visible and restarts the auto-dismiss timer; there is no queue,
//! so messages emitted faster than the display duration are simply dropped.
//! Purely advisory: nothing reads a notification to make a decision.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;

use crate::config::NOTIFICATION_TTL;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
}

/// A visible status message.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
}

#[derive(Default)]
struct NotifierInner {
    current: Mutex<Option<Notification>>,
    // Bumped on every emit; a dismiss timer only clears the slot if its
    // generation is still the latest.
    generation: AtomicU64,
}

/// Cheaply cloneable handle to the single notification slot.
#[derive(Clone)]
pub struct Notifier {
    inner: Arc<NotifierInner>,
    ttl: Duration,
}

impl Notifier {
    pub fn new() -> Self {
        Self::with_ttl(NOTIFICATION_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(NotifierInner::default()),
            ttl,
        }
    }

    /// Show a message, superseding the current one and restarting the
    /// fixed-duration dismiss timer.
    pub fn emit(&self, message: impl Into<String>, kind: NotificationKind) {
        let notification = Notification {
            message: message.into(),
            kind,
        };

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.inner.current.lock().expect("notifier lock poisoned") = Some(notification);

        let inner = Arc::clone(&self.inner);
        let ttl = self.ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            if inner.generation.load(Ordering::SeqCst) == generation {
                *inner.current.lock().expect("notifier lock poisoned") = None;
            }
        });
    }

    /// The currently visible notification, if any.
    pub fn current(&self) -> Option<Notification> {
        self.inner
            .current
            .lock()
            .expect("notifier lock poisoned")
            .clone()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}
