//! Transient user feedback

use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

/// How a notification is styled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A message to flash at the user
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
    /// Hide after this long; `None` leaves the default to the renderer
    pub auto_hide: Option<Duration>,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Info,
            auto_hide: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Error,
            auto_hide: None,
        }
    }

    pub fn auto_hide(mut self, after: Duration) -> Self {
        self.auto_hide = Some(after);
        self
    }
}

/// The notification primitive of the rendering surface
pub trait Notifier: Send + Sync + fmt::Debug {
    fn notify(&self, notification: &Notification);
}

/// Writes notifications to the log; used when no UI is attached
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: &Notification) {
        match notification.severity {
            Severity::Info => tracing::info!("{}", notification.message),
            Severity::Error => tracing::warn!("{}", notification.message),
        }
    }
}

/// Keeps the most recent notifications in memory
#[derive(Debug)]
pub struct MemoryNotifier {
    history: Mutex<VecDeque<Notification>>,
    max_size: usize,
}

impl MemoryNotifier {
    pub fn new(max_size: usize) -> Self {
        Self {
            history: Mutex::new(VecDeque::with_capacity(max_size)),
            max_size,
        }
    }

    /// Oldest first
    pub fn history(&self) -> Vec<Notification> {
        self.lock().iter().cloned().collect()
    }

    pub fn last(&self) -> Option<Notification> {
        self.lock().back().cloned()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Notification>> {
        // A poisoned history is still a usable history
        self.history.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MemoryNotifier {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notification: &Notification) {
        let mut history = self.lock();
        if history.len() >= self.max_size {
            history.pop_front();
        }
        history.push_back(notification.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_respects_max_size() {
        let notifier = MemoryNotifier::new(2);
        for i in 0..5 {
            notifier.notify(&Notification::info(format!("msg{}", i)));
        }
        let history = notifier.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].message, "msg3");
        assert_eq!(history[1].message, "msg4");
    }

    #[test]
    fn builders_set_severity_and_delay() {
        let n = Notification::error("failure to add").auto_hide(Duration::from_secs(1));
        assert_eq!(n.severity, Severity::Error);
        assert_eq!(n.auto_hide, Some(Duration::from_secs(1)));
        assert_eq!(Notification::info("added").auto_hide, None);
    }

    #[test]
    fn last_returns_newest() {
        let notifier = MemoryNotifier::default();
        assert!(notifier.last().is_none());
        notifier.notify(&Notification::info("first"));
        notifier.notify(&Notification::error("second"));
        assert_eq!(notifier.last().unwrap().message, "second");
        notifier.clear();
        assert!(notifier.history().is_empty());
    }
}
