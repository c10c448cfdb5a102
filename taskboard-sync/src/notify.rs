//! Failure notices
//!
//! Every failed task mutation raises one uniform notice naming the action,
//! with a generic retry prompt. Nothing is retried automatically.

use std::fmt;
use tokio::sync::mpsc;

/// Task mutation that can fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
    Move,
}

impl MutationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::Create => "create",
            MutationKind::Update => "update",
            MutationKind::Delete => "delete",
            MutationKind::Move => "move",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-facing notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub action: MutationKind,
    pub title: String,
    pub message: String,

    /// Store message, for logs
    pub detail: Option<String>,
}

impl Notice {
    /// Standard failure notice for an action
    pub fn failure(action: MutationKind, detail: Option<String>) -> Self {
        Notice {
            action,
            title: "Error".to_string(),
            message: format!("Failed to {} task. Please try again.", action),
            detail,
        }
    }
}

/// Sink for notices
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Logs notices as warnings
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        tracing::warn!(
            action = %notice.action,
            detail = ?notice.detail,
            "{}",
            notice.message
        );
    }
}

/// Forwards notices to a channel
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notice>,
}

impl ChannelNotifier {
    /// Creates a notifier and the receiving end of its channel
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelNotifier { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notice: Notice) {
        if self.tx.send(notice).is_err() {
            tracing::debug!("Notice dropped, receiver closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_message_names_action() {
        let notice = Notice::failure(MutationKind::Move, None);
        assert_eq!(notice.message, "Failed to move task. Please try again.");
        assert_eq!(notice.title, "Error");
    }

    #[test]
    fn test_channel_notifier_delivers() {
        let (notifier, mut rx) = ChannelNotifier::channel();
        notifier.notify(Notice::failure(MutationKind::Delete, Some("boom".to_string())));

        let notice = rx.try_recv().unwrap();
        assert_eq!(notice.action, MutationKind::Delete);
        assert_eq!(notice.detail.as_deref(), Some("boom"));
    }
}
