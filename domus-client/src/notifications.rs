//! User-facing notifications raised by failed loads.

use crate::resources::ResourceKind;
use chrono::{DateTime, Utc};
use domus_core::{EntityId, FetchError, HierarchyLevel};
use std::collections::VecDeque;

const MAX_NOTIFICATIONS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
    Success,
}

/// Follow-up the user can trigger from a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationAction {
    /// Forced refetch of a list.
    Retry(ResourceKind),
    /// Repeat a selection that failed to load.
    Reselect { level: HierarchyLevel, id: EntityId },
    Dismiss,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub action: Option<NotificationAction>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            action: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_action(mut self, action: NotificationAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn list_failed(kind: ResourceKind, error: &FetchError) -> Self {
        Self::new(
            NotificationLevel::Error,
            format!("Failed to load {}: {}", kind.section().title(), error),
        )
        .with_action(NotificationAction::Retry(kind))
    }
}

/// Bounded queue, newest last.
#[derive(Debug, Clone, Default)]
pub struct Notifications {
    items: VecDeque<Notification>,
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, notification: Notification) {
        if self.items.len() == MAX_NOTIFICATIONS {
            self.items.pop_front();
        }
        self.items.push_back(notification);
    }

    pub fn latest(&self) -> Option<&Notification> {
        self.items.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn drain(&mut self) -> Vec<Notification> {
        self.items.drain(..).collect()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_failure_offers_retry() {
        let n = Notification::list_failed(
            ResourceKind::BlockList,
            &FetchError::Transport("timeout".to_string()),
        );
        assert_eq!(n.level, NotificationLevel::Error);
        assert_eq!(n.action, Some(NotificationAction::Retry(ResourceKind::BlockList)));
        assert!(n.message.contains("Blocks"));
    }

    #[test]
    fn test_queue_is_bounded() {
        let mut queue = Notifications::new();
        for i in 0..(MAX_NOTIFICATIONS + 5) {
            queue.push(Notification::new(NotificationLevel::Info, i.to_string()));
        }
        assert_eq!(queue.len(), MAX_NOTIFICATIONS);
        assert_eq!(queue.iter().next().map(|n| n.message.as_str()), Some("5"));
        assert_eq!(
            queue.latest().map(|n| n.message.clone()),
            Some((MAX_NOTIFICATIONS + 4).to_string())
        );
        assert_eq!(queue.drain().len(), MAX_NOTIFICATIONS);
        assert!(queue.is_empty());
    }
}
