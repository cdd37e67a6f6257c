//! Transient success/error notifications, one slot per entity kind.

use crate::schema::EntityKind;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Fixed lifetime of every notification.
pub const MESSAGE_TTL: Duration = Duration::from_secs(10);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageLevel {
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TransientMessage {
    pub level: MessageLevel,
    pub text: String,
    pub expires_at: Instant,
}

impl TransientMessage {
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Posting a message replaces whatever the kind was showing.
#[derive(Debug, Default)]
pub struct MessageBoard {
    slots: HashMap<EntityKind, TransientMessage>,
}

impl MessageBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&mut self, kind: EntityKind, level: MessageLevel, text: impl Into<String>) {
        let text = text.into();
        tracing::debug!(kind = %kind, ?level, text = %text, "message posted");
        self.slots.insert(
            kind,
            TransientMessage {
                level,
                text,
                expires_at: Instant::now() + MESSAGE_TTL,
            },
        );
    }

    /// The live message for `kind`, if it has not expired.
    pub fn current(&self, kind: EntityKind) -> Option<&TransientMessage> {
        let now = Instant::now();
        self.slots.get(&kind).filter(|m| !m.is_expired_at(now))
    }

    pub fn prune(&mut self) {
        let now = Instant::now();
        self.slots.retain(|_, m| !m.is_expired_at(now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn messages_expire_after_ten_seconds() {
        let mut board = MessageBoard::new();
        board.post(EntityKind::Product, MessageLevel::Success, "Product added successfully");
        tokio::time::advance(Duration::from_millis(9_999)).await;
        assert!(board.current(EntityKind::Product).is_some());
        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(board.current(EntityKind::Product).is_none());
        board.prune();
        assert!(board.slots.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn newer_message_replaces_older() {
        let mut board = MessageBoard::new();
        board.post(EntityKind::Store, MessageLevel::Success, "first");
        tokio::time::advance(Duration::from_secs(8)).await;
        board.post(EntityKind::Store, MessageLevel::Error, "second");
        tokio::time::advance(Duration::from_secs(8)).await;
        let m = board.current(EntityKind::Store).unwrap();
        assert_eq!(m.text, "second");
        assert_eq!(m.level, MessageLevel::Error);
        assert!(board.current(EntityKind::Customer).is_none());
    }
}
