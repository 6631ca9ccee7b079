//! # Message Router
//!
//! Relationship-gated message delivery.
//!
//! Direct messages require the sender and receiver to be mutual friends;
//! group messages require current membership. A delivered direct message is
//! appended to both participants' histories in one transaction, so the two
//! views can never disagree.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::friends::FriendService;
use crate::storage::{Database, MessageRecord};

/// A delivered message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Message id
    pub id: String,
    /// Sender nickname
    pub sender: String,
    /// Receiver nickname, or the group id for group messages
    pub receiver: String,
    /// Set only for group messages
    pub group_id: Option<String>,
    /// Message body
    pub content: String,
    /// Send timestamp (ms)
    pub timestamp: i64,
}

impl Message {
    pub(crate) fn from_record(record: MessageRecord) -> Self {
        Self {
            id: record.id,
            sender: record.sender,
            receiver: record.receiver,
            group_id: record.group_id,
            content: record.content,
            timestamp: record.timestamp,
        }
    }
}

/// Relationship-gated message delivery service
pub struct MessageRouter {
    db: Arc<Database>,
}

impl MessageRouter {
    /// Create a new message router
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Send a direct message
    ///
    /// The receiver must exist and be a mutual friend of the sender. On
    /// success the message lands in both histories atomically.
    pub fn send_direct(&self, sender: &str, receiver: &str, content: &str) -> Result<Message> {
        if content.is_empty() {
            return Err(Error::InvalidArgument("message content must not be empty".into()));
        }
        if !self.db.account_exists(receiver)? {
            return Err(Error::UnknownUser(receiver.to_string()));
        }

        let friends = FriendService::new(self.db.clone());
        if !friends.are_friends(sender, receiver)? {
            return Err(Error::NotFriends);
        }

        let record = MessageRecord {
            id: uuid::Uuid::new_v4().to_string(),
            sender: sender.to_string(),
            receiver: receiver.to_string(),
            group_id: None,
            content: content.to_string(),
            timestamp: crate::time::now_timestamp_millis(),
        };
        self.db.insert_direct_message(&record)?;

        tracing::info!("Direct message {} delivered: {} -> {}", record.id, sender, receiver);

        Ok(Message::from_record(record))
    }

    /// Send a message to a group
    ///
    /// The group must exist and the sender must be a current member.
    pub fn send_to_group(&self, sender: &str, group_id: &str, content: &str) -> Result<Message> {
        if content.is_empty() {
            return Err(Error::InvalidArgument("message content must not be empty".into()));
        }
        if self.db.get_group(group_id)?.is_none() {
            return Err(Error::GroupNotFound(group_id.to_string()));
        }
        if !self.db.is_group_member(group_id, sender)? {
            return Err(Error::NotMember);
        }

        let record = MessageRecord {
            id: uuid::Uuid::new_v4().to_string(),
            sender: sender.to_string(),
            receiver: group_id.to_string(),
            group_id: Some(group_id.to_string()),
            content: content.to_string(),
            timestamp: crate::time::now_timestamp_millis(),
        };
        self.db.insert_group_message(&record)?;

        tracing::info!("Group message {} delivered: {} -> {}", record.id, sender, group_id);

        Ok(Message::from_record(record))
    }

    /// An account's full direct-message history, in append order
    pub fn history(&self, nickname: &str) -> Result<Vec<Message>> {
        Ok(self
            .db
            .history_for(nickname)?
            .into_iter()
            .map(Message::from_record)
            .collect())
    }

    /// The direct messages exchanged between two accounts, in append order
    ///
    /// A pure filter over the first account's history: no friendship check,
    /// so histories predating a broken friendship remain readable.
    pub fn history_between(&self, nickname: &str, counterpart: &str) -> Result<Vec<Message>> {
        Ok(self
            .db
            .history_between(nickname, counterpart)?
            .into_iter()
            .map(Message::from_record)
            .collect())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup() -> (Arc<Database>, MessageRouter) {
        let db = Arc::new(Database::open(None).await.unwrap());
        for nick in ["alice", "bob", "carol", "dave"] {
            db.insert_account(nick, &format!("{}@example.com", nick), "hash")
                .unwrap();
        }
        let router = MessageRouter::new(db.clone());
        (db, router)
    }

    fn befriend(db: &Database, a: &str, b: &str) {
        db.create_friend_request(&uuid::Uuid::new_v4().to_string(), a, b)
            .unwrap();
        db.accept_friend_request(a, b).unwrap();
    }

    #[tokio::test]
    async fn test_friends_can_exchange_messages() {
        let (db, router) = setup().await;
        befriend(&db, "alice", "bob");

        let message = router.send_direct("alice", "bob", "hi").unwrap();
        assert_eq!(message.content, "hi");
        assert!(message.group_id.is_none());

        let between = router.history_between("alice", "bob").unwrap();
        assert_eq!(between.len(), 1);
        assert_eq!(between[0].content, "hi");

        // Same conversation from bob's side.
        let between = router.history_between("bob", "alice").unwrap();
        assert_eq!(between.len(), 1);
    }

    #[tokio::test]
    async fn test_non_friends_are_blocked() {
        let (_db, router) = setup().await;

        let err = router.send_direct("carol", "dave", "hello?").unwrap_err();
        assert!(matches!(err, Error::NotFriends));

        assert!(router.history("carol").unwrap().is_empty());
        assert!(router.history("dave").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_receiver_and_empty_content() {
        let (db, router) = setup().await;
        befriend(&db, "alice", "bob");

        let err = router.send_direct("alice", "ghost", "hi").unwrap_err();
        assert!(matches!(err, Error::UnknownUser(_)));

        let err = router.send_direct("alice", "bob", "").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_history_between_filters_other_conversations() {
        let (db, router) = setup().await;
        befriend(&db, "alice", "bob");
        befriend(&db, "alice", "carol");

        router.send_direct("alice", "bob", "to bob").unwrap();
        router.send_direct("alice", "carol", "to carol").unwrap();
        router.send_direct("bob", "alice", "from bob").unwrap();

        let with_bob = router.history_between("alice", "bob").unwrap();
        let contents: Vec<_> = with_bob.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["to bob", "from bob"]);

        assert_eq!(router.history("alice").unwrap().len(), 3);
        assert_eq!(router.history("bob").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_group_send_requires_membership() {
        let (db, router) = setup().await;
        db.create_group("g1", "trip", "alice", 0, &["alice".to_string()])
            .unwrap();

        let message = router.send_to_group("alice", "g1", "anyone here?").unwrap();
        assert_eq!(message.group_id.as_deref(), Some("g1"));

        let err = router.send_to_group("bob", "g1", "let me in").unwrap_err();
        assert!(matches!(err, Error::NotMember));

        let err = router.send_to_group("alice", "missing", "hello").unwrap_err();
        assert!(matches!(err, Error::GroupNotFound(_)));

        assert_eq!(db.group_messages("g1").unwrap().len(), 1);
    }
}
