//! # Friend Requests
//!
//! Friend-request lifecycle and the symmetric friendship graph.
//!
//! ## Request State Machine
//!
//! ```text
//!                 send_request(sender, receiver)
//!                              │
//!                              ▼
//!                        ┌──────────┐
//!                        │ Pending  │──────── duplicate send / reciprocal
//!                        └──────────┘          send is rejected while here
//!                              │
//!              accept_request(sender, receiver)
//!                              │
//!                              ▼
//!                        ┌──────────┐
//!                        │ Accepted │───► friendships: sender ↔ receiver
//!                        └──────────┘      (both adjacency rows, one tx)
//! ```
//!
//! There is no rejection or cancellation: a pending request stays pending
//! until accepted. Acceptance flips the status and links both adjacency
//! rows atomically, so the graph is symmetric by construction.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::storage::{Database, FriendRequestRecord};

/// Lifecycle state of a friend request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Sent, awaiting the receiver's acceptance
    Pending,
    /// Accepted; the friendship rows exist
    Accepted,
}

impl RequestStatus {
    /// Stored string form
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
        }
    }

    fn parse(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "accepted" => Ok(RequestStatus::Accepted),
            other => Err(Error::Internal(format!("unknown request status: {}", other))),
        }
    }
}

/// A friend request between two accounts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendRequest {
    /// Request id
    pub id: String,
    /// Nickname that sent the request
    pub sender: String,
    /// Nickname the request is addressed to
    pub receiver: String,
    /// Current lifecycle state
    pub status: RequestStatus,
    /// Creation timestamp
    pub created_at: i64,
}

impl FriendRequest {
    fn from_record(record: FriendRequestRecord) -> Result<Self> {
        Ok(Self {
            id: record.id,
            sender: record.sender,
            receiver: record.receiver,
            status: RequestStatus::parse(&record.status)?,
            created_at: record.created_at,
        })
    }
}

/// Friend-request lifecycle service
pub struct FriendService {
    db: Arc<Database>,
}

impl FriendService {
    /// Create a new friend service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Send a friend request from one nickname to another
    ///
    /// Rejected when the sender targets themself, the receiver does not
    /// exist, a request already exists in this direction, or the receiver
    /// already has one pending the other way.
    pub fn send_request(&self, sender: &str, receiver: &str) -> Result<FriendRequest> {
        if sender == receiver {
            return Err(Error::SelfRequest);
        }
        if !self.db.account_exists(receiver)? {
            return Err(Error::UnknownUser(receiver.to_string()));
        }

        let id = uuid::Uuid::new_v4().to_string();
        self.db.create_friend_request(&id, sender, receiver)?;

        tracing::info!("Friend request {} sent: {} -> {}", id, sender, receiver);

        let record = self
            .db
            .get_friend_request(sender, receiver)?
            .ok_or_else(|| Error::Internal("request vanished after insert".into()))?;

        FriendRequest::from_record(record)
    }

    /// Accept a pending request addressed to `receiver` from `sender`
    ///
    /// Flips the request to Accepted and links both friendship directions.
    pub fn accept_request(&self, sender: &str, receiver: &str) -> Result<()> {
        self.db.accept_friend_request(sender, receiver)?;

        tracing::info!("Friend request accepted: {} -> {}", sender, receiver);

        Ok(())
    }

    /// List a nickname's friends in acceptance order
    pub fn friends_of(&self, nickname: &str) -> Result<Vec<String>> {
        if !self.db.account_exists(nickname)? {
            return Err(Error::UnknownUser(nickname.to_string()));
        }
        self.db.list_friends(nickname)
    }

    /// List the pending requests addressed to a nickname, oldest first
    pub fn pending_requests(&self, receiver: &str) -> Result<Vec<FriendRequest>> {
        self.db
            .pending_requests_for(receiver)?
            .into_iter()
            .map(FriendRequest::from_record)
            .collect()
    }

    /// Check that two nicknames are mutual friends
    ///
    /// A one-sided adjacency means the stored graph is corrupted and is
    /// surfaced as an internal error rather than a routing refusal.
    pub fn are_friends(&self, a: &str, b: &str) -> Result<bool> {
        match self.db.friendship_directions(a, b)? {
            (true, true) => Ok(true),
            (false, false) => Ok(false),
            _ => Err(Error::AsymmetricFriendship(a.to_string(), b.to_string())),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    async fn service_with_accounts(nicknames: &[&str]) -> FriendService {
        let db = Arc::new(Database::open(None).await.unwrap());
        for nick in nicknames {
            db.insert_account(nick, &format!("{}@example.com", nick), "hash")
                .unwrap();
        }
        FriendService::new(db)
    }

    #[tokio::test]
    async fn test_request_lifecycle() {
        let service = service_with_accounts(&["alice", "bob"]).await;

        let request = service.send_request("alice", "bob").unwrap();
        assert_eq!(request.status, RequestStatus::Pending);

        let pending = service.pending_requests("bob").unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].sender, "alice");

        service.accept_request("alice", "bob").unwrap();

        assert!(service.pending_requests("bob").unwrap().is_empty());
        assert_eq!(service.friends_of("alice").unwrap(), vec!["bob"]);
        assert_eq!(service.friends_of("bob").unwrap(), vec!["alice"]);
        assert!(service.are_friends("alice", "bob").unwrap());
    }

    #[tokio::test]
    async fn test_self_request_is_rejected() {
        let service = service_with_accounts(&["alice"]).await;
        let err = service.send_request("alice", "alice").unwrap_err();
        assert!(matches!(err, Error::SelfRequest));
    }

    #[tokio::test]
    async fn test_unknown_receiver_is_rejected() {
        let service = service_with_accounts(&["alice"]).await;
        let err = service.send_request("alice", "ghost").unwrap_err();
        assert!(matches!(err, Error::UnknownUser(_)));
    }

    #[tokio::test]
    async fn test_duplicate_and_reciprocal_sends() {
        let service = service_with_accounts(&["alice", "bob"]).await;
        service.send_request("alice", "bob").unwrap();

        let err = service.send_request("alice", "bob").unwrap_err();
        assert!(matches!(err, Error::AlreadyRequested));

        let err = service.send_request("bob", "alice").unwrap_err();
        assert!(matches!(err, Error::ReciprocalPending));

        // Still exactly one pending request for the pair.
        assert_eq!(service.pending_requests("bob").unwrap().len(), 1);
        assert!(service.pending_requests("alice").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_accept_requires_exact_direction() {
        let service = service_with_accounts(&["alice", "bob"]).await;
        service.send_request("alice", "bob").unwrap();

        let err = service.accept_request("bob", "alice").unwrap_err();
        assert!(matches!(err, Error::NoSuchRequest));

        service.accept_request("alice", "bob").unwrap();

        let err = service.accept_request("alice", "bob").unwrap_err();
        assert!(matches!(err, Error::AlreadyFriends));
    }

    #[tokio::test]
    async fn test_friends_of_unknown_user() {
        let service = service_with_accounts(&[]).await;
        let err = service.friends_of("ghost").unwrap_err();
        assert!(matches!(err, Error::UnknownUser(_)));
    }
}
