//! # Banter Core
//!
//! Relationship and messaging core for the Banter social backend.
//!
//! The crate owns four concerns behind one facade: account registration and
//! login, the friend-request lifecycle with its symmetric friendship graph,
//! a group registry, and relationship-gated message routing. Transports sit
//! above it; they authenticate a credential into a [`Session`] and call the
//! operation surface from there.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        BanterCore                           │
//! │                                                             │
//! │  register / login ──────────► AccountDirectory ──┐          │
//! │  session(credential)                             │          │
//! │       │                                          │          │
//! │       ▼                                          ▼          │
//! │  ┌─────────┐    FriendService ──┐           IdentityVerifier│
//! │  │ Session │───► GroupService ──┼──► Database (SQLite)      │
//! │  └─────────┘    MessageRouter ──┘                           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! All state lives in SQLite; every multi-row mutation runs inside one
//! transaction, so the friendship graph stays symmetric and histories never
//! diverge under concurrent writers.
//!
//! ## Example
//!
//! ```no_run
//! use banter_core::{BanterCore, CoreConfig};
//!
//! # async fn demo() -> banter_core::Result<()> {
//! let core = BanterCore::open(CoreConfig {
//!     database_path: None,
//!     token_secret: "change-me".into(),
//!     token_ttl_secs: 3600,
//! })
//! .await?;
//!
//! core.register("alice", "alice@example.com", "hunter2")?;
//! core.register("bob", "bob@example.com", "hunter2")?;
//!
//! let token = core.login("alice@example.com", "alice", "hunter2")?;
//! let session = core.session(&token)?;
//! session.send_friend_request("bob")?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod accounts;
pub mod auth;
pub mod error;
pub mod friends;
pub mod groups;
pub mod messaging;
pub mod storage;
pub mod time;

pub use accounts::{Account, AccountDirectory};
pub use auth::{IdentityVerifier, JwtVerifier};
pub use error::{Error, ErrorKind, Result};
pub use friends::{FriendRequest, FriendService, RequestStatus};
pub use groups::{Group, GroupService, GroupSummary};
pub use messaging::{Message, MessageRouter};
pub use storage::Database;

use std::sync::Arc;

/// Configuration for opening a [`BanterCore`]
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Database file path; None opens an in-memory database
    pub database_path: Option<String>,
    /// Shared secret the credential verifier signs with
    pub token_secret: String,
    /// Credential lifetime in seconds
    pub token_ttl_secs: u64,
}

/// The main entry point
///
/// Owns the database and the services; everything is cheaply cloneable
/// handles over the same store.
pub struct BanterCore {
    verifier: Arc<dyn IdentityVerifier>,
    accounts: AccountDirectory,
    friends: FriendService,
    groups: GroupService,
    messages: MessageRouter,
}

impl BanterCore {
    /// Open the core with the given configuration
    pub async fn open(config: CoreConfig) -> Result<Self> {
        let db = Arc::new(Database::open(config.database_path.as_deref()).await?);
        let verifier: Arc<dyn IdentityVerifier> =
            Arc::new(JwtVerifier::new(&config.token_secret, config.token_ttl_secs));

        tracing::info!("Banter core opened (version {})", version());

        Ok(Self {
            accounts: AccountDirectory::new(db.clone(), verifier.clone()),
            friends: FriendService::new(db.clone()),
            groups: GroupService::new(db.clone()),
            messages: MessageRouter::new(db),
            verifier,
        })
    }

    /// Register a new account and return its surrogate id
    pub fn register(&self, nickname: &str, email: &str, password: &str) -> Result<i64> {
        self.accounts.register(nickname, email, password)
    }

    /// Authenticate and return a bearer credential
    pub fn login(&self, email: &str, nickname: &str, password: &str) -> Result<String> {
        self.accounts.authenticate(email, nickname, password)
    }

    /// Verify a credential and open a session for its account
    pub fn session(&self, credential: &str) -> Result<Session<'_>> {
        let email = self.verifier.verify(credential)?;
        let account = self.accounts.resolve_by_email(&email)?;

        Ok(Session {
            core: self,
            nickname: account.nickname,
        })
    }

    /// The account directory
    pub fn accounts(&self) -> &AccountDirectory {
        &self.accounts
    }

    /// The friend-request service
    pub fn friends(&self) -> &FriendService {
        &self.friends
    }

    /// The group registry
    pub fn groups(&self) -> &GroupService {
        &self.groups
    }

    /// The message router
    pub fn messages(&self) -> &MessageRouter {
        &self.messages
    }
}

/// An authenticated view over the core
///
/// Every operation acts as the account the credential resolved to; nothing
/// here accepts a caller-supplied actor.
pub struct Session<'a> {
    core: &'a BanterCore,
    nickname: String,
}

impl std::fmt::Debug for Session<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("nickname", &self.nickname)
            .finish_non_exhaustive()
    }
}

impl Session<'_> {
    /// The authenticated account's nickname
    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    /// The authenticated account's full projection
    pub fn account(&self) -> Result<Account> {
        self.core.accounts.resolve(&self.nickname)
    }

    // ------------------------------------------------------------------
    // Friends
    // ------------------------------------------------------------------

    /// Send a friend request to another nickname
    pub fn send_friend_request(&self, receiver: &str) -> Result<FriendRequest> {
        self.core.friends.send_request(&self.nickname, receiver)
    }

    /// Accept a pending request this account received from `sender`
    pub fn accept_friend_request(&self, sender: &str) -> Result<()> {
        self.core.friends.accept_request(sender, &self.nickname)
    }

    /// List this account's friends
    pub fn list_friends(&self) -> Result<Vec<String>> {
        self.core.friends.friends_of(&self.nickname)
    }

    /// List pending requests addressed to this account
    pub fn pending_requests(&self) -> Result<Vec<FriendRequest>> {
        self.core.friends.pending_requests(&self.nickname)
    }

    // ------------------------------------------------------------------
    // Groups
    // ------------------------------------------------------------------

    /// Create a group with this account as creator
    pub fn create_group(&self, name: &str, initial_members: &[String]) -> Result<Group> {
        self.core.groups.create_group(name, &self.nickname, initial_members)
    }

    /// Add a member to a group
    pub fn add_group_member(&self, group_id: &str, member: &str) -> Result<()> {
        self.core.groups.add_member(group_id, member)
    }

    /// List the groups this account belongs to
    pub fn list_groups(&self) -> Result<Vec<GroupSummary>> {
        self.core.groups.groups_of(&self.nickname)
    }

    /// List a group's members
    pub fn group_members(&self, group_id: &str) -> Result<Vec<String>> {
        self.core.groups.members(group_id)
    }

    /// A group's message log
    pub fn group_messages(&self, group_id: &str) -> Result<Vec<Message>> {
        self.core.groups.messages(group_id)
    }

    // ------------------------------------------------------------------
    // Messaging
    // ------------------------------------------------------------------

    /// Send a direct message to a mutual friend
    pub fn send_direct(&self, receiver: &str, content: &str) -> Result<Message> {
        self.core.messages.send_direct(&self.nickname, receiver, content)
    }

    /// Send a message to a group this account belongs to
    pub fn send_group_message(&self, group_id: &str, content: &str) -> Result<Message> {
        self.core.messages.send_to_group(&self.nickname, group_id, content)
    }

    /// This account's full direct-message history
    pub fn history(&self) -> Result<Vec<Message>> {
        self.core.messages.history(&self.nickname)
    }

    /// The direct messages exchanged with one counterpart
    pub fn history_with(&self, counterpart: &str) -> Result<Vec<Message>> {
        self.core.messages.history_between(&self.nickname, counterpart)
    }
}

/// Get the version of the core library
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// ============================================================================
// TESTS
// ============================================================================
