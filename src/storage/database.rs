//! # Database
//!
//! SQLite wrapper providing the keyed repository the services run on.
//!
//! Every mutation that touches more than one row (registration's two
//! uniqueness checks plus insert, a request acceptance and its two adjacency
//! rows, a group with its initial member list, a direct message with both
//! participants' history entries) executes inside a single transaction.
//! No writer can observe or overwrite another writer's half-applied update,
//! which is the discipline the relationship state machine depends on.

use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::sync::Arc;

use super::schema;
use crate::error::{Error, Result};

/// The main database handle
///
/// Wraps a SQLite connection and provides high-level keyed access to
/// accounts, friend requests, friendships, groups, and message history.
pub struct Database {
    /// The underlying SQLite connection
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create a database
    ///
    /// If path is None, creates an in-memory database (useful for testing).
    pub async fn open(path: Option<&str>) -> Result<Self> {
        let conn = match path {
            Some(p) => Connection::open(p)
                .map_err(|e| Error::DatabaseError(format!("Failed to open database: {}", e)))?,
            None => Connection::open_in_memory().map_err(|e| {
                Error::DatabaseError(format!("Failed to create in-memory database: {}", e))
            })?,
        };

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.init_schema()?;

        Ok(db)
    }

    /// Initialize the database schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock();

        let version: Option<i32> = conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .ok();

        match version {
            None => {
                conn.execute_batch(schema::CREATE_TABLES)
                    .map_err(|e| Error::DatabaseError(format!("Failed to create tables: {}", e)))?;

                conn.execute(
                    "INSERT INTO schema_version (version) VALUES (?)",
                    params![schema::SCHEMA_VERSION],
                )
                .map_err(|e| {
                    Error::DatabaseError(format!("Failed to set schema version: {}", e))
                })?;

                tracing::info!("Database schema created (version {})", schema::SCHEMA_VERSION);
            }
            Some(v) => {
                tracing::debug!("Database schema version: {}", v);
            }
        }

        Ok(())
    }

    // ========================================================================
    // ACCOUNT OPERATIONS
    // ========================================================================

    /// Create an account, enforcing both uniqueness constraints
    ///
    /// The checks and the insert run in one transaction, so two racing
    /// registrations of the same email or nickname can never both pass.
    /// Returns the new account's surrogate id.
    pub fn insert_account(
        &self,
        nickname: &str,
        email: &str,
        credential_hash: &str,
    ) -> Result<i64> {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| Error::DatabaseError(format!("Failed to begin transaction: {}", e)))?;

        let email_taken = row_exists(&tx, "SELECT 1 FROM accounts WHERE email = ?", &[email])?;
        let nickname_taken =
            row_exists(&tx, "SELECT 1 FROM accounts WHERE nickname = ?", &[nickname])?;

        match (email_taken, nickname_taken) {
            (true, true) => return Err(Error::EmailAndNicknameTaken),
            (true, false) => return Err(Error::EmailTaken),
            (false, true) => return Err(Error::NicknameTaken),
            (false, false) => {}
        }

        tx.execute(
            "INSERT INTO accounts (nickname, email, credential_hash, created_at)
             VALUES (?, ?, ?, ?)",
            params![nickname, email, credential_hash, crate::time::now_timestamp()],
        )
        .map_err(|e| Error::DatabaseError(format!("Failed to insert account: {}", e)))?;

        let id = tx.last_insert_rowid();

        tx.commit()
            .map_err(|e| Error::DatabaseError(format!("Failed to commit account: {}", e)))?;

        Ok(id)
    }

    /// Get an account by nickname
    pub fn get_account(&self, nickname: &str) -> Result<Option<AccountRecord>> {
        let conn = self.conn.lock();

        let result = conn.query_row(
            "SELECT id, nickname, email, credential_hash, created_at
             FROM accounts WHERE nickname = ?",
            params![nickname],
            row_to_account,
        );

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Error::DatabaseError(format!("Failed to get account: {}", e))),
        }
    }

    /// Get an account by email
    pub fn get_account_by_email(&self, email: &str) -> Result<Option<AccountRecord>> {
        let conn = self.conn.lock();

        let result = conn.query_row(
            "SELECT id, nickname, email, credential_hash, created_at
             FROM accounts WHERE email = ?",
            params![email],
            row_to_account,
        );

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Error::DatabaseError(format!("Failed to get account: {}", e))),
        }
    }

    /// Check whether a nickname resolves to an account
    pub fn account_exists(&self, nickname: &str) -> Result<bool> {
        let conn = self.conn.lock();
        row_exists(&conn, "SELECT 1 FROM accounts WHERE nickname = ?", &[nickname])
    }

    // ========================================================================
    // FRIEND REQUEST OPERATIONS
    // ========================================================================

    /// Record a new pending friend request
    ///
    /// Both directions are checked inside the transaction: a request already
    /// on record sender→receiver fails with `AlreadyRequested`, and one
    /// receiver→sender fails with `ReciprocalPending`. This keeps the
    /// one-unresolved-request-per-pair invariant under concurrent sends.
    pub fn create_friend_request(&self, id: &str, sender: &str, receiver: &str) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| Error::DatabaseError(format!("Failed to begin transaction: {}", e)))?;

        if row_exists(
            &tx,
            "SELECT 1 FROM friend_requests WHERE sender = ? AND receiver = ?",
            &[sender, receiver],
        )? {
            return Err(Error::AlreadyRequested);
        }
        if row_exists(
            &tx,
            "SELECT 1 FROM friend_requests WHERE sender = ? AND receiver = ?",
            &[receiver, sender],
        )? {
            return Err(Error::ReciprocalPending);
        }

        tx.execute(
            "INSERT INTO friend_requests (id, sender, receiver, status, created_at)
             VALUES (?, ?, ?, 'pending', ?)",
            params![id, sender, receiver, crate::time::now_timestamp()],
        )
        .map_err(|e| Error::DatabaseError(format!("Failed to insert friend request: {}", e)))?;

        tx.commit()
            .map_err(|e| Error::DatabaseError(format!("Failed to commit friend request: {}", e)))?;

        Ok(())
    }

    /// Get the request for an exact (sender, receiver) ordering
    pub fn get_friend_request(
        &self,
        sender: &str,
        receiver: &str,
    ) -> Result<Option<FriendRequestRecord>> {
        let conn = self.conn.lock();

        let result = conn.query_row(
            "SELECT id, sender, receiver, status, created_at
             FROM friend_requests WHERE sender = ? AND receiver = ?",
            params![sender, receiver],
            row_to_request,
        );

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Error::DatabaseError(format!("Failed to get request: {}", e))),
        }
    }

    /// Accept a pending request and link both adjacency rows
    ///
    /// The Pending→Accepted flip and the two `friendships` inserts are one
    /// transaction: either both sides observe the friendship or neither
    /// does. The adjacency inserts are idempotent so a retried accept after
    /// a crash cannot fail halfway.
    pub fn accept_friend_request(&self, sender: &str, receiver: &str) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| Error::DatabaseError(format!("Failed to begin transaction: {}", e)))?;

        let status: Option<String> = match tx.query_row(
            "SELECT status FROM friend_requests WHERE sender = ? AND receiver = ?",
            params![sender, receiver],
            |row| row.get(0),
        ) {
            Ok(s) => Some(s),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(Error::DatabaseError(format!("Failed to get request: {}", e))),
        };

        match status.as_deref() {
            None => return Err(Error::NoSuchRequest),
            Some("accepted") => return Err(Error::AlreadyFriends),
            Some(_) => {}
        }

        tx.execute(
            "UPDATE friend_requests SET status = 'accepted' WHERE sender = ? AND receiver = ?",
            params![sender, receiver],
        )
        .map_err(|e| Error::DatabaseError(format!("Failed to update request: {}", e)))?;

        let now = crate::time::now_timestamp();
        tx.execute(
            "INSERT OR IGNORE INTO friendships (account, friend, created_at) VALUES (?, ?, ?)",
            params![sender, receiver, now],
        )
        .map_err(|e| Error::DatabaseError(format!("Failed to insert friendship: {}", e)))?;
        tx.execute(
            "INSERT OR IGNORE INTO friendships (account, friend, created_at) VALUES (?, ?, ?)",
            params![receiver, sender, now],
        )
        .map_err(|e| Error::DatabaseError(format!("Failed to insert friendship: {}", e)))?;

        tx.commit()
            .map_err(|e| Error::DatabaseError(format!("Failed to commit acceptance: {}", e)))?;

        Ok(())
    }

    /// Get all pending requests addressed to a receiver, oldest first
    pub fn pending_requests_for(&self, receiver: &str) -> Result<Vec<FriendRequestRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, sender, receiver, status, created_at
                 FROM friend_requests WHERE receiver = ? AND status = 'pending'
                 ORDER BY rowid",
            )
            .map_err(|e| Error::DatabaseError(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![receiver], row_to_request)
            .map_err(|e| Error::DatabaseError(format!("Failed to query requests: {}", e)))?;

        let mut requests = Vec::new();
        for row in rows {
            requests
                .push(row.map_err(|e| Error::DatabaseError(format!("Failed to read request: {}", e)))?);
        }

        Ok(requests)
    }

    // ========================================================================
    // FRIENDSHIP OPERATIONS
    // ========================================================================

    /// List an account's friends in stored adjacency order
    pub fn list_friends(&self, nickname: &str) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare("SELECT friend FROM friendships WHERE account = ? ORDER BY rowid")
            .map_err(|e| Error::DatabaseError(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![nickname], |row| row.get(0))
            .map_err(|e| Error::DatabaseError(format!("Failed to query friends: {}", e)))?;

        let mut friends = Vec::new();
        for row in rows {
            friends
                .push(row.map_err(|e| Error::DatabaseError(format!("Failed to read friend: {}", e)))?);
        }

        Ok(friends)
    }

    /// Check both directions of the friendship relation between two accounts
    ///
    /// Returns `(a lists b, b lists a)`. Both reads happen under the same
    /// lock so the pair is a consistent snapshot.
    pub fn friendship_directions(&self, a: &str, b: &str) -> Result<(bool, bool)> {
        let conn = self.conn.lock();
        let ab = row_exists(
            &conn,
            "SELECT 1 FROM friendships WHERE account = ? AND friend = ?",
            &[a, b],
        )?;
        let ba = row_exists(
            &conn,
            "SELECT 1 FROM friendships WHERE account = ? AND friend = ?",
            &[b, a],
        )?;
        Ok((ab, ba))
    }

    // ========================================================================
    // GROUP OPERATIONS
    // ========================================================================

    /// Create a group together with its full initial member list
    ///
    /// One transaction: no group record ever exists without its members.
    pub fn create_group(
        &self,
        id: &str,
        name: &str,
        creator: &str,
        created_at: i64,
        members: &[String],
    ) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| Error::DatabaseError(format!("Failed to begin transaction: {}", e)))?;

        tx.execute(
            "INSERT INTO groups (id, name, creator, created_at) VALUES (?, ?, ?, ?)",
            params![id, name, creator, created_at],
        )
        .map_err(|e| Error::DatabaseError(format!("Failed to insert group: {}", e)))?;

        for member in members {
            tx.execute(
                "INSERT INTO group_members (group_id, member, joined_at) VALUES (?, ?, ?)",
                params![id, member, created_at],
            )
            .map_err(|e| Error::DatabaseError(format!("Failed to insert group member: {}", e)))?;
        }

        tx.commit()
            .map_err(|e| Error::DatabaseError(format!("Failed to commit group: {}", e)))?;

        Ok(())
    }

    /// Get a group by id
    pub fn get_group(&self, id: &str) -> Result<Option<GroupRecord>> {
        let conn = self.conn.lock();

        let result = conn.query_row(
            "SELECT id, name, creator, created_at FROM groups WHERE id = ?",
            params![id],
            |row| {
                Ok(GroupRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    creator: row.get(2)?,
                    created_at: row.get(3)?,
                })
            },
        );

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Error::DatabaseError(format!("Failed to get group: {}", e))),
        }
    }

    /// Append a member to a group
    ///
    /// The existence and duplicate checks share the insert's transaction, so
    /// two concurrent adds of the same nickname cannot both succeed.
    pub fn add_group_member(&self, group_id: &str, member: &str) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| Error::DatabaseError(format!("Failed to begin transaction: {}", e)))?;

        if !row_exists(&tx, "SELECT 1 FROM groups WHERE id = ?", &[group_id])? {
            return Err(Error::GroupNotFound(group_id.to_string()));
        }
        if row_exists(
            &tx,
            "SELECT 1 FROM group_members WHERE group_id = ? AND member = ?",
            &[group_id, member],
        )? {
            return Err(Error::AlreadyMember);
        }

        tx.execute(
            "INSERT INTO group_members (group_id, member, joined_at) VALUES (?, ?, ?)",
            params![group_id, member, crate::time::now_timestamp()],
        )
        .map_err(|e| Error::DatabaseError(format!("Failed to insert group member: {}", e)))?;

        tx.commit()
            .map_err(|e| Error::DatabaseError(format!("Failed to commit member: {}", e)))?;

        Ok(())
    }

    /// List a group's members in join order
    pub fn group_members(&self, group_id: &str) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare("SELECT member FROM group_members WHERE group_id = ? ORDER BY rowid")
            .map_err(|e| Error::DatabaseError(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![group_id], |row| row.get(0))
            .map_err(|e| Error::DatabaseError(format!("Failed to query members: {}", e)))?;

        let mut members = Vec::new();
        for row in rows {
            members
                .push(row.map_err(|e| Error::DatabaseError(format!("Failed to read member: {}", e)))?);
        }

        Ok(members)
    }

    /// Check whether a nickname is a current member of a group
    pub fn is_group_member(&self, group_id: &str, member: &str) -> Result<bool> {
        let conn = self.conn.lock();
        row_exists(
            &conn,
            "SELECT 1 FROM group_members WHERE group_id = ? AND member = ?",
            &[group_id, member],
        )
    }

    /// List the (id, name) of every group a nickname belongs to, in join order
    pub fn groups_for(&self, member: &str) -> Result<Vec<(String, String)>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT g.id, g.name FROM group_members gm
                 JOIN groups g ON g.id = gm.group_id
                 WHERE gm.member = ? ORDER BY gm.rowid",
            )
            .map_err(|e| Error::DatabaseError(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![member], |row| Ok((row.get(0)?, row.get(1)?)))
            .map_err(|e| Error::DatabaseError(format!("Failed to query groups: {}", e)))?;

        let mut groups = Vec::new();
        for row in rows {
            groups
                .push(row.map_err(|e| Error::DatabaseError(format!("Failed to read group: {}", e)))?);
        }

        Ok(groups)
    }

    // ========================================================================
    // MESSAGE OPERATIONS
    // ========================================================================

    /// Persist a direct message and both participants' history references
    ///
    /// One transaction: the message never appears in only one history.
    pub fn insert_direct_message(&self, message: &MessageRecord) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| Error::DatabaseError(format!("Failed to begin transaction: {}", e)))?;

        tx.execute(
            "INSERT INTO messages (id, sender, receiver, group_id, content, timestamp)
             VALUES (?, ?, ?, NULL, ?, ?)",
            params![
                message.id,
                message.sender,
                message.receiver,
                message.content,
                message.timestamp
            ],
        )
        .map_err(|e| Error::DatabaseError(format!("Failed to insert message: {}", e)))?;

        tx.execute(
            "INSERT INTO message_history (account, message_id) VALUES (?, ?)",
            params![message.sender, message.id],
        )
        .map_err(|e| Error::DatabaseError(format!("Failed to insert history: {}", e)))?;
        tx.execute(
            "INSERT INTO message_history (account, message_id) VALUES (?, ?)",
            params![message.receiver, message.id],
        )
        .map_err(|e| Error::DatabaseError(format!("Failed to insert history: {}", e)))?;

        tx.commit()
            .map_err(|e| Error::DatabaseError(format!("Failed to commit message: {}", e)))?;

        Ok(())
    }

    /// Append a message to a group's log
    pub fn insert_group_message(&self, message: &MessageRecord) -> Result<()> {
        let group_id = message
            .group_id
            .as_deref()
            .ok_or_else(|| Error::Internal("group message without group id".into()))?;

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO messages (id, sender, receiver, group_id, content, timestamp)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                message.id,
                message.sender,
                message.receiver,
                group_id,
                message.content,
                message.timestamp
            ],
        )
        .map_err(|e| Error::DatabaseError(format!("Failed to insert group message: {}", e)))?;

        Ok(())
    }

    /// Get an account's full direct-message history in append order
    pub fn history_for(&self, account: &str) -> Result<Vec<MessageRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT m.id, m.sender, m.receiver, m.group_id, m.content, m.timestamp
                 FROM message_history h JOIN messages m ON m.id = h.message_id
                 WHERE h.account = ? ORDER BY h.rowid",
            )
            .map_err(|e| Error::DatabaseError(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![account], row_to_message)
            .map_err(|e| Error::DatabaseError(format!("Failed to query history: {}", e)))?;

        let mut messages = Vec::new();
        for row in rows {
            messages
                .push(row.map_err(|e| Error::DatabaseError(format!("Failed to read message: {}", e)))?);
        }

        Ok(messages)
    }

    /// Get the direct messages exchanged between two accounts, in the order
    /// they appear in the first account's history
    pub fn history_between(&self, account: &str, counterpart: &str) -> Result<Vec<MessageRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT m.id, m.sender, m.receiver, m.group_id, m.content, m.timestamp
                 FROM message_history h JOIN messages m ON m.id = h.message_id
                 WHERE h.account = ?1
                   AND ((m.sender = ?1 AND m.receiver = ?2) OR (m.sender = ?2 AND m.receiver = ?1))
                 ORDER BY h.rowid",
            )
            .map_err(|e| Error::DatabaseError(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![account, counterpart], row_to_message)
            .map_err(|e| Error::DatabaseError(format!("Failed to query history: {}", e)))?;

        let mut messages = Vec::new();
        for row in rows {
            messages
                .push(row.map_err(|e| Error::DatabaseError(format!("Failed to read message: {}", e)))?);
        }

        Ok(messages)
    }

    /// Get a group's message log in append order
    pub fn group_messages(&self, group_id: &str) -> Result<Vec<MessageRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, sender, receiver, group_id, content, timestamp
                 FROM messages WHERE group_id = ? ORDER BY rowid",
            )
            .map_err(|e| Error::DatabaseError(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![group_id], row_to_message)
            .map_err(|e| Error::DatabaseError(format!("Failed to query messages: {}", e)))?;

        let mut messages = Vec::new();
        for row in rows {
            messages
                .push(row.map_err(|e| Error::DatabaseError(format!("Failed to read message: {}", e)))?);
        }

        Ok(messages)
    }
}

// ============================================================================
// ROW MAPPING
// ============================================================================

fn row_exists(conn: &Connection, sql: &str, args: &[&str]) -> Result<bool> {
    let found: bool = conn
        .query_row(
            &format!("SELECT EXISTS({})", sql),
            rusqlite::params_from_iter(args),
            |row| row.get(0),
        )
        .map_err(|e| Error::DatabaseError(format!("Failed to run existence check: {}", e)))?;
    Ok(found)
}

fn row_to_account(row: &rusqlite::Row<'_>) -> rusqlite::Result<AccountRecord> {
    Ok(AccountRecord {
        id: row.get(0)?,
        nickname: row.get(1)?,
        email: row.get(2)?,
        credential_hash: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn row_to_request(row: &rusqlite::Row<'_>) -> rusqlite::Result<FriendRequestRecord> {
    Ok(FriendRequestRecord {
        id: row.get(0)?,
        sender: row.get(1)?,
        receiver: row.get(2)?,
        status: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageRecord> {
    Ok(MessageRecord {
        id: row.get(0)?,
        sender: row.get(1)?,
        receiver: row.get(2)?,
        group_id: row.get(3)?,
        content: row.get(4)?,
        timestamp: row.get(5)?,
    })
}

// ============================================================================
// RECORD TYPES
// ============================================================================

/// An account row
#[derive(Debug, Clone)]
pub struct AccountRecord {
    /// Surrogate id (monotonic, store-assigned)
    pub id: i64,
    /// Unique handle
    pub nickname: String,
    /// Unique email
    pub email: String,
    /// Opaque credential hash
    pub credential_hash: String,
    /// Registration timestamp
    pub created_at: i64,
}

/// A friend request row
#[derive(Debug, Clone)]
pub struct FriendRequestRecord {
    /// Request id
    pub id: String,
    /// Sender nickname
    pub sender: String,
    /// Receiver nickname
    pub receiver: String,
    /// "pending" or "accepted"
    pub status: String,
    /// Creation timestamp
    pub created_at: i64,
}

/// A group row (membership lives in `group_members`)
#[derive(Debug, Clone)]
pub struct GroupRecord {
    /// Group id
    pub id: String,
    /// Group name
    pub name: String,
    /// Creator nickname
    pub creator: String,
    /// Creation timestamp
    pub created_at: i64,
}

/// A message row
#[derive(Debug, Clone)]
pub struct MessageRecord {
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

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    async fn open_db() -> Database {
        Database::open(None).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_account_and_lookup() {
        let db = open_db().await;

        let id = db.insert_account("alice", "alice@example.com", "hash").unwrap();
        assert!(id > 0);

        let record = db.get_account("alice").unwrap().unwrap();
        assert_eq!(record.email, "alice@example.com");
        assert!(db.account_exists("alice").unwrap());
        assert!(!db.account_exists("bob").unwrap());
    }

    #[tokio::test]
    async fn test_account_ids_are_monotonic() {
        let db = open_db().await;

        let a = db.insert_account("alice", "a@example.com", "h").unwrap();
        let b = db.insert_account("bob", "b@example.com", "h").unwrap();
        assert!(b > a);
    }

    #[tokio::test]
    async fn test_insert_account_conflicts() {
        let db = open_db().await;
        db.insert_account("alice", "alice@example.com", "hash").unwrap();

        let err = db
            .insert_account("alice2", "alice@example.com", "hash")
            .unwrap_err();
        assert!(matches!(err, Error::EmailTaken));

        let err = db
            .insert_account("alice", "other@example.com", "hash")
            .unwrap_err();
        assert!(matches!(err, Error::NicknameTaken));

        let err = db
            .insert_account("alice", "alice@example.com", "hash")
            .unwrap_err();
        assert!(matches!(err, Error::EmailAndNicknameTaken));
    }

    #[tokio::test]
    async fn test_friend_request_duplicate_detection() {
        let db = open_db().await;

        db.create_friend_request("r1", "alice", "bob").unwrap();

        let err = db.create_friend_request("r2", "alice", "bob").unwrap_err();
        assert!(matches!(err, Error::AlreadyRequested));

        let err = db.create_friend_request("r3", "bob", "alice").unwrap_err();
        assert!(matches!(err, Error::ReciprocalPending));
    }

    #[tokio::test]
    async fn test_accept_links_both_directions() {
        let db = open_db().await;

        db.create_friend_request("r1", "alice", "bob").unwrap();
        db.accept_friend_request("alice", "bob").unwrap();

        assert_eq!(db.list_friends("alice").unwrap(), vec!["bob".to_string()]);
        assert_eq!(db.list_friends("bob").unwrap(), vec!["alice".to_string()]);
        assert_eq!(db.friendship_directions("alice", "bob").unwrap(), (true, true));

        let record = db.get_friend_request("alice", "bob").unwrap().unwrap();
        assert_eq!(record.status, "accepted");
    }

    #[tokio::test]
    async fn test_accept_is_not_repeatable() {
        let db = open_db().await;

        db.create_friend_request("r1", "alice", "bob").unwrap();
        db.accept_friend_request("alice", "bob").unwrap();

        let err = db.accept_friend_request("alice", "bob").unwrap_err();
        assert!(matches!(err, Error::AlreadyFriends));

        let err = db.accept_friend_request("bob", "alice").unwrap_err();
        assert!(matches!(err, Error::NoSuchRequest));
    }

    #[tokio::test]
    async fn test_group_member_ordering_and_guards() {
        let db = open_db().await;

        db.create_group(
            "g1",
            "trip",
            "alice",
            crate::time::now_timestamp(),
            &["alice".to_string(), "bob".to_string()],
        )
        .unwrap();

        db.add_group_member("g1", "carol").unwrap();
        assert_eq!(db.group_members("g1").unwrap(), vec!["alice", "bob", "carol"]);

        let err = db.add_group_member("g1", "carol").unwrap_err();
        assert!(matches!(err, Error::AlreadyMember));

        let err = db.add_group_member("missing", "carol").unwrap_err();
        assert!(matches!(err, Error::GroupNotFound(_)));

        assert_eq!(
            db.groups_for("carol").unwrap(),
            vec![("g1".to_string(), "trip".to_string())]
        );
    }

    #[tokio::test]
    async fn test_direct_message_lands_in_both_histories() {
        let db = open_db().await;

        let message = MessageRecord {
            id: "m1".into(),
            sender: "alice".into(),
            receiver: "bob".into(),
            group_id: None,
            content: "hi".into(),
            timestamp: crate::time::now_timestamp_millis(),
        };
        db.insert_direct_message(&message).unwrap();

        assert_eq!(db.history_for("alice").unwrap().len(), 1);
        assert_eq!(db.history_for("bob").unwrap().len(), 1);
        assert_eq!(db.history_between("alice", "bob").unwrap()[0].content, "hi");
        assert!(db.history_for("carol").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_group_messages_keep_append_order() {
        let db = open_db().await;
        db.create_group("g1", "trip", "alice", 0, &["alice".to_string()]).unwrap();

        for (i, text) in ["one", "two", "three"].iter().enumerate() {
            db.insert_group_message(&MessageRecord {
                id: format!("m{}", i),
                sender: "alice".into(),
                receiver: "g1".into(),
                group_id: Some("g1".into()),
                content: text.to_string(),
                timestamp: 0,
            })
            .unwrap();
        }

        let log = db.group_messages("g1").unwrap();
        let contents: Vec<_> = log.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
    }
}
