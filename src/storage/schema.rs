//! # Database Schema
//!
//! SQL schema definitions for the Banter database.
//!
//! ## Schema Overview
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐      ┌─────────────────┐
//! │    accounts     │    │ friend_requests │      │   friendships   │
//! ├─────────────────┤    ├─────────────────┤      ├─────────────────┤
//! │ id (rowid)      │    │ id              │      │ account         │
//! │ nickname UNIQUE │◄───│ sender          │      │ friend          │
//! │ email UNIQUE    │    │ receiver        │      │ created_at      │
//! │ credential_hash │    │ status          │      └─────────────────┘
//! │ created_at      │    │ created_at      │       two rows per
//! └─────────────────┘    └─────────────────┘       accepted request
//!
//! ┌─────────────────┐    ┌─────────────────┐      ┌─────────────────┐
//! │     groups      │    │  group_members  │      │    messages     │
//! ├─────────────────┤    ├─────────────────┤      ├─────────────────┤
//! │ id              │◄───│ group_id        │      │ id              │
//! │ name            │    │ member          │      │ sender          │
//! │ creator         │    │ joined_at       │      │ receiver        │
//! │ created_at      │    └─────────────────┘      │ group_id (NULL  │
//! └─────────────────┘                             │   for directs)  │
//!                        ┌─────────────────┐      │ content         │
//!                        │ message_history │      │ timestamp       │
//!                        ├─────────────────┤      └─────────────────┘
//!                        │ account         │       per-account copy
//!                        │ message_id      │       of each direct
//!                        └─────────────────┘       message reference
//! ```
//!
//! Rowid order is the append order everywhere a sequence matters: group
//! member listing, group message logs, and personal histories.

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// SQL to create all tables
pub const CREATE_TABLES: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY
);

-- Accounts table
-- The rowid sequence doubles as the monotonic surrogate account id.
CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    -- Unique, immutable handle; the external identifier everywhere else
    nickname TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    -- Opaque to the core (bcrypt output)
    credential_hash TEXT NOT NULL,
    created_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_accounts_email ON accounts(email);

-- Friend requests table
-- At most one row per (sender, receiver) direction; the unordered-pair
-- uniqueness of pending requests is enforced by checking both directions
-- inside the creating transaction.
CREATE TABLE IF NOT EXISTS friend_requests (
    id TEXT PRIMARY KEY,
    sender TEXT NOT NULL,
    receiver TEXT NOT NULL,
    -- 'pending' or 'accepted'; accepted rows are kept as an audit trail
    status TEXT NOT NULL DEFAULT 'pending',
    created_at INTEGER NOT NULL,
    UNIQUE (sender, receiver)
);
CREATE INDEX IF NOT EXISTS idx_requests_receiver ON friend_requests(receiver, status);

-- Friendship adjacency table
-- Symmetric by construction: accepting a request inserts both directions
-- in one transaction.
CREATE TABLE IF NOT EXISTS friendships (
    account TEXT NOT NULL,
    friend TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    PRIMARY KEY (account, friend)
);

-- Groups table
CREATE TABLE IF NOT EXISTS groups (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    creator TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

-- Group members table
-- Insertion order is join order; listing follows rowid.
CREATE TABLE IF NOT EXISTS group_members (
    group_id TEXT NOT NULL,
    member TEXT NOT NULL,
    joined_at INTEGER NOT NULL,
    PRIMARY KEY (group_id, member),
    FOREIGN KEY (group_id) REFERENCES groups(id)
);
CREATE INDEX IF NOT EXISTS idx_group_members_member ON group_members(member);

-- Messages table
-- receiver holds a nickname for direct messages and the group id for group
-- messages (group_id is set in that case too).
CREATE TABLE IF NOT EXISTS messages (
    id TEXT PRIMARY KEY,
    sender TEXT NOT NULL,
    receiver TEXT NOT NULL,
    group_id TEXT,
    content TEXT NOT NULL,
    timestamp INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_messages_group ON messages(group_id);

-- Per-account message history
-- One row per participant per direct message, appended in the same
-- transaction as the message itself.
CREATE TABLE IF NOT EXISTS message_history (
    account TEXT NOT NULL,
    message_id TEXT NOT NULL,
    PRIMARY KEY (account, message_id),
    FOREIGN KEY (message_id) REFERENCES messages(id)
);
CREATE INDEX IF NOT EXISTS idx_history_account ON message_history(account);
"#;
