//! # Storage Module
//!
//! SQLite persistence for accounts, relationships, groups, and messages.

mod database;
mod schema;

pub use database::{
    AccountRecord, Database, FriendRequestRecord, GroupRecord, MessageRecord,
};
