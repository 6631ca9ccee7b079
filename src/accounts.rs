//! # Account Directory
//!
//! Registration and login.
//!
//! An account is keyed two ways: a unique email (the login identifier) and a
//! unique nickname (the handle every relationship and message references).
//! Registration enforces both uniqueness constraints atomically; login
//! verifies email, nickname, their pairing, and the password in that order,
//! and hands back an opaque credential from the [`IdentityVerifier`].

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::IdentityVerifier;
use crate::error::{Error, Result};
use crate::storage::{AccountRecord, Database};

/// Public projection of an account.
///
/// The credential hash never leaves the storage layer; callers see the
/// identifiers plus the account's current friends and group memberships.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Store-assigned surrogate id
    pub id: i64,
    /// Unique handle
    pub nickname: String,
    /// Unique email
    pub email: String,
    /// Friends, in acceptance order
    pub friends: Vec<String>,
    /// Ids of groups this account belongs to, in join order
    pub groups: Vec<String>,
}

/// Registration and login service
pub struct AccountDirectory {
    db: Arc<Database>,
    verifier: Arc<dyn IdentityVerifier>,
}

impl AccountDirectory {
    /// Create a new account directory
    pub fn new(db: Arc<Database>, verifier: Arc<dyn IdentityVerifier>) -> Self {
        Self { db, verifier }
    }

    /// Register a new account and return its surrogate id
    ///
    /// Fails with the precise conflict (email, nickname, or both) when the
    /// identifiers are already registered. The password is hashed before it
    /// reaches the store.
    pub fn register(&self, nickname: &str, email: &str, password: &str) -> Result<i64> {
        if nickname.trim().is_empty() {
            return Err(Error::InvalidArgument("nickname must not be empty".into()));
        }
        if email.trim().is_empty() {
            return Err(Error::InvalidArgument("email must not be empty".into()));
        }
        if password.is_empty() {
            return Err(Error::InvalidArgument("password must not be empty".into()));
        }

        let hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)
            .map_err(|e| Error::Internal(format!("Failed to hash password: {}", e)))?;

        let id = self.db.insert_account(nickname, email, &hash)?;

        tracing::info!("Registered account {} ({})", nickname, id);

        Ok(id)
    }

    /// Authenticate and return a fresh credential
    ///
    /// Checks run in a fixed order: the email must be registered, the
    /// nickname must be registered, both must name the same account, and the
    /// password must match. Each failure reports only the first check that
    /// failed.
    pub fn authenticate(&self, email: &str, nickname: &str, password: &str) -> Result<String> {
        let by_email = self
            .db
            .get_account_by_email(email)?
            .ok_or(Error::UnknownEmail)?;
        let by_nickname = self.db.get_account(nickname)?.ok_or(Error::UnknownNickname)?;

        if by_email.id != by_nickname.id {
            return Err(Error::NicknameEmailMismatch);
        }

        let matches = bcrypt::verify(password, &by_email.credential_hash)
            .map_err(|e| Error::Internal(format!("Failed to verify password: {}", e)))?;
        if !matches {
            return Err(Error::BadPassword);
        }

        let token = self.verifier.issue(&by_email.email)?;

        tracing::info!("Account {} logged in", nickname);

        Ok(token)
    }

    /// Check whether a nickname resolves to an account
    pub fn exists(&self, nickname: &str) -> Result<bool> {
        self.db.account_exists(nickname)
    }

    /// Resolve a nickname to its public projection
    pub fn resolve(&self, nickname: &str) -> Result<Account> {
        let record = self
            .db
            .get_account(nickname)?
            .ok_or_else(|| Error::UnknownUser(nickname.to_string()))?;

        self.project(record)
    }

    /// Resolve an email to its public projection
    pub fn resolve_by_email(&self, email: &str) -> Result<Account> {
        let record = self
            .db
            .get_account_by_email(email)?
            .ok_or(Error::UnknownEmail)?;

        self.project(record)
    }

    fn project(&self, record: AccountRecord) -> Result<Account> {
        let friends = self.db.list_friends(&record.nickname)?;
        let groups = self
            .db
            .groups_for(&record.nickname)?
            .into_iter()
            .map(|(id, _)| id)
            .collect();

        Ok(Account {
            id: record.id,
            nickname: record.nickname,
            email: record.email,
            friends,
            groups,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtVerifier;

    async fn directory() -> AccountDirectory {
        let db = Arc::new(Database::open(None).await.unwrap());
        let verifier = Arc::new(JwtVerifier::new("test-secret", 3600));
        AccountDirectory::new(db, verifier)
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let dir = directory().await;

        let id = dir.register("alice", "alice@example.com", "hunter2").unwrap();
        assert!(id > 0);

        let token = dir
            .authenticate("alice@example.com", "alice", "hunter2")
            .unwrap();
        assert!(!token.is_empty());
    }

    #[tokio::test]
    async fn test_register_rejects_taken_identifiers() {
        let dir = directory().await;
        dir.register("alice", "alice@example.com", "hunter2").unwrap();

        let err = dir
            .register("alice2", "alice@example.com", "hunter2")
            .unwrap_err();
        assert!(matches!(err, Error::EmailTaken));

        let err = dir
            .register("alice", "alice2@example.com", "hunter2")
            .unwrap_err();
        assert!(matches!(err, Error::NicknameTaken));

        let err = dir
            .register("alice", "alice@example.com", "hunter2")
            .unwrap_err();
        assert!(matches!(err, Error::EmailAndNicknameTaken));
    }

    #[tokio::test]
    async fn test_register_rejects_empty_fields() {
        let dir = directory().await;

        assert!(matches!(
            dir.register("", "a@example.com", "pw").unwrap_err(),
            Error::InvalidArgument(_)
        ));
        assert!(matches!(
            dir.register("alice", "", "pw").unwrap_err(),
            Error::InvalidArgument(_)
        ));
        assert!(matches!(
            dir.register("alice", "a@example.com", "").unwrap_err(),
            Error::InvalidArgument(_)
        ));
    }

    #[tokio::test]
    async fn test_login_failures_report_first_failed_check() {
        let dir = directory().await;
        dir.register("alice", "alice@example.com", "hunter2").unwrap();
        dir.register("bob", "bob@example.com", "hunter2").unwrap();

        let err = dir
            .authenticate("ghost@example.com", "alice", "hunter2")
            .unwrap_err();
        assert!(matches!(err, Error::UnknownEmail));

        let err = dir
            .authenticate("alice@example.com", "ghost", "hunter2")
            .unwrap_err();
        assert!(matches!(err, Error::UnknownNickname));

        let err = dir
            .authenticate("alice@example.com", "bob", "hunter2")
            .unwrap_err();
        assert!(matches!(err, Error::NicknameEmailMismatch));

        let err = dir
            .authenticate("alice@example.com", "alice", "wrong")
            .unwrap_err();
        assert!(matches!(err, Error::BadPassword));
    }

    #[tokio::test]
    async fn test_resolve_projects_friends_and_groups() {
        let dir = directory().await;
        dir.register("alice", "alice@example.com", "hunter2").unwrap();

        let account = dir.resolve("alice").unwrap();
        assert_eq!(account.nickname, "alice");
        assert!(account.friends.is_empty());
        assert!(account.groups.is_empty());

        let err = dir.resolve("ghost").unwrap_err();
        assert!(matches!(err, Error::UnknownUser(_)));
    }
}
