//! # Error Handling
//!
//! Error types for Banter Core.
//!
//! Every failure a caller can recover from is a named variant with a
//! human-readable message: descriptive outcomes like "already friends" or
//! "not a valid user" are preserved as data, never thrown as opaque panics.
//! Each variant belongs to exactly one [`ErrorKind`]:
//!
//! ```text
//! Validation    - malformed or missing fields, rejected before touching state
//! NotFound      - referenced nickname / group / request does not exist
//! Conflict      - uniqueness or state-machine violation
//! Unauthorized  - invalid credential, or the actor lacks the relationship
//! Internal      - storage failure or detected inconsistency
//! ```

use thiserror::Error;

/// Result type alias for Banter Core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse error taxonomy exposed to the transport layer above.
///
/// Validation/NotFound/Conflict/Unauthorized are expected, recoverable
/// outcomes. Internal errors are never retried automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or missing required fields
    Validation,
    /// Referenced entity does not exist
    NotFound,
    /// Uniqueness or state-machine violation
    Conflict,
    /// Credential invalid, or actor lacks the required relationship
    Unauthorized,
    /// Storage failure or detected inconsistency
    Internal,
}

/// Main error type for Banter Core
///
/// Variants are grouped by module/domain, with a numeric code per group
/// (see [`Error::code`]).
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Account Errors (100-199)
    // ========================================================================

    /// Email is already registered
    #[error("Email already registered.")]
    EmailTaken,

    /// Nickname is already registered
    #[error("Nickname already registered.")]
    NicknameTaken,

    /// Both email and nickname are already registered
    #[error("Both email and nickname are already registered.")]
    EmailAndNicknameTaken,

    /// No account with this nickname
    #[error("There is no user named {0}.")]
    UnknownUser(String),

    /// No account with this email
    #[error("Incorrect email!")]
    UnknownEmail,

    /// No account with this nickname (login path)
    #[error("Incorrect nickname!")]
    UnknownNickname,

    /// Email and nickname resolve to different accounts
    #[error("Email and nickname are not matched.")]
    NicknameEmailMismatch,

    /// Password does not match the stored credential
    #[error("Incorrect password!")]
    BadPassword,

    // ========================================================================
    // Credential Errors (200-299)
    // ========================================================================

    /// Credential is invalid or expired
    #[error("Invalid or expired credential.")]
    InvalidToken,

    // ========================================================================
    // Friend Errors (300-399)
    // ========================================================================

    /// Cannot send a friend request to yourself
    #[error("You cannot send a friend request to yourself!")]
    SelfRequest,

    /// A request to this receiver is already on record
    #[error("You have already sent a request to this receiver.")]
    AlreadyRequested,

    /// The receiver already sent a request the other way
    #[error("This receiver already sent a request to you. You can accept it instead.")]
    ReciprocalPending,

    /// No request exists for this (sender, receiver) ordering
    #[error("Friend request not found.")]
    NoSuchRequest,

    /// The request was already accepted
    #[error("Already friends with this user.")]
    AlreadyFriends,

    /// Sender and receiver are not mutual friends
    #[error("Message could not be sent. You are not friends with this receiver.")]
    NotFriends,

    // ========================================================================
    // Group Errors (400-499)
    // ========================================================================

    /// Group does not exist
    #[error("There is no group with id {0}.")]
    GroupNotFound(String),

    /// One or more proposed members do not resolve to accounts
    #[error("These member(s) are not valid users: {}.", .0.join(", "))]
    InvalidMembers(Vec<String>),

    /// The nickname is already in the group's member list
    #[error("This user is already a member of the group.")]
    AlreadyMember,

    /// The sender is not a member of the group
    #[error("Message could not be sent. You are not a member of this group.")]
    NotMember,

    // ========================================================================
    // Validation Errors (500-599)
    // ========================================================================

    /// A required field is missing or malformed
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ========================================================================
    // Internal Errors (900-999)
    // ========================================================================

    /// Adjacency lists disagree about a friendship; state is corrupted
    #[error("Friendship between {0} and {1} is one-sided; stored state is inconsistent.")]
    AsymmetricFriendship(String, String),

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Get the numeric error code
    ///
    /// Error codes are organized by category:
    /// - 100-199: Accounts
    /// - 200-299: Credentials
    /// - 300-399: Friends
    /// - 400-499: Groups
    /// - 500-599: Validation
    /// - 900-999: Internal
    pub fn code(&self) -> i32 {
        match self {
            // Accounts (100-199)
            Error::EmailTaken => 100,
            Error::NicknameTaken => 101,
            Error::EmailAndNicknameTaken => 102,
            Error::UnknownUser(_) => 103,
            Error::UnknownEmail => 104,
            Error::UnknownNickname => 105,
            Error::NicknameEmailMismatch => 106,
            Error::BadPassword => 107,

            // Credentials (200-299)
            Error::InvalidToken => 200,

            // Friends (300-399)
            Error::SelfRequest => 300,
            Error::AlreadyRequested => 301,
            Error::ReciprocalPending => 302,
            Error::NoSuchRequest => 303,
            Error::AlreadyFriends => 304,
            Error::NotFriends => 305,

            // Groups (400-499)
            Error::GroupNotFound(_) => 400,
            Error::InvalidMembers(_) => 401,
            Error::AlreadyMember => 402,
            Error::NotMember => 403,

            // Validation (500-599)
            Error::InvalidArgument(_) => 500,

            // Internal (900-999)
            Error::AsymmetricFriendship(_, _) => 900,
            Error::DatabaseError(_) => 901,
            Error::SerializationError(_) => 902,
            Error::Internal(_) => 903,
        }
    }

    /// Classify this error into the coarse taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidArgument(_) => ErrorKind::Validation,

            Error::UnknownUser(_)
            | Error::UnknownEmail
            | Error::UnknownNickname
            | Error::NoSuchRequest
            | Error::GroupNotFound(_)
            | Error::InvalidMembers(_) => ErrorKind::NotFound,

            Error::EmailTaken
            | Error::NicknameTaken
            | Error::EmailAndNicknameTaken
            | Error::NicknameEmailMismatch
            | Error::SelfRequest
            | Error::AlreadyRequested
            | Error::ReciprocalPending
            | Error::AlreadyFriends
            | Error::AlreadyMember => ErrorKind::Conflict,

            Error::BadPassword
            | Error::InvalidToken
            | Error::NotFriends
            | Error::NotMember => ErrorKind::Unauthorized,

            Error::AsymmetricFriendship(_, _)
            | Error::DatabaseError(_)
            | Error::SerializationError(_)
            | Error::Internal(_) => ErrorKind::Internal,
        }
    }
}

// ============================================================================
// ERROR CONVERSIONS
// ============================================================================

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::EmailTaken.code(), 100);
        assert_eq!(Error::InvalidToken.code(), 200);
        assert_eq!(Error::SelfRequest.code(), 300);
        assert_eq!(Error::GroupNotFound("g".into()).code(), 400);
        assert_eq!(Error::InvalidArgument("x".into()).code(), 500);
        assert_eq!(Error::Internal("boom".into()).code(), 903);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(Error::InvalidArgument("x".into()).kind(), ErrorKind::Validation);
        assert_eq!(Error::UnknownUser("ghost".into()).kind(), ErrorKind::NotFound);
        assert_eq!(Error::AlreadyRequested.kind(), ErrorKind::Conflict);
        assert_eq!(Error::NotFriends.kind(), ErrorKind::Unauthorized);
        assert_eq!(
            Error::AsymmetricFriendship("a".into(), "b".into()).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_invalid_members_message_lists_offenders() {
        let err = Error::InvalidMembers(vec!["ghost".into(), "phantom".into()]);
        let msg = err.to_string();
        assert!(msg.contains("ghost"));
        assert!(msg.contains("phantom"));
    }
}
