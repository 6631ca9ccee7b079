//! # Group Registry
//!
//! Named member lists that gate group messaging.
//!
//! A group is created with a name, a creator, and an initial member list.
//! Every proposed member must resolve to an account; the creator is always a
//! member whether or not they listed themself. Membership only grows, and
//! the member list preserves join order.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::messaging::Message;
use crate::storage::Database;

/// A group with its current member list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    /// Group id
    pub id: String,
    /// Display name
    pub name: String,
    /// Creator nickname
    pub creator: String,
    /// Creation timestamp
    pub created_at: i64,
    /// Members in join order
    pub members: Vec<String>,
}

/// The (id, name) pair returned when listing an account's groups
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSummary {
    /// Group id
    pub id: String,
    /// Display name
    pub name: String,
}

/// Group registry service
pub struct GroupService {
    db: Arc<Database>,
}

impl GroupService {
    /// Create a new group service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create a group and return it with its initial member list
    ///
    /// All proposed members are validated up front; if any nickname does not
    /// resolve, the whole creation is rejected and the offenders are listed
    /// in the error. Duplicates in the proposal collapse to one membership,
    /// and the creator joins first whether listed or not.
    pub fn create_group(
        &self,
        name: &str,
        creator: &str,
        initial_members: &[String],
    ) -> Result<Group> {
        if name.trim().is_empty() {
            return Err(Error::InvalidArgument("group name must not be empty".into()));
        }
        if !self.db.account_exists(creator)? {
            return Err(Error::UnknownUser(creator.to_string()));
        }

        let mut invalid = Vec::new();
        for member in initial_members {
            if !self.db.account_exists(member)? {
                invalid.push(member.clone());
            }
        }
        if !invalid.is_empty() {
            return Err(Error::InvalidMembers(invalid));
        }

        // Creator first, then the proposal in order, duplicates dropped.
        let mut members = vec![creator.to_string()];
        for member in initial_members {
            if !members.contains(member) {
                members.push(member.clone());
            }
        }

        let id = uuid::Uuid::new_v4().to_string();
        let created_at = crate::time::now_timestamp();
        self.db.create_group(&id, name, creator, created_at, &members)?;

        tracing::info!("Group {} ({}) created by {} with {} member(s)", id, name, creator, members.len());

        Ok(Group {
            id,
            name: name.to_string(),
            creator: creator.to_string(),
            created_at,
            members,
        })
    }

    /// Add a member to an existing group
    pub fn add_member(&self, group_id: &str, member: &str) -> Result<()> {
        if !self.db.account_exists(member)? {
            return Err(Error::UnknownUser(member.to_string()));
        }

        self.db.add_group_member(group_id, member)?;

        tracing::info!("Member {} added to group {}", member, group_id);

        Ok(())
    }

    /// Get a group with its current member list
    pub fn get_group(&self, group_id: &str) -> Result<Group> {
        let record = self
            .db
            .get_group(group_id)?
            .ok_or_else(|| Error::GroupNotFound(group_id.to_string()))?;

        let members = self.db.group_members(group_id)?;

        Ok(Group {
            id: record.id,
            name: record.name,
            creator: record.creator,
            created_at: record.created_at,
            members,
        })
    }

    /// List a group's members in join order
    pub fn members(&self, group_id: &str) -> Result<Vec<String>> {
        if self.db.get_group(group_id)?.is_none() {
            return Err(Error::GroupNotFound(group_id.to_string()));
        }
        self.db.group_members(group_id)
    }

    /// List the groups a nickname belongs to, in join order
    pub fn groups_of(&self, nickname: &str) -> Result<Vec<GroupSummary>> {
        Ok(self
            .db
            .groups_for(nickname)?
            .into_iter()
            .map(|(id, name)| GroupSummary { id, name })
            .collect())
    }

    /// A group's message log in append order
    pub fn messages(&self, group_id: &str) -> Result<Vec<Message>> {
        if self.db.get_group(group_id)?.is_none() {
            return Err(Error::GroupNotFound(group_id.to_string()));
        }
        Ok(self
            .db
            .group_messages(group_id)?
            .into_iter()
            .map(Message::from_record)
            .collect())
    }
}

// ============================================================================
// TESTS
// ============================================================================
