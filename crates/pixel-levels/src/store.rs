//! Collaborator seams: the persisted record store and the membership service.

use crate::badges::RoleToken;
use crate::error::Result;
use crate::user::{Progression, UserId};
use async_trait::async_trait;

/// Persisted per-user progression records.
///
/// Reads and writes are independent; there is no transaction spanning a
/// read and the following write.
#[async_trait]
pub trait ProgressionStore: Send + Sync {
    /// Read a record, `None` when the user has none.
    async fn read(&self, user_id: &UserId) -> Result<Option<Progression>>;

    /// Overwrite a record.
    async fn write(&self, user_id: &UserId, record: Progression) -> Result<()>;

    /// Replace only the level of an existing record, leaving exp as stored.
    /// Returns `false` when there is no record.
    async fn write_level(&self, user_id: &UserId, level: i64) -> Result<bool>;

    /// Create a record unless one exists. Returns whether it was created.
    async fn insert_if_absent(&self, user_id: &UserId, record: Progression) -> Result<bool>;

    /// All records, in no particular order.
    async fn list(&self) -> Result<Vec<(UserId, Progression)>>;
}

/// A resolved community member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub user_id: UserId,
}

/// Role membership in the community.
///
/// `grant_role` and `revoke_role` must be safe to call when the member is
/// already in the target state. They return `None` when the call failed.
#[async_trait]
pub trait MembershipService: Send + Sync {
    async fn resolve_member(&self, user_id: &UserId) -> Option<Member>;

    async fn has_role(&self, member: &Member, role: &RoleToken) -> bool;

    async fn grant_role(&self, member: &Member, role: &RoleToken) -> Option<Member>;

    async fn revoke_role(&self, member: &Member, role: &RoleToken) -> Option<Member>;
}
