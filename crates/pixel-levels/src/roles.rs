//! Tier badge synchronization.
//!
//! Each badge is checked on its own: hold it when the level reaches its
//! cutoff, drop it otherwise. Only the difference is sent to the membership
//! service, so a second pass at the same level issues no mutations.

use crate::badges::BadgeTable;
use crate::store::MembershipService;
use crate::user::UserId;
use std::sync::Arc;

/// What a sync pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncReport {
    /// The member could not be resolved; nothing was attempted.
    Unresolved,
    /// Badge cutoffs granted, revoked, or whose mutation failed.
    Applied {
        granted: Vec<i64>,
        revoked: Vec<i64>,
        failed: Vec<i64>,
    },
}

impl SyncReport {
    /// Whether any grant or revoke was issued.
    pub fn changed_anything(&self) -> bool {
        match self {
            SyncReport::Unresolved => false,
            SyncReport::Applied {
                granted,
                revoked,
                failed,
            } => !(granted.is_empty() && revoked.is_empty() && failed.is_empty()),
        }
    }
}

/// Applies the badge diff for a level.
#[derive(Clone)]
pub struct TierRoleSynchronizer {
    membership: Arc<dyn MembershipService>,
    badges: BadgeTable,
}

impl TierRoleSynchronizer {
    pub fn new(membership: Arc<dyn MembershipService>, badges: BadgeTable) -> Self {
        Self { membership, badges }
    }

    pub fn badges(&self) -> &BadgeTable {
        &self.badges
    }

    /// Bring the member's badges in line with `level`.
    ///
    /// A member that cannot be resolved (left the community, or the service
    /// is unreachable) aborts the whole pass silently.
    pub async fn sync(&self, user_id: &UserId, level: i64) -> SyncReport {
        let Some(member) = self.membership.resolve_member(user_id).await else {
            tracing::debug!(user = %user_id, "member not resolved, skipping badge sync");
            return SyncReport::Unresolved;
        };

        let mut granted = Vec::new();
        let mut revoked = Vec::new();
        let mut failed = Vec::new();

        for badge in self.badges.badges() {
            let holds = self.membership.has_role(&member, &badge.role).await;
            let should_hold = level >= badge.cutoff;

            if should_hold && !holds {
                match self.membership.grant_role(&member, &badge.role).await {
                    Some(_) => {
                        tracing::info!(user = %user_id, role = %badge.role, cutoff = badge.cutoff, "granted tier badge");
                        granted.push(badge.cutoff);
                    }
                    None => {
                        tracing::warn!(user = %user_id, role = %badge.role, "failed to grant tier badge");
                        failed.push(badge.cutoff);
                    }
                }
            } else if !should_hold && holds {
                match self.membership.revoke_role(&member, &badge.role).await {
                    Some(_) => {
                        tracing::info!(user = %user_id, role = %badge.role, cutoff = badge.cutoff, "revoked tier badge");
                        revoked.push(badge.cutoff);
                    }
                    None => {
                        tracing::warn!(user = %user_id, role = %badge.role, "failed to revoke tier badge");
                        failed.push(badge.cutoff);
                    }
                }
            }
        }

        SyncReport::Applied {
            granted,
            revoked,
            failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::badges::RoleToken;
    use crate::memory::MemoryMembership;

    fn user() -> UserId {
        UserId::parse("111111111111111111").unwrap()
    }

    async fn setup() -> (Arc<MemoryMembership>, TierRoleSynchronizer) {
        let membership = Arc::new(MemoryMembership::new());
        membership.join(&user()).await;
        let sync = TierRoleSynchronizer::new(membership.clone(), BadgeTable::with_default_tokens());
        (membership, sync)
    }

    #[tokio::test]
    async fn grants_every_reached_tier() {
        let (membership, sync) = setup().await;

        let report = sync.sync(&user(), 30).await;

        assert_eq!(
            report,
            SyncReport::Applied {
                granted: vec![5, 10, 25],
                revoked: vec![],
                failed: vec![],
            }
        );
        assert_eq!(
            membership.roles_of(&user()).await,
            vec![
                RoleToken::new("level-10"),
                RoleToken::new("level-25"),
                RoleToken::new("level-5"),
            ]
        );
    }

    #[tokio::test]
    async fn second_pass_issues_no_mutations() {
        let (membership, sync) = setup().await;

        sync.sync(&user(), 50).await;
        let after_first = membership.mutation_count();
        let report = sync.sync(&user(), 50).await;

        assert_eq!(membership.mutation_count(), after_first);
        assert!(!report.changed_anything());
    }

    #[tokio::test]
    async fn revokes_tiers_above_level() {
        let (membership, sync) = setup().await;
        sync.sync(&user(), 100).await;

        let report = sync.sync(&user(), 9).await;

        assert_eq!(
            report,
            SyncReport::Applied {
                granted: vec![],
                revoked: vec![10, 25, 50, 100],
                failed: vec![],
            }
        );
        assert_eq!(membership.roles_of(&user()).await, vec![RoleToken::new("level-5")]);
    }

    #[tokio::test]
    async fn tiers_are_independent_of_each_other() {
        let (membership, sync) = setup().await;
        // A gap in held badges is repaired without touching the rest.
        let member = membership.resolve_member(&user()).await.unwrap();
        membership.grant_role(&member, &RoleToken::new("level-25")).await;
        let before = membership.grant_count();

        let report = sync.sync(&user(), 25).await;

        assert_eq!(membership.grant_count() - before, 2);
        assert_eq!(
            report,
            SyncReport::Applied {
                granted: vec![5, 10],
                revoked: vec![],
                failed: vec![],
            }
        );
    }

    #[tokio::test]
    async fn unresolved_member_aborts_silently() {
        let (membership, sync) = setup().await;
        membership.leave(&user()).await;

        let report = sync.sync(&user(), 100).await;

        assert_eq!(report, SyncReport::Unresolved);
        assert_eq!(membership.mutation_count(), 0);
    }

    #[tokio::test]
    async fn failed_grants_are_reported_not_retried() {
        let (membership, sync) = setup().await;
        membership.set_rejecting(true);

        let report = sync.sync(&user(), 10).await;

        assert_eq!(
            report,
            SyncReport::Applied {
                granted: vec![],
                revoked: vec![],
                failed: vec![5, 10],
            }
        );
        assert_eq!(membership.grant_count(), 2);
    }
}
