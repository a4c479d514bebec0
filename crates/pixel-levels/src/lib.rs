//! Pixel Pizza progression core
//!
//! Tracks a per-user activity counter ("exp"), derives a level from it, and
//! keeps tier badges in line with that level.
//!
//! # Components
//!
//! - **ExperienceStore**: validates and applies exp/level mutations
//! - **LevelReconciler**: relaxes the stored level to the bracket of the stored exp
//! - **TierRoleSynchronizer**: grants and revokes badges at levels 5, 10, 25, 50, 100
//!
//! An applied mutation always reconciles; a level change always syncs
//! badges. Bad input never errors, it comes back as [`Outcome::Rejected`].
//!
//! # Level Curve
//!
//! `threshold(L) = base × L + add × (L − 1)`, saturating at level 100.
//!
//! # Example
//!
//! ```
//! use pixel_levels::{
//!     BadgeTable, ExperienceStore, LevelCurve, LevelReconciler, MemoryMembership,
//!     MemoryStore, TierRoleSynchronizer,
//! };
//! use std::sync::Arc;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let store = Arc::new(MemoryStore::new());
//! let membership = Arc::new(MemoryMembership::new());
//! let roles = TierRoleSynchronizer::new(membership, BadgeTable::with_default_tokens());
//! let reconciler = LevelReconciler::new(store.clone(), LevelCurve::default(), roles);
//! let exp = ExperienceStore::new(store, reconciler);
//!
//! exp.ensure_user("123456789012345678").await.unwrap();
//! let change = exp.adjust_exp("123456789012345678", 250).await.unwrap();
//! assert_eq!(change.applied().unwrap().to, 2);
//! # });
//! ```

mod badges;
mod error;
mod experience;
pub mod leaderboard;
mod memory;
mod outcome;
mod reconciler;
mod roles;
mod store;
mod threshold;
mod user;

pub use badges::{BadgeTable, LevelRoles, RoleToken, TierBadge, TIER_CUTOFFS};
pub use error::{Error, Result};
pub use experience::ExperienceStore;
pub use memory::{MemoryMembership, MemoryStore};
pub use outcome::{parse_amount, BusinessRule, InvalidInput, Outcome, Rejection};
pub use reconciler::{LevelChange, LevelReconciler};
pub use roles::{SyncReport, TierRoleSynchronizer};
pub use store::{Member, MembershipService, ProgressionStore};
pub use threshold::{LevelCurve, DEFAULT_ADD_EXP, DEFAULT_BASE_EXP, MAX_LEVEL};
pub use user::{Progression, UserId, USER_ID_LEN};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn badge_cutoffs_fit_level_range() {
        assert!(TIER_CUTOFFS.iter().all(|&c| c > 0 && c <= MAX_LEVEL));
        assert_eq!(TIER_CUTOFFS.last(), Some(&MAX_LEVEL));
    }
}
