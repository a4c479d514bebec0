//! Level reconciliation: the stored level relaxes to the bracket of the stored exp.
//!
//! The reconciler always re-reads the persisted record instead of trusting
//! values handed down the call chain. If two adjustments race and one write
//! is lost, the level still ends up consistent with whatever exp landed.
//! A level change writes the level alone, so exp that lands between the read
//! and that write survives.

use crate::error::Result;
use crate::roles::{SyncReport, TierRoleSynchronizer};
use crate::store::ProgressionStore;
use crate::threshold::LevelCurve;
use crate::user::UserId;
use std::sync::Arc;

/// Result of one reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelChange {
    /// Exp the level was reconciled against.
    pub exp: i64,
    /// Level before reconciliation.
    pub from: i64,
    /// Level after reconciliation.
    pub to: i64,
    /// Single-level steps taken.
    pub steps: u64,
    /// Badge sync report, present only when the level changed.
    pub badges: Option<SyncReport>,
}

impl LevelChange {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// Converges stored levels and triggers badge sync on change.
#[derive(Clone)]
pub struct LevelReconciler {
    store: Arc<dyn ProgressionStore>,
    curve: LevelCurve,
    roles: TierRoleSynchronizer,
}

impl LevelReconciler {
    pub fn new(
        store: Arc<dyn ProgressionStore>,
        curve: LevelCurve,
        roles: TierRoleSynchronizer,
    ) -> Self {
        Self { store, curve, roles }
    }

    pub fn curve(&self) -> &LevelCurve {
        &self.curve
    }

    pub fn roles(&self) -> &TierRoleSynchronizer {
        &self.roles
    }

    /// Reconcile one user. `None` if the user has no record.
    pub async fn converge(&self, user_id: &UserId) -> Result<Option<LevelChange>> {
        let Some(current) = self.store.read(user_id).await? else {
            return Ok(None);
        };

        let (level, steps) = if self.curve.in_bracket(current.exp, current.level) {
            (current.level, 0)
        } else {
            self.curve.converge_level(current.exp, current.level)
        };
        tracing::debug!(
            user = %user_id,
            exp = current.exp,
            from = current.level,
            to = level,
            steps,
            "level converged"
        );

        let mut change = LevelChange {
            exp: current.exp,
            from: current.level,
            to: level,
            steps,
            badges: None,
        };

        if change.changed() {
            if !self.store.write_level(user_id, level).await? {
                // Record vanished since the read.
                return Ok(None);
            }
            tracing::info!(user = %user_id, from = current.level, to = level, "level changed");
            change.badges = Some(self.roles.sync(user_id, level).await);
        }

        Ok(Some(change))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::badges::BadgeTable;
    use crate::memory::{MemoryMembership, MemoryStore};
    use crate::threshold::MAX_LEVEL;
    use crate::user::Progression;
    use async_trait::async_trait;

    /// Store that lands an exp write right after every read, as a concurrent
    /// adjustment would.
    struct RacingStore {
        inner: MemoryStore,
        landed_exp: i64,
    }

    #[async_trait]
    impl ProgressionStore for RacingStore {
        async fn read(&self, user_id: &UserId) -> Result<Option<Progression>> {
            let snapshot = self.inner.read(user_id).await?;
            if let Some(record) = snapshot {
                self.inner
                    .write(user_id, Progression::new(self.landed_exp, record.level))
                    .await?;
            }
            Ok(snapshot)
        }

        async fn write(&self, user_id: &UserId, record: Progression) -> Result<()> {
            self.inner.write(user_id, record).await
        }

        async fn write_level(&self, user_id: &UserId, level: i64) -> Result<bool> {
            self.inner.write_level(user_id, level).await
        }

        async fn insert_if_absent(&self, user_id: &UserId, record: Progression) -> Result<bool> {
            self.inner.insert_if_absent(user_id, record).await
        }

        async fn list(&self) -> Result<Vec<(UserId, Progression)>> {
            self.inner.list().await
        }
    }

    fn user() -> UserId {
        UserId::parse("222222222222222222").unwrap()
    }

    async fn setup(record: Progression) -> (Arc<MemoryStore>, Arc<MemoryMembership>, LevelReconciler) {
        let store = Arc::new(MemoryStore::new());
        store.seed(&user(), record).await;
        let membership = Arc::new(MemoryMembership::new());
        membership.join(&user()).await;
        let roles = TierRoleSynchronizer::new(membership.clone(), BadgeTable::with_default_tokens());
        let reconciler = LevelReconciler::new(store.clone(), LevelCurve::default(), roles);
        (store, membership, reconciler)
    }

    #[tokio::test]
    async fn raises_level_through_several_brackets() {
        let (store, _, reconciler) = setup(Progression::new(250, 0)).await;

        let change = reconciler.converge(&user()).await.unwrap().unwrap();

        assert_eq!((change.from, change.to, change.steps), (0, 2, 2));
        assert_eq!(store.read(&user()).await.unwrap(), Some(Progression::new(250, 2)));
    }

    #[tokio::test]
    async fn lowers_level_after_exp_drop() {
        let curve = LevelCurve::default();
        let (store, membership, reconciler) =
            setup(Progression::new(curve.threshold(12), 60)).await;

        let change = reconciler.converge(&user()).await.unwrap().unwrap();

        assert_eq!(change.to, 12);
        assert_eq!(store.read(&user()).await.unwrap().unwrap().level, 12);
        // Badges 5 and 10 granted on the way down from an unsynced state.
        assert_eq!(membership.grant_count(), 2);
    }

    #[tokio::test]
    async fn consistent_record_is_not_rewritten() {
        let (store, membership, reconciler) = setup(Progression::new(260, 2)).await;

        let change = reconciler.converge(&user()).await.unwrap().unwrap();

        assert!(!change.changed());
        assert!(change.badges.is_none());
        assert_eq!(store.write_count(), 0);
        assert_eq!(membership.mutation_count(), 0);
    }

    #[tokio::test]
    async fn saturates_at_hundred() {
        let (store, _, reconciler) = setup(Progression::new(10_000_000, 0)).await;

        reconciler.converge(&user()).await.unwrap();

        assert_eq!(store.read(&user()).await.unwrap().unwrap().level, MAX_LEVEL);
    }

    #[tokio::test]
    async fn level_write_keeps_exp_that_landed_after_read() {
        let inner = MemoryStore::new();
        inner.seed(&user(), Progression::new(250, 0)).await;
        let store = Arc::new(RacingStore {
            inner,
            landed_exp: 5_000,
        });
        let membership = Arc::new(MemoryMembership::new());
        let roles = TierRoleSynchronizer::new(membership, BadgeTable::with_default_tokens());
        let reconciler = LevelReconciler::new(store.clone(), LevelCurve::default(), roles);

        let change = reconciler.converge(&user()).await.unwrap().unwrap();

        assert_eq!(change.to, 2);
        let stored = store.inner.read(&user()).await.unwrap().unwrap();
        assert_eq!(stored, Progression::new(5_000, 2));
    }

    #[tokio::test]
    async fn missing_record_is_none() {
        let (_, _, reconciler) = setup(Progression::default()).await;
        let stranger = UserId::parse("999999999999999999").unwrap();

        assert_eq!(reconciler.converge(&stranger).await.unwrap(), None);
    }

    #[tokio::test]
    async fn store_failure_propagates() {
        let (store, _, reconciler) = setup(Progression::new(250, 0)).await;
        store.set_failing(true);

        assert!(reconciler.converge(&user()).await.is_err());
    }
}
