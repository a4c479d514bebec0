//! Validated exp and level mutations.
//!
//! Every applied write is followed by reconciliation, so callers never drive
//! the reconciler themselves. Reads and writes are not isolated from each
//! other: two concurrent adjustments of the same user can race and the later
//! write wins. Activity counters tolerate that; reconciliation keeps the
//! level consistent with whichever exp survives.

use crate::error::Result;
use crate::outcome::{BusinessRule, InvalidInput, Outcome};
use crate::reconciler::{LevelChange, LevelReconciler};
use crate::store::ProgressionStore;
use crate::threshold::LevelCurve;
use crate::user::{Progression, UserId};
use std::sync::Arc;

/// Entry point for progression mutations.
#[derive(Clone)]
pub struct ExperienceStore {
    store: Arc<dyn ProgressionStore>,
    reconciler: LevelReconciler,
}

impl ExperienceStore {
    pub fn new(store: Arc<dyn ProgressionStore>, reconciler: LevelReconciler) -> Self {
        Self { store, reconciler }
    }

    pub fn curve(&self) -> &LevelCurve {
        self.reconciler.curve()
    }

    pub fn reconciler(&self) -> &LevelReconciler {
        &self.reconciler
    }

    /// Create an empty record for a user on first activity.
    pub async fn ensure_user(&self, user_id: &str) -> Result<Outcome<bool>> {
        let user_id = match UserId::parse(user_id) {
            Ok(id) => id,
            Err(invalid) => return Ok(Outcome::rejected(invalid)),
        };
        let created = self
            .store
            .insert_if_absent(&user_id, Progression::default())
            .await?;
        if created {
            tracing::info!(user = %user_id, "created progression record");
        }
        Ok(Outcome::Applied(created))
    }

    /// Add `delta` (possibly negative) to a user's exp.
    pub async fn adjust_exp(&self, user_id: &str, delta: i64) -> Result<Outcome<LevelChange>> {
        let user_id = match UserId::parse(user_id) {
            Ok(id) => id,
            Err(invalid) => return Ok(Outcome::rejected(invalid)),
        };
        let Some(current) = self.store.read(&user_id).await? else {
            return Ok(Outcome::rejected(BusinessRule::UnknownUser));
        };
        let Some(wanted) = current.exp.checked_add(delta) else {
            return Ok(Outcome::rejected(BusinessRule::Overflow));
        };
        if wanted < 0 {
            tracing::debug!(user = %user_id, exp = current.exp, delta, "exp would go negative");
            return Ok(Outcome::rejected(BusinessRule::WouldGoNegative));
        }
        self.write_exp(&user_id, current, wanted).await
    }

    /// Replace a user's exp.
    pub async fn set_exp(&self, user_id: &str, amount: i64) -> Result<Outcome<LevelChange>> {
        let user_id = match UserId::parse(user_id) {
            Ok(id) => id,
            Err(invalid) => return Ok(Outcome::rejected(invalid)),
        };
        if amount < 0 {
            return Ok(Outcome::rejected(InvalidInput::NegativeAmount));
        }
        let Some(current) = self.store.read(&user_id).await? else {
            return Ok(Outcome::rejected(BusinessRule::UnknownUser));
        };
        self.write_exp(&user_id, current, amount).await
    }

    /// Add `delta` (possibly negative) to a user's level.
    pub async fn adjust_level(&self, user_id: &str, delta: i64) -> Result<Outcome<LevelChange>> {
        let parsed = match UserId::parse(user_id) {
            Ok(id) => id,
            Err(invalid) => return Ok(Outcome::rejected(invalid)),
        };
        let Some(current) = self.store.read(&parsed).await? else {
            return Ok(Outcome::rejected(BusinessRule::UnknownUser));
        };
        let Some(wanted) = current.level.checked_add(delta) else {
            return Ok(Outcome::rejected(BusinessRule::Overflow));
        };
        if wanted < 0 {
            return Ok(Outcome::rejected(BusinessRule::WouldGoNegative));
        }
        self.set_level(user_id, wanted).await
    }

    /// Set a user's level by giving them exactly the exp that level requires.
    ///
    /// Levels past 100 are accepted; reconciliation caps the stored level.
    pub async fn set_level(&self, user_id: &str, amount: i64) -> Result<Outcome<LevelChange>> {
        if let Err(invalid) = UserId::parse(user_id) {
            return Ok(Outcome::rejected(invalid));
        }
        if amount < 0 {
            return Ok(Outcome::rejected(InvalidInput::NegativeAmount));
        }
        let Some(exp) = self.curve().exp_for_level(amount) else {
            return Ok(Outcome::rejected(BusinessRule::Overflow));
        };
        self.set_exp(user_id, exp).await
    }

    async fn write_exp(
        &self,
        user_id: &UserId,
        current: Progression,
        exp: i64,
    ) -> Result<Outcome<LevelChange>> {
        self.store
            .write(user_id, Progression::new(exp, current.level))
            .await?;

        // Reconcile against whatever is stored now, not the value just written.
        let change = self.reconciler.converge(user_id).await?.unwrap_or(LevelChange {
            exp,
            from: current.level,
            to: current.level,
            steps: 0,
            badges: None,
        });
        Ok(Outcome::Applied(change))
    }
}
