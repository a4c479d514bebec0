//! In-memory collaborators.
//!
//! Useful for embedding without a database and for tests: both keep counters
//! of the calls that reach them so callers can see what was (not) issued.

use crate::badges::RoleToken;
use crate::error::{Error, Result};
use crate::store::{Member, MembershipService, ProgressionStore};
use crate::user::{Progression, UserId};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// Progression records held in a map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<UserId, Progression>>,
    writes: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record without counting it as a write.
    pub async fn seed(&self, user_id: &UserId, record: Progression) {
        self.records.write().await.insert(user_id.clone(), record);
    }

    /// Number of successful `write`, `write_level` and `insert_if_absent` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every subsequent call fail with a store error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(Error::Store("memory store offline".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ProgressionStore for MemoryStore {
    async fn read(&self, user_id: &UserId) -> Result<Option<Progression>> {
        self.check()?;
        Ok(self.records.read().await.get(user_id).copied())
    }

    async fn write(&self, user_id: &UserId, record: Progression) -> Result<()> {
        self.check()?;
        self.records.write().await.insert(user_id.clone(), record);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn write_level(&self, user_id: &UserId, level: i64) -> Result<bool> {
        self.check()?;
        let mut records = self.records.write().await;
        let Some(record) = records.get_mut(user_id) else {
            return Ok(false);
        };
        record.level = level;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn insert_if_absent(&self, user_id: &UserId, record: Progression) -> Result<bool> {
        self.check()?;
        let mut records = self.records.write().await;
        if records.contains_key(user_id) {
            return Ok(false);
        }
        records.insert(user_id.clone(), record);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn list(&self) -> Result<Vec<(UserId, Progression)>> {
        self.check()?;
        Ok(self
            .records
            .read()
            .await
            .iter()
            .map(|(id, record)| (id.clone(), *record))
            .collect())
    }
}

/// Members and their roles held in memory.
#[derive(Debug, Default)]
pub struct MemoryMembership {
    roles: RwLock<HashMap<UserId, HashSet<RoleToken>>>,
    grants: AtomicUsize,
    revokes: AtomicUsize,
    rejecting: AtomicBool,
}

impl MemoryMembership {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member with no roles.
    pub async fn join(&self, user_id: &UserId) {
        self.roles.write().await.entry(user_id.clone()).or_default();
    }

    /// Remove a member entirely.
    pub async fn leave(&self, user_id: &UserId) {
        self.roles.write().await.remove(user_id);
    }

    /// Roles currently held, sorted.
    pub async fn roles_of(&self, user_id: &UserId) -> Vec<RoleToken> {
        let mut roles: Vec<_> = self
            .roles
            .read()
            .await
            .get(user_id)
            .map(|r| r.iter().cloned().collect())
            .unwrap_or_default();
        roles.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        roles
    }

    /// Grant and revoke calls received (including failed ones).
    pub fn mutation_count(&self) -> usize {
        self.grants.load(Ordering::SeqCst) + self.revokes.load(Ordering::SeqCst)
    }

    pub fn grant_count(&self) -> usize {
        self.grants.load(Ordering::SeqCst)
    }

    /// Make grant and revoke report failure.
    pub fn set_rejecting(&self, rejecting: bool) {
        self.rejecting.store(rejecting, Ordering::SeqCst);
    }
}

#[async_trait]
impl MembershipService for MemoryMembership {
    async fn resolve_member(&self, user_id: &UserId) -> Option<Member> {
        self.roles
            .read()
            .await
            .contains_key(user_id)
            .then(|| Member {
                user_id: user_id.clone(),
            })
    }

    async fn has_role(&self, member: &Member, role: &RoleToken) -> bool {
        self.roles
            .read()
            .await
            .get(&member.user_id)
            .is_some_and(|roles| roles.contains(role))
    }

    async fn grant_role(&self, member: &Member, role: &RoleToken) -> Option<Member> {
        self.grants.fetch_add(1, Ordering::SeqCst);
        if self.rejecting.load(Ordering::SeqCst) {
            return None;
        }
        let mut roles = self.roles.write().await;
        roles.get_mut(&member.user_id)?.insert(role.clone());
        Some(member.clone())
    }

    async fn revoke_role(&self, member: &Member, role: &RoleToken) -> Option<Member> {
        self.revokes.fetch_add(1, Ordering::SeqCst);
        if self.rejecting.load(Ordering::SeqCst) {
            return None;
        }
        let mut roles = self.roles.write().await;
        roles.get_mut(&member.user_id)?.remove(role);
        Some(member.clone())
    }
}
