//! Persistent storage using RocksDB.
//!
//! Keys:
//! - `user:{id}` → JSON [`Progression`]
//! - `member:{id}` → present while the user is in the community
//! - `role:{id}:{token}` → present while the user holds the role

use crate::error::{Error, Result};
use async_trait::async_trait;
use pixel_levels::{Member, MembershipService, Progression, ProgressionStore, RoleToken, UserId};
use rocksdb::{ErrorKind, Options, DB};
use std::path::Path;
use std::time::Duration;

/// How hard to try when the database is busy (e.g. locked by another process).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_millis(100),
        }
    }
}

/// Storage backend for progression records and the role ledger.
pub struct Storage {
    db: DB,
}

impl Storage {
    /// Open or create storage at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = DB::open(&opts, path)?;
        Ok(Self { db })
    }

    /// Open storage, retrying transient failures up to `policy.max_attempts` times.
    ///
    /// Only busy/IO-class errors are retried; anything else (corruption, bad
    /// options) fails on the first attempt.
    pub async fn connect<P: AsRef<Path>>(path: P, policy: RetryPolicy) -> Result<Self> {
        let path = path.as_ref();
        let max_attempts = policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let mut opts = Options::default();
            opts.create_if_missing(true);

            match DB::open(&opts, path) {
                Ok(db) => {
                    if attempt > 1 {
                        tracing::info!("Store opened after {} attempts", attempt);
                    }
                    return Ok(Self { db });
                }
                Err(e) if is_transient(&e) && attempt < max_attempts => {
                    tracing::warn!(
                        "Store busy (attempt {}/{}): {}",
                        attempt,
                        max_attempts,
                        e
                    );
                    tokio::time::sleep(policy.delay).await;
                }
                Err(e) if is_transient(&e) => {
                    return Err(Error::StoreUnavailable {
                        attempts: attempt,
                        last: e.to_string(),
                    });
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    // --- Progression records ---

    /// Get a user's record.
    pub fn get_user(&self, user_id: &UserId) -> Result<Option<Progression>> {
        let key = format!("user:{}", user_id);
        match self.db.get(key.as_bytes())? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }

    /// Store a user's record.
    pub fn put_user(&self, user_id: &UserId, record: &Progression) -> Result<()> {
        let key = format!("user:{}", user_id);
        let value = serde_json::to_vec(record)?;
        self.db.put(key.as_bytes(), value)?;
        Ok(())
    }

    /// Update the level of an existing record. Returns `false` if there is none.
    ///
    /// This is a get and put of one key with nothing in between, not a
    /// RocksDB transaction.
    pub fn put_level(&self, user_id: &UserId, level: i64) -> Result<bool> {
        let Some(mut record) = self.get_user(user_id)? else {
            return Ok(false);
        };
        record.level = level;
        self.put_user(user_id, &record)?;
        Ok(true)
    }

    /// List all records.
    pub fn list_users(&self) -> Result<Vec<(UserId, Progression)>> {
        let prefix = b"user:";
        let mut users = Vec::new();

        let iter = self.db.prefix_iterator(prefix);
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            let key_str = String::from_utf8_lossy(&key);
            let Some(raw_id) = key_str.strip_prefix("user:") else {
                continue;
            };
            match UserId::parse(raw_id) {
                Ok(id) => users.push((id, serde_json::from_slice(&value)?)),
                Err(_) => tracing::warn!("Skipping record with malformed key {:?}", key_str),
            }
        }

        Ok(users)
    }

    // --- Membership / role ledger ---

    /// Check if a user is a community member.
    pub fn is_member(&self, user_id: &UserId) -> Result<bool> {
        let key = format!("member:{}", user_id);
        Ok(self.db.get(key.as_bytes())?.is_some())
    }

    /// Add or remove a member. Leaving drops every role the member held.
    pub fn set_member(&self, user_id: &UserId, is_member: bool) -> Result<()> {
        let key = format!("member:{}", user_id);
        if is_member {
            self.db.put(key.as_bytes(), b"1")?;
        } else {
            self.db.delete(key.as_bytes())?;
            for role in self.list_roles(user_id)? {
                self.revoke_role(user_id, &role)?;
            }
        }
        Ok(())
    }

    /// Check if a user holds a role.
    pub fn has_role(&self, user_id: &UserId, role: &RoleToken) -> Result<bool> {
        let key = format!("role:{}:{}", user_id, role);
        Ok(self.db.get(key.as_bytes())?.is_some())
    }

    /// Grant a role.
    pub fn grant_role(&self, user_id: &UserId, role: &RoleToken) -> Result<()> {
        let key = format!("role:{}:{}", user_id, role);
        self.db.put(key.as_bytes(), b"1")?;
        Ok(())
    }

    /// Revoke a role.
    pub fn revoke_role(&self, user_id: &UserId, role: &RoleToken) -> Result<()> {
        let key = format!("role:{}:{}", user_id, role);
        self.db.delete(key.as_bytes())?;
        Ok(())
    }

    /// List the roles a user holds.
    pub fn list_roles(&self, user_id: &UserId) -> Result<Vec<RoleToken>> {
        let prefix = format!("role:{}:", user_id);
        let mut roles = Vec::new();

        let iter = self.db.prefix_iterator(prefix.as_bytes());
        for item in iter {
            let (key, _) = item?;
            if key.starts_with(prefix.as_bytes()) {
                // Extract token from "role:{id}:{token}"
                let key_str = String::from_utf8_lossy(&key);
                if let Some(token) = key_str.strip_prefix(prefix.as_str()) {
                    roles.push(RoleToken::new(token));
                }
            } else {
                break;
            }
        }

        Ok(roles)
    }
}

fn is_transient(e: &rocksdb::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::IOError | ErrorKind::Busy | ErrorKind::TryAgain | ErrorKind::TimedOut
    )
}

#[async_trait]
impl ProgressionStore for Storage {
    async fn read(&self, user_id: &UserId) -> pixel_levels::Result<Option<Progression>> {
        self.get_user(user_id).map_err(|e| match e {
            Error::Serialization(reason) => pixel_levels::Error::CorruptRecord {
                user_id: user_id.to_string(),
                reason: reason.to_string(),
            },
            other => other.into(),
        })
    }

    async fn write(&self, user_id: &UserId, record: Progression) -> pixel_levels::Result<()> {
        Ok(self.put_user(user_id, &record)?)
    }

    async fn write_level(&self, user_id: &UserId, level: i64) -> pixel_levels::Result<bool> {
        Ok(self.put_level(user_id, level)?)
    }

    async fn insert_if_absent(
        &self,
        user_id: &UserId,
        record: Progression,
    ) -> pixel_levels::Result<bool> {
        if self.get_user(user_id)?.is_some() {
            return Ok(false);
        }
        self.put_user(user_id, &record)?;
        Ok(true)
    }

    async fn list(&self) -> pixel_levels::Result<Vec<(UserId, Progression)>> {
        Ok(self.list_users()?)
    }
}

/// A storage failure is indistinguishable from "not a member" / "call failed".
#[async_trait]
impl MembershipService for Storage {
    async fn resolve_member(&self, user_id: &UserId) -> Option<Member> {
        match self.is_member(user_id) {
            Ok(true) => Some(Member {
                user_id: user_id.clone(),
            }),
            Ok(false) => None,
            Err(e) => {
                tracing::warn!("Member lookup failed for {}: {}", user_id, e);
                None
            }
        }
    }

    async fn has_role(&self, member: &Member, role: &RoleToken) -> bool {
        Storage::has_role(self, &member.user_id, role).unwrap_or(false)
    }

    async fn grant_role(&self, member: &Member, role: &RoleToken) -> Option<Member> {
        Storage::grant_role(self, &member.user_id, role)
            .ok()
            .map(|_| member.clone())
    }

    async fn revoke_role(&self, member: &Member, role: &RoleToken) -> Option<Member> {
        Storage::revoke_role(self, &member.user_id, role)
            .ok()
            .map(|_| member.clone())
    }
}
