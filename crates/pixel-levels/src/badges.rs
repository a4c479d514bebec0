//! Tier badges: roles granted once a level cutoff is reached.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Level cutoffs that carry a badge.
pub const TIER_CUTOFFS: [i64; 5] = [5, 10, 25, 50, 100];

/// Opaque role identifier understood by the membership service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleToken(String);

impl RoleToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoleToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One cutoff and the role it unlocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierBadge {
    pub cutoff: i64,
    pub role: RoleToken,
}

/// The bot's roles file: one role per named tier.
#[derive(Debug, Clone, Deserialize)]
pub struct LevelRoles {
    pub five: RoleToken,
    pub ten: RoleToken,
    pub twentyfive: RoleToken,
    pub fifty: RoleToken,
    #[serde(alias = "hundered")]
    pub hundred: RoleToken,
}

/// Fixed ascending badge table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BadgeTable {
    badges: Vec<TierBadge>,
}

impl BadgeTable {
    /// Table with placeholder tokens `level-5` … `level-100`.
    pub fn with_default_tokens() -> Self {
        Self {
            badges: TIER_CUTOFFS
                .iter()
                .map(|&cutoff| TierBadge {
                    cutoff,
                    role: RoleToken::new(format!("level-{cutoff}")),
                })
                .collect(),
        }
    }

    pub fn badges(&self) -> &[TierBadge] {
        &self.badges
    }
}

impl From<LevelRoles> for BadgeTable {
    fn from(roles: LevelRoles) -> Self {
        let tokens = [
            roles.five,
            roles.ten,
            roles.twentyfive,
            roles.fifty,
            roles.hundred,
        ];
        Self {
            badges: TIER_CUTOFFS
                .iter()
                .zip(tokens)
                .map(|(&cutoff, role)| TierBadge { cutoff, role })
                .collect(),
        }
    }
}
