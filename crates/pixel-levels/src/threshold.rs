//! Level curve: how much experience each level requires.
//!
//! The curve is linear in the level with two parameters:
//! - `base` exp per level
//! - `add` extra exp per level already held
//!
//! `threshold(L) = base × L + add × (L − 1)`
//!
//! The formula is evaluated literally for every level, including level 0
//! where it yields `−add`. The reconciler relies on that negative lower bound:
//! no exp value can ever fall below it, so level 0 never decrements.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Highest level a user can hold. Exp beyond `threshold(MAX_LEVEL)` saturates.
pub const MAX_LEVEL: i64 = 100;

/// Default exp per level.
pub const DEFAULT_BASE_EXP: i64 = 100;

/// Default extra exp per level held.
pub const DEFAULT_ADD_EXP: i64 = 50;

/// The two-parameter linear level curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCurve {
    base: i64,
    add: i64,
}

impl Default for LevelCurve {
    fn default() -> Self {
        Self {
            base: DEFAULT_BASE_EXP,
            add: DEFAULT_ADD_EXP,
        }
    }
}

impl LevelCurve {
    /// Build a curve. `base` must be positive and `add` non-negative, which
    /// makes `threshold` strictly increasing.
    pub fn new(base: i64, add: i64) -> Result<Self> {
        if base < 1 || add < 0 {
            return Err(Error::InvalidCurve { base, add });
        }
        Ok(Self { base, add })
    }

    pub fn base(&self) -> i64 {
        self.base
    }

    pub fn add(&self) -> i64 {
        self.add
    }

    /// Minimum exp for `level`, literal formula.
    ///
    /// # Examples
    ///
    /// ```
    /// use pixel_levels::LevelCurve;
    ///
    /// let curve = LevelCurve::new(100, 50).unwrap();
    /// assert_eq!(curve.threshold(0), -50); // slack below level 0
    /// assert_eq!(curve.threshold(1), 100);
    /// assert_eq!(curve.threshold(2), 250);
    /// assert_eq!(curve.threshold(3), 400);
    /// ```
    pub const fn threshold(&self, level: i64) -> i64 {
        self.base * level + self.add * (level - 1)
    }

    /// Exp a user is given when their level is set directly, `None` if it
    /// does not fit in an `i64`.
    ///
    /// Level 0 maps to 0 exp instead of the negative `threshold(0)`.
    pub const fn exp_for_level(&self, level: i64) -> Option<i64> {
        if level == 0 {
            return Some(0);
        }
        let Some(scaled) = self.base.checked_mul(level) else {
            return None;
        };
        let Some(extra) = self.add.checked_mul(level - 1) else {
            return None;
        };
        scaled.checked_add(extra)
    }

    /// Whether `exp` lies inside the bracket of `level`.
    pub const fn in_bracket(&self, exp: i64, level: i64) -> bool {
        if exp < self.threshold(level) {
            return false;
        }
        level >= MAX_LEVEL || exp < self.threshold(level + 1)
    }

    /// Walk `start` one level at a time until `exp` sits in its bracket.
    ///
    /// Returns the converged level and the number of steps taken. Steps are
    /// `|result − start|`; there is no iteration cap, so callers keep `exp`
    /// within a range where that walk stays short.
    pub fn converge_level(&self, exp: i64, start: i64) -> (i64, u64) {
        let mut level = start;
        let mut steps = 0u64;
        loop {
            let next = self.threshold(level + 1);
            let prev = self.threshold(level);
            if exp < prev {
                level -= 1;
            } else if exp >= next && level < MAX_LEVEL {
                level += 1;
            } else {
                break;
            }
            steps += 1;
        }
        (level, steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn curve() -> LevelCurve {
        LevelCurve::new(100, 50).unwrap()
    }

    #[test]
    fn rejects_flat_or_falling_curves() {
        assert!(matches!(
            LevelCurve::new(0, 50),
            Err(Error::InvalidCurve { base: 0, add: 50 })
        ));
        assert!(LevelCurve::new(100, -1).is_err());
        assert!(LevelCurve::new(1, 0).is_ok());
    }

    #[test]
    fn threshold_at_zero_is_negative_slack() {
        assert_eq!(curve().threshold(0), -50);
        assert_eq!(curve().exp_for_level(0), Some(0));
    }

    #[test]
    fn exp_for_level_matches_threshold_above_zero() {
        let c = curve();
        for level in 1..=MAX_LEVEL {
            assert_eq!(c.exp_for_level(level), Some(c.threshold(level)));
        }
        assert_eq!(c.exp_for_level(150), Some(100 * 150 + 50 * 149));
        assert_eq!(c.exp_for_level(i64::MAX / 10), None);
    }

    #[test]
    fn worked_example_lands_on_level_two() {
        // 0 → 1 (need 100) → 2 (need 250) → stop, threshold(3) = 400
        let (level, steps) = curve().converge_level(250, 0);
        assert_eq!(level, 2);
        assert_eq!(steps, 2);
    }

    #[test]
    fn converges_downward() {
        let (level, steps) = curve().converge_level(0, 40);
        assert_eq!(level, 0);
        assert_eq!(steps, 40);
    }

    #[test]
    fn saturates_at_max_level() {
        let c = curve();
        let (level, _) = c.converge_level(c.threshold(MAX_LEVEL) * 3, 0);
        assert_eq!(level, MAX_LEVEL);
        assert!(c.in_bracket(i64::MAX / 2, MAX_LEVEL));
    }

    #[test]
    fn level_zero_never_decrements() {
        let (level, steps) = curve().converge_level(0, 0);
        assert_eq!((level, steps), (0, 0));
    }

    proptest! {
        #[test]
        fn threshold_monotonic(base in 1i64..10_000, add in 0i64..10_000) {
            let c = LevelCurve::new(base, add).unwrap();
            for level in 0..MAX_LEVEL {
                prop_assert!(c.threshold(level) <= c.threshold(level + 1));
            }
        }

        #[test]
        fn converges_to_unique_bracket(
            base in 1i64..500,
            add in 0i64..500,
            exp in 0i64..2_000_000,
            start in 0i64..=MAX_LEVEL,
        ) {
            let c = LevelCurve::new(base, add).unwrap();
            let (level, steps) = c.converge_level(exp, start);

            prop_assert!((0..=MAX_LEVEL).contains(&level));
            prop_assert!(c.in_bracket(exp, level));
            prop_assert_eq!(steps, (level - start).unsigned_abs());

            // No other level claims this exp.
            for other in 0..=MAX_LEVEL {
                if other != level {
                    prop_assert!(!c.in_bracket(exp, other));
                }
            }
        }
    }
}
