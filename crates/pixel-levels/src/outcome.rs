//! Outcome of a progression mutation.
//!
//! Mutations never fail on bad input. They either apply, or report why they
//! were turned away without touching the store.

use thiserror::Error;

/// Input that fails a format precondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidInput {
    #[error("user id must be 18 decimal digits")]
    MalformedUserId,
    #[error("amount is not an integer")]
    MalformedAmount,
    #[error("amount must not be negative")]
    NegativeAmount,
}

/// Well-formed input that the current state refuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BusinessRule {
    #[error("no progression record for user")]
    UnknownUser,
    #[error("change would take the value below zero")]
    WouldGoNegative,
    #[error("change overflows the counter")]
    Overflow,
}

/// Why a mutation was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("invalid input: {0}")]
    Invalid(#[from] InvalidInput),
    #[error("refused: {0}")]
    Refused(#[from] BusinessRule),
}

/// Applied with a payload, or rejected with a reason.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Outcome<T> {
    Applied(T),
    Rejected(Rejection),
}

impl<T> Outcome<T> {
    pub fn rejected(reason: impl Into<Rejection>) -> Self {
        Outcome::Rejected(reason.into())
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied(_))
    }

    pub fn applied(self) -> Option<T> {
        match self {
            Outcome::Applied(value) => Some(value),
            Outcome::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Outcome::Applied(_) => None,
            Outcome::Rejected(reason) => Some(*reason),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Applied(value) => Outcome::Applied(f(value)),
            Outcome::Rejected(reason) => Outcome::Rejected(reason),
        }
    }
}

/// Parse a base-10 integer amount from user-supplied text.
///
/// ```
/// use pixel_levels::{parse_amount, InvalidInput};
///
/// assert_eq!(parse_amount(" -25 "), Ok(-25));
/// assert_eq!(parse_amount("12abc"), Err(InvalidInput::MalformedAmount));
/// ```
pub fn parse_amount(raw: &str) -> Result<i64, InvalidInput> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| InvalidInput::MalformedAmount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_converts_from_both_kinds() {
        let invalid: Outcome<()> = Outcome::rejected(InvalidInput::NegativeAmount);
        let refused: Outcome<()> = Outcome::rejected(BusinessRule::UnknownUser);
        assert_eq!(
            invalid.rejection(),
            Some(Rejection::Invalid(InvalidInput::NegativeAmount))
        );
        assert_eq!(
            refused.rejection(),
            Some(Rejection::Refused(BusinessRule::UnknownUser))
        );
    }

    #[test]
    fn parse_amount_rejects_non_integers() {
        assert_eq!(parse_amount("1.5"), Err(InvalidInput::MalformedAmount));
        assert_eq!(parse_amount(""), Err(InvalidInput::MalformedAmount));
        assert_eq!(parse_amount("+7"), Ok(7));
    }

    #[test]
    fn map_keeps_rejection() {
        let out: Outcome<i64> = Outcome::rejected(BusinessRule::WouldGoNegative);
        assert_eq!(
            out.map(|v| v + 1).rejection(),
            Some(Rejection::Refused(BusinessRule::WouldGoNegative))
        );
        assert_eq!(Outcome::Applied(1).map(|v| v + 1).applied(), Some(2));
    }
}
