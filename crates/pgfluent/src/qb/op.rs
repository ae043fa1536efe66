//! Predicate operator allow-list.
//!
//! Operator text is never spliced into SQL verbatim: callers either use the
//! [`Op`] enum directly or hand a string to [`Op::parse`], which rejects
//! anything outside the allow-list.

use crate::error::{FluentError, FluentResult};

/// Comparison operator for a single-value predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// Equal: column = value
    Eq,
    /// Not equal: column != value
    Ne,
    /// Greater than: column > value
    Gt,
    /// Greater than or equal: column >= value
    Gte,
    /// Less than: column < value
    Lt,
    /// Less than or equal: column <= value
    Lte,
    /// LIKE pattern match
    Like,
    /// Case-insensitive LIKE (PostgreSQL ILIKE)
    ILike,
    /// NOT LIKE pattern match
    NotLike,
    /// NOT ILIKE pattern match
    NotILike,
}

impl Op {
    /// Render the operator as SQL text.
    pub fn as_sql(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "!=",
            Op::Gt => ">",
            Op::Gte => ">=",
            Op::Lt => "<",
            Op::Lte => "<=",
            Op::Like => "LIKE",
            Op::ILike => "ILIKE",
            Op::NotLike => "NOT LIKE",
            Op::NotILike => "NOT ILIKE",
        }
    }

    /// Parse an operator string against the allow-list.
    ///
    /// Matching is case-insensitive for word operators (`like`, `not like`).
    /// `<>` is accepted as a spelling of `!=`.
    pub fn parse(raw: &str) -> FluentResult<Self> {
        let op = match raw.trim() {
            "=" => Op::Eq,
            "!=" | "<>" => Op::Ne,
            ">" => Op::Gt,
            ">=" => Op::Gte,
            "<" => Op::Lt,
            "<=" => Op::Lte,
            other => match other.to_ascii_uppercase().as_str() {
                "LIKE" => Op::Like,
                "ILIKE" => Op::ILike,
                "NOT LIKE" => Op::NotLike,
                "NOT ILIKE" => Op::NotILike,
                _ => {
                    return Err(FluentError::validation(format!(
                        "operator '{raw}' is not allowed in a predicate"
                    )));
                }
            },
        };
        Ok(op)
    }
}

impl std::str::FromStr for Op {
    type Err = FluentError;

    fn from_str(s: &str) -> FluentResult<Self> {
        Op::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_symbol_operators() {
        assert_eq!(Op::parse("=").unwrap(), Op::Eq);
        assert_eq!(Op::parse("<>").unwrap(), Op::Ne);
        assert_eq!(Op::parse(">=").unwrap(), Op::Gte);
    }

    #[test]
    fn parses_word_operators_case_insensitively() {
        assert_eq!(Op::parse("like").unwrap(), Op::Like);
        assert_eq!(Op::parse("Not Like").unwrap(), Op::NotLike);
        assert_eq!(Op::parse(" ILIKE ").unwrap(), Op::ILike);
    }

    #[test]
    fn rejects_anything_else() {
        assert!(Op::parse("= 1 OR 1").unwrap_err().is_validation());
        assert!(Op::parse("; DROP TABLE users").unwrap_err().is_validation());
        assert!(Op::parse("").unwrap_err().is_validation());
    }
}
