//! 1-based index expressions
//!
//! Cycles, z planes, regions and tiles are numbered from 1 on the command
//! line. An expression is a single number (`3`), an inclusive range
//! (`(2, 6)` or `(1, 11, 2)`) or a list (`[1, 4, 5]` or `1,4,5`).

use lazy_static::lazy_static;
use regex::Regex;

use crate::errors::{CodexError, CodexResult};

lazy_static! {
    static ref SINGLE: Regex = Regex::new(r"^\s*(-?\d+)\s*$").unwrap();
    static ref RANGE: Regex = Regex::new(
        r"^\s*\(\s*(-?\d+)\s*,\s*(-?\d+)\s*(?:,\s*(-?\d+)\s*)?\)\s*$"
    ).unwrap();
    static ref LIST: Regex = Regex::new(
        r"^\s*\[?\s*(-?\d+(?:\s*,\s*-?\d+)*)\s*,?\s*\]?\s*$"
    ).unwrap();
}

/// A parsed index expression, values still 1-based
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexExpr {
    Single(i64),
    /// Inclusive on both ends
    Range { start: i64, stop: i64, step: i64 },
    List(Vec<i64>),
}

impl IndexExpr {
    /// Parse an expression
    ///
    /// # Arguments
    /// * `expr` - Expression text, whitespace is ignored
    ///
    /// # Returns
    /// The parsed expression or `InvalidIndexExpression`
    pub fn parse(expr: &str) -> CodexResult<Self> {
        let invalid = |reason: &str| CodexError::InvalidIndexExpression(format!("\"{}\" {}", expr, reason));

        if let Some(caps) = SINGLE.captures(expr) {
            return Ok(IndexExpr::Single(parse_int(&caps[1], expr)?));
        }

        if let Some(caps) = RANGE.captures(expr) {
            let start = parse_int(&caps[1], expr)?;
            let stop = parse_int(&caps[2], expr)?;
            let step = match caps.get(3) {
                Some(step) => parse_int(step.as_str(), expr)?,
                None => 1,
            };
            if step <= 0 {
                return Err(invalid("has a non-positive step"));
            }
            if stop < start {
                return Err(invalid("ends before it starts"));
            }
            return Ok(IndexExpr::Range { start, stop, step });
        }

        let trimmed = expr.trim();
        if trimmed.starts_with('[') != trimmed.ends_with(']') {
            return Err(invalid("has unbalanced brackets"));
        }

        if let Some(caps) = LIST.captures(expr) {
            let values = caps[1]
                .split(',')
                .map(|item| parse_int(item.trim(), expr))
                .collect::<CodexResult<Vec<i64>>>()?;
            return Ok(IndexExpr::List(values));
        }

        Err(invalid("is not a number, a (start, stop[, step]) range or a list"))
    }

    /// The 1-based values in expression order
    pub fn values(&self) -> Vec<i64> {
        match self {
            IndexExpr::Single(v) => vec![*v],
            IndexExpr::Range { start, stop, step } => {
                (*start..=*stop).step_by(*step as usize).collect()
            }
            IndexExpr::List(values) => values.clone(),
        }
    }

    /// The values shifted to 0-based indexes
    pub fn to_zero_based(&self) -> CodexResult<Vec<usize>> {
        self.values()
            .into_iter()
            .map(|v| {
                if v < 1 {
                    Err(CodexError::InvalidIndexExpression(format!(
                        "index {} is below 1 (indexes are 1-based)", v
                    )))
                } else {
                    Ok((v - 1) as usize)
                }
            })
            .collect()
    }
}

fn parse_int(text: &str, expr: &str) -> CodexResult<i64> {
    text.parse::<i64>().map_err(|e| {
        CodexError::InvalidIndexExpression(format!("\"{}\": {} ({})", expr, text, e))
    })
}

/// Resolve an optional 1-based expression to 0-based indexes
///
/// An absent expression means no restriction and resolves to `None`.
pub fn resolve_index_list(expr: Option<&str>) -> CodexResult<Option<Vec<usize>>> {
    match expr {
        None => Ok(None),
        Some(expr) => IndexExpr::parse(expr)?.to_zero_based().map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single() {
        assert_eq!(IndexExpr::parse(" 4 ").unwrap(), IndexExpr::Single(4));
        assert_eq!(resolve_index_list(Some("4")).unwrap(), Some(vec![3]));
    }

    #[test]
    fn test_ranges_are_inclusive() {
        assert_eq!(IndexExpr::parse("(2, 5)").unwrap().values(), vec![2, 3, 4, 5]);
        assert_eq!(IndexExpr::parse("(1,11,5)").unwrap().values(), vec![1, 6, 11]);
        assert_eq!(resolve_index_list(Some("(1, 3)")).unwrap(), Some(vec![0, 1, 2]));
    }

    #[test]
    fn test_lists_keep_order() {
        assert_eq!(IndexExpr::parse("[3, 1, 2]").unwrap().values(), vec![3, 1, 2]);
        assert_eq!(IndexExpr::parse("5,7").unwrap().values(), vec![5, 7]);
        assert_eq!(resolve_index_list(Some("[2]")).unwrap(), Some(vec![1]));
    }

    #[test]
    fn test_absent_is_unset() {
        assert_eq!(resolve_index_list(None).unwrap(), None);
    }

    #[test]
    fn test_invalid_expressions() {
        for expr in ["", "best", "(3)", "(5, 2)", "(1, 4, 0)", "[1, 2", "1;2", "1.5"] {
            assert!(
                matches!(IndexExpr::parse(expr), Err(CodexError::InvalidIndexExpression(_))),
                "{} should be rejected", expr
            );
        }
    }

    #[test]
    fn test_zero_based_rejects_zero() {
        assert!(resolve_index_list(Some("0")).is_err());
        assert!(resolve_index_list(Some("[1, -2]")).is_err());
    }
}
