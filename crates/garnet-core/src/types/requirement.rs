//! Textual version requirements (`~> 1.2`, `>= 1.0, < 2`).
//!
//! A [`Requirement`] keeps its clauses as written so that two dependency
//! edges can be compared by text. Clauses are parsed on demand into
//! [`Comparator`]s over the closed [`Op`] set.

use crate::types::version::{GemVersion, VersionError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Requirement operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Eq,          // = 1.0
    Neq,         // != 1.0
    Gt,          // > 1.0
    Gte,         // >= 1.0
    Lt,          // < 1.0
    Lte,         // <= 1.0
    Pessimistic, // ~> 1.0
}

/// A single parsed clause
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Comparator {
    pub op: Op,
    pub version: GemVersion,
}

/// Conjunction of requirement clauses, kept as text
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Requirement {
    clauses: Vec<String>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequirementError {
    #[error("Unknown requirement operator `{op}` in `{clause}`")]
    UnknownOperator { op: String, clause: String },

    #[error("Illformed requirement `{clause}`: {source}")]
    InvalidVersion {
        clause: String,
        #[source]
        source: VersionError,
    },
}

impl RequirementError {
    /// Unknown operators are never recoverable; bad version text is.
    pub fn is_unknown_operator(&self) -> bool {
        matches!(self, RequirementError::UnknownOperator { .. })
    }
}

impl FromStr for Op {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "=" => Ok(Op::Eq),
            "!=" => Ok(Op::Neq),
            ">" => Ok(Op::Gt),
            ">=" => Ok(Op::Gte),
            "<" => Ok(Op::Lt),
            "<=" => Ok(Op::Lte),
            "~>" => Ok(Op::Pessimistic),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Op::Eq => "=",
            Op::Neq => "!=",
            Op::Gt => ">",
            Op::Gte => ">=",
            Op::Lt => "<",
            Op::Lte => "<=",
            Op::Pessimistic => "~>",
        };
        f.write_str(symbol)
    }
}

impl Comparator {
    pub fn new(op: Op, version: GemVersion) -> Self {
        Self { op, version }
    }

    /// Check if `version` satisfies this clause
    pub fn matches(&self, version: &GemVersion) -> bool {
        let r = &self.version;
        match self.op {
            Op::Eq => version == r,
            Op::Neq => version != r,
            Op::Gt => version > r,
            Op::Gte => version >= r,
            Op::Lt => version < r,
            Op::Lte => version <= r,
            Op::Pessimistic => version >= r && version.release() < r.bump(),
        }
    }
}

impl FromStr for Comparator {
    type Err = RequirementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let clause = s.trim();
        let op_len = clause
            .find(|c: char| !matches!(c, '=' | '!' | '>' | '<' | '~' | '^'))
            .unwrap_or(clause.len());
        let (op_text, rest) = clause.split_at(op_len);

        let op = if op_text.is_empty() {
            Op::Eq
        } else {
            op_text
                .parse()
                .map_err(|op| RequirementError::UnknownOperator {
                    op,
                    clause: clause.to_string(),
                })?
        };

        let version = rest
            .trim()
            .parse()
            .map_err(|source| RequirementError::InvalidVersion {
                clause: clause.to_string(),
                source,
            })?;

        Ok(Self { op, version })
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.op, self.version)
    }
}

impl Requirement {
    /// Build a requirement from clause strings; an empty list means `>= 0`
    pub fn new<I, S>(clauses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let clauses: Vec<String> = clauses
            .into_iter()
            .map(|clause| clause.into().trim().to_string())
            .filter(|clause| !clause.is_empty())
            .collect();
        if clauses.is_empty() {
            Self::any()
        } else {
            Self { clauses }
        }
    }

    /// `>= 0`
    pub fn any() -> Self {
        Self {
            clauses: vec![">= 0".to_string()],
        }
    }

    /// `= version`
    pub fn exact(version: &GemVersion) -> Self {
        Self {
            clauses: vec![format!("= {version}")],
        }
    }

    /// Parse a comma separated list (`">= 1.0, < 2"`)
    pub fn parse_list(text: &str) -> Self {
        Self::new(text.split(','))
    }

    pub fn clauses(&self) -> &[String] {
        &self.clauses
    }

    pub fn is_any(&self) -> bool {
        self.clauses.len() == 1 && self.clauses[0] == ">= 0"
    }

    /// Parse every clause
    pub fn comparators(&self) -> Result<Vec<Comparator>, RequirementError> {
        self.clauses.iter().map(|clause| clause.parse()).collect()
    }

    /// Check if `version` satisfies every clause
    pub fn matches(&self, version: &GemVersion) -> Result<bool, RequirementError> {
        Ok(self
            .comparators()?
            .iter()
            .all(|comparator| comparator.matches(version)))
    }

    /// Whether any clause names a prerelease version
    pub fn is_prerelease(&self) -> bool {
        self.comparators()
            .map(|comparators| comparators.iter().any(|c| c.version.is_prerelease()))
            .unwrap_or(false)
    }

    /// Concatenate clauses, keeping the first occurrence of each
    pub fn merge(&self, other: &Requirement) -> Requirement {
        let mut clauses = self.clauses.clone();
        for clause in &other.clauses {
            if !clauses.contains(clause) {
                clauses.push(clause.clone());
            }
        }
        if clauses.len() > 1 {
            clauses.retain(|clause| clause != ">= 0");
        }
        Requirement::new(clauses)
    }
}

impl Default for Requirement {
    fn default() -> Self {
        Self::any()
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.clauses.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> GemVersion {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_operators() {
        let cases = [
            ("= 1.0", Op::Eq),
            ("1.0", Op::Eq),
            ("!= 1.0", Op::Neq),
            ("> 1.0", Op::Gt),
            (">=1.0", Op::Gte),
            ("< 1.0", Op::Lt),
            ("<= 1.0", Op::Lte),
            ("~> 1.0", Op::Pessimistic),
        ];
        for (text, op) in cases {
            let comparator: Comparator = text.parse().unwrap();
            assert_eq!(comparator.op, op, "{text}");
            assert_eq!(comparator.version, v("1.0"));
        }
    }

    #[test]
    fn test_unknown_operator() {
        for text in ["=> 1.0", "^1.0", "~1.0", "== 1.0"] {
            let err = text.parse::<Comparator>().unwrap_err();
            assert!(err.is_unknown_operator(), "{text}: {err}");
        }
    }

    #[test]
    fn test_invalid_version_is_not_operator_error() {
        let err = ">= banana".parse::<Comparator>().unwrap_err();
        assert!(!err.is_unknown_operator());
        assert!(matches!(err, RequirementError::InvalidVersion { .. }));
    }

    #[test]
    fn test_pessimistic_matching() {
        let c: Comparator = "~> 1.2".parse().unwrap();
        assert!(c.matches(&v("1.2")));
        assert!(c.matches(&v("1.9.9")));
        assert!(!c.matches(&v("2.0")));
        assert!(!c.matches(&v("2.0.rc1")));
        assert!(!c.matches(&v("1.1")));

        let c: Comparator = "~> 1.2.3".parse().unwrap();
        assert!(c.matches(&v("1.2.9")));
        assert!(!c.matches(&v("1.3")));
    }

    #[test]
    fn test_requirement_conjunction() {
        let req = Requirement::parse_list(">= 1.0, < 2");
        assert_eq!(req.clauses().len(), 2);
        assert!(req.matches(&v("1.5")).unwrap());
        assert!(!req.matches(&v("2.0")).unwrap());
        assert_eq!(req.to_string(), ">= 1.0, < 2");
    }

    #[test]
    fn test_empty_requirement_is_any() {
        let req = Requirement::new(Vec::<String>::new());
        assert!(req.is_any());
        assert!(req.matches(&v("0")).unwrap());
    }

    #[test]
    fn test_merge_dedupes() {
        let a = Requirement::parse_list(">= 1.0");
        let b = Requirement::parse_list(">= 1.0, < 3");
        assert_eq!(a.merge(&b).clauses(), &[">= 1.0", "< 3"]);
        assert_eq!(Requirement::any().merge(&a).clauses(), &[">= 1.0"]);
    }

    #[test]
    fn test_prerelease_requirement() {
        assert!(Requirement::parse_list("~> 2.0.beta").is_prerelease());
        assert!(!Requirement::parse_list("~> 2.0").is_prerelease());
    }
}
