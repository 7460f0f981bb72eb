//! Constraints, terms and incompatibilities produced by the source

use crate::package::Package;
use crate::requirement::VersionRange;
use std::fmt;

/// A package restricted to a range of versions
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub package: Package,
    pub range: VersionRange,
}

/// A constraint that must hold (positive) or must not hold
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub constraint: Constraint,
    pub positive: bool,
}

/// Why an incompatibility exists
#[derive(Debug, Clone, PartialEq)]
pub enum IncompatibilityCause {
    /// The owner depends on the negated package
    Dependency,
    /// The owner declares a requirement that cannot be parsed
    InvalidDependency { package: Package, requirement: String },
}

/// A set of terms that cannot all hold at once
#[derive(Debug, Clone, PartialEq)]
pub struct Incompatibility {
    pub terms: Vec<Term>,
    pub cause: IncompatibilityCause,
    pub custom_explanation: Option<String>,
}

impl Constraint {
    pub fn new(package: Package, range: VersionRange) -> Self {
        Self { package, range }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.package, self.range)
    }
}

impl Term {
    pub fn positive(constraint: Constraint) -> Self {
        Self {
            constraint,
            positive: true,
        }
    }

    pub fn negative(constraint: Constraint) -> Self {
        Self {
            constraint,
            positive: false,
        }
    }

    pub fn package(&self) -> &Package {
        &self.constraint.package
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.positive {
            write!(f, "{}", self.constraint)
        } else {
            write!(f, "not {}", self.constraint)
        }
    }
}

impl Incompatibility {
    /// `owner` versions in its range depend on `dependency`
    pub fn dependency(owner: Constraint, dependency: Constraint) -> Self {
        Self {
            terms: vec![Term::positive(owner), Term::negative(dependency)],
            cause: IncompatibilityCause::Dependency,
            custom_explanation: None,
        }
    }

    /// `owner` cannot be used: its requirement on `package` is malformed
    pub fn invalid_dependency(owner: Constraint, package: Package, requirement: String) -> Self {
        Self {
            terms: vec![Term::positive(owner)],
            cause: IncompatibilityCause::InvalidDependency {
                package,
                requirement,
            },
            custom_explanation: None,
        }
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.custom_explanation = Some(explanation.into());
        self
    }

    /// The depending side
    pub fn owner(&self) -> Option<&Constraint> {
        self.terms
            .iter()
            .find(|term| term.positive)
            .map(|term| &term.constraint)
    }

    /// The depended-on side, absent for invalid dependencies
    pub fn dependency_constraint(&self) -> Option<&Constraint> {
        self.terms
            .iter()
            .find(|term| !term.positive)
            .map(|term| &term.constraint)
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self.cause, IncompatibilityCause::InvalidDependency { .. })
    }
}

impl fmt::Display for Incompatibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(explanation) = &self.custom_explanation {
            return f.write_str(explanation);
        }
        match (&self.cause, self.owner()) {
            (IncompatibilityCause::InvalidDependency { package, requirement }, Some(owner)) => {
                write!(f, "{owner} has an invalid requirement on {package} `{requirement}`")
            },
            (IncompatibilityCause::Dependency, Some(owner)) => match self.dependency_constraint() {
                Some(dependency) => write!(f, "{owner} depends on {dependency}"),
                None => write!(f, "{owner} is forbidden"),
            },
            (_, None) => {
                let terms: Vec<String> = self.terms.iter().map(Term::to_string).collect();
                write!(f, "{{{}}}", terms.join(", "))
            },
        }
    }
}
