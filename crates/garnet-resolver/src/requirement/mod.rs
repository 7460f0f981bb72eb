//! Requirement to range conversion
//!
//! Maps each [`Comparator`] to a [`Ranges<Version>`] and intersects the
//! clauses of a [`Requirement`]. With `v⁻` and `v⁺` the lower and upper
//! endpoints of `v`, every platform variant of a number falls on the same
//! side of each range edge:
//!
//! | operator | range                     |
//! |----------|---------------------------|
//! | `~> v`   | `[v⁻, bump(v).A⁻)`        |
//! | `> v`    | `(v⁺, ∞)`                 |
//! | `>= v`   | `[v⁻, ∞)`                 |
//! | `< v`    | `(-∞, v⁻)`                |
//! | `<= v`   | `(-∞, v⁺]`                |
//! | `= v`    | `[v⁻, v⁺]`                |
//! | `!= v`   | complement of `[v⁻, v⁺]`  |

use crate::version::Version;
use garnet_core::types::{Comparator, Op, Requirement, RequirementError};
use pubgrub::Ranges;

/// Set of solver versions
pub type VersionRange = Ranges<Version>;

/// Range matched by one clause
pub fn comparator_range(comparator: &Comparator) -> VersionRange {
    let lower = Version::lower_bound(comparator.version.clone());
    let upper = Version::upper_bound(comparator.version.clone());
    match comparator.op {
        Op::Eq => exactly(lower, upper),
        Op::Neq => exactly(lower, upper).complement(),
        Op::Gt => Ranges::strictly_higher_than(upper),
        Op::Gte => Ranges::higher_than(lower),
        Op::Lt => Ranges::strictly_lower_than(lower),
        Op::Lte => Ranges::lower_than(upper),
        Op::Pessimistic => {
            let bumped = Version::lower_bound(comparator.version.pessimistic_upper_bound());
            Ranges::between(lower, bumped)
        },
    }
}

/// Every variant of one number
fn exactly(lower: Version, upper: Version) -> VersionRange {
    Ranges::higher_than(lower).intersection(&Ranges::lower_than(upper))
}

/// Range matched by every clause of `requirement`
pub fn requirement_range(requirement: &Requirement) -> Result<VersionRange, RequirementError> {
    let mut range = Ranges::full();
    for comparator in requirement.comparators()? {
        range = range.intersection(&comparator_range(&comparator));
    }
    Ok(range)
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use garnet_core::types::{Artifact, GemVersion};
    use proptest::prelude::*;

    fn version_text() -> impl Strategy<Value = String> {
        (
            prop::collection::vec(0u64..4, 1..4),
            prop::option::of(prop_oneof![Just("a"), Just("pre"), Just("rc")]),
        )
            .prop_map(|(numbers, pre)| {
                let mut text = numbers
                    .iter()
                    .map(|n| n.to_string())
                    .collect::<Vec<_>>()
                    .join(".");
                if let Some(pre) = pre {
                    text.push('.');
                    text.push_str(pre);
                }
                text
            })
    }

    fn op() -> impl Strategy<Value = &'static str> {
        prop_oneof![
            Just("="),
            Just("!="),
            Just(">"),
            Just(">="),
            Just("<"),
            Just("<="),
            Just("~>"),
        ]
    }

    proptest! {
        #[test]
        fn test_range_agrees_with_comparator(
            op in op(),
            base in version_text(),
            probe in version_text(),
        ) {
            let comparator: Comparator = format!("{op} {base}").parse().unwrap();
            let probe: GemVersion = probe.parse().unwrap();
            let range = comparator_range(&comparator);

            let expected = comparator.matches(&probe);
            prop_assert_eq!(range.contains(&Version::lower_bound(probe.clone())), expected);

            let candidate = Version::new(probe.clone(), vec![Artifact::new("a", probe)]);
            prop_assert_eq!(range.contains(&candidate), expected);
        }

        #[test]
        fn test_intersection_agrees_with_conjunction(
            first in (op(), version_text()),
            second in (op(), version_text()),
            probe in version_text(),
        ) {
            let requirement = Requirement::new([
                format!("{} {}", first.0, first.1),
                format!("{} {}", second.0, second.1),
            ]);
            let probe: GemVersion = probe.parse().unwrap();
            let range = requirement_range(&requirement).unwrap();
            prop_assert_eq!(
                range.contains(&Version::lower_bound(probe.clone())),
                requirement.matches(&probe).unwrap()
            );
        }
    }
}
