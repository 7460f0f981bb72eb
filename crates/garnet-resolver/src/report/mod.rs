//! User-facing failure messages
//!
//! Messages that depend on resolver state: missing gems, gems held back by
//! the locked set, and the explanation of an unsatisfiable resolution.

use crate::error::ConflictTree;
use crate::index::Source;
use crate::package::Package;
use crate::universe::PackageUniverse;
use camino::Utf8Path;
use garnet_core::types::{Artifact, Dependency, GemVersion, Platform};
use indexmap::IndexMap;
use pubgrub::{DefaultStringReporter, DerivationTree, External, Reporter};

/// A rendered not-found message and the artifacts it lists
#[derive(Debug, Clone, PartialEq)]
pub struct NotFound {
    pub message: String,
    pub listed: Vec<String>,
}

/// Message for a requirement the locked set rules out
pub fn locked_gem_message(dependency: &Dependency, locked: &GemVersion) -> String {
    let name = &dependency.name;
    format!(
        "You have requested:\n  {name} {requirement}\n\n\
         The bundle currently has {name} locked at {locked}.\n\
         Try running `bundle update {name}`\n\n\
         If you are updating multiple gems in your Gemfile at once,\n\
         try passing them all to `bundle update`",
        requirement = dependency.requirement,
    )
}

/// Message for a requirement no artifact in `source` satisfies.
///
/// When some artifacts match the requirement but not the requested
/// platforms, only those are listed and the platforms are named.
pub fn gem_not_found(
    dependency: &Dependency,
    source: &dyn Source,
    platforms: &[Platform],
    cache_location: Option<&Utf8Path>,
    extra_message: Option<&str>,
) -> NotFound {
    let mut specs = source.search(&dependency.name);
    specs.sort_by(|a, b| {
        a.version
            .cmp(&b.version)
            .then_with(|| a.platform.to_string().cmp(&b.platform.to_string()))
    });

    let mut matching_part = dependency.name.clone();
    let mut requirement_label = dependency.to_string();
    let cache_message = cache_location
        .map(|path| format!(" or in gems cached in {path}"))
        .unwrap_or_default();

    let matching: Vec<Artifact> = specs
        .iter()
        .filter(|spec| {
            PackageUniverse::requirement_satisfied_by(&dependency.requirement, spec)
                .unwrap_or(false)
        })
        .cloned()
        .collect();

    if !matching.is_empty() {
        specs = matching;
        matching_part = requirement_label.clone();
        let platform_label = match platforms {
            [platform] => format!("platform '{platform}"),
            _ => format!(
                "platforms '{}",
                platforms
                    .iter()
                    .map(|platform| platform.to_string())
                    .collect::<Vec<_>>()
                    .join("', '")
            ),
        };
        requirement_label = format!("{requirement_label}' with {platform_label}");
    }

    let mut message = format!(
        "Could not find gem '{requirement_label}'{} in {source}{cache_message}.\n",
        extra_message.unwrap_or_default()
    );

    let listed: Vec<String> = specs.iter().map(Artifact::full_name).collect();
    if !listed.is_empty() {
        message.push_str(&format!(
            "\nThe source contains the following gems matching '{matching_part}':\n"
        ));
        message.push_str(
            &listed
                .iter()
                .map(|full_name| format!("  * {full_name}"))
                .collect::<Vec<_>>()
                .join("\n"),
        );
    }

    NotFound { message, listed }
}

/// Render an unsatisfiable derivation tree, followed by notes about the
/// current-state packages involved.
pub fn explain_conflict(tree: &mut ConflictTree, explanations: &IndexMap<Package, String>) -> String {
    tree.collapse_no_versions();
    let mut explanation = DefaultStringReporter::report(tree);

    let notes = current_state_notes(tree, explanations);
    if !notes.is_empty() {
        explanation.push_str("\n\n");
        explanation.push_str(&notes.join("\n"));
    }
    explanation
}

/// Explanations attached to root requirements on synthetic packages that
/// take part in the conflict
pub fn current_state_notes(
    tree: &ConflictTree,
    explanations: &IndexMap<Package, String>,
) -> Vec<String> {
    let mut notes = Vec::new();
    collect_notes(tree, explanations, &mut notes);
    notes
}

fn collect_notes(
    tree: &ConflictTree,
    explanations: &IndexMap<Package, String>,
    notes: &mut Vec<String>,
) {
    match tree {
        DerivationTree::External(External::FromDependencyOf(owner, _, dependency, _)) => {
            if owner.is_root() {
                if let Some(note) = explanations.get(dependency) {
                    if !notes.contains(note) {
                        notes.push(note.clone());
                    }
                }
            }
        },
        DerivationTree::External(_) => {},
        DerivationTree::Derived(derived) => {
            collect_notes(&derived.cause1, explanations, notes);
            collect_notes(&derived.cause2, explanations, notes);
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::InMemoryIndex;

    fn artifact(name: &str, version: &str) -> Artifact {
        Artifact::new(name, version.parse().unwrap())
    }

    #[test]
    fn test_locked_message() {
        let message = locked_gem_message(&Dependency::parse("rack", ">= 3"), &"2.2.8".parse().unwrap());
        assert!(message.starts_with("You have requested:\n  rack >= 3\n\n"));
        assert!(message.contains("The bundle currently has rack locked at 2.2.8.\n"));
        assert!(message.contains("Try running `bundle update rack`"));
    }

    #[test]
    fn test_not_found_without_candidates() {
        let index = InMemoryIndex::new("rubygems repository https://rubygems.org/");
        let report = gem_not_found(&Dependency::parse("x", "= 1.0"), &index, &[Platform::Ruby], None, None);
        assert_eq!(
            report.message,
            "Could not find gem 'x (= 1.0)' in rubygems repository https://rubygems.org/.\n"
        );
        assert!(report.listed.is_empty());
    }

    #[test]
    fn test_not_found_lists_name_matches() {
        let index = InMemoryIndex::new("test index")
            .with(artifact("rack", "3.0"))
            .with(artifact("rack", "2.0"));
        let report = gem_not_found(&Dependency::parse("rack", "~> 1.0"), &index, &[Platform::Ruby], None, None);
        assert_eq!(report.listed, vec!["rack-2.0", "rack-3.0"]);
        assert!(report
            .message
            .contains("\nThe source contains the following gems matching 'rack':\n  * rack-2.0\n  * rack-3.0"));
    }

    #[test]
    fn test_not_found_names_platforms_when_requirement_matches() {
        let linux: Platform = "x86_64-linux".parse().unwrap();
        let index = InMemoryIndex::new("test index")
            .with(artifact("sassc", "2.4").with_platform(linux.clone()))
            .with(artifact("sassc", "1.0"));
        let report = gem_not_found(
            &Dependency::parse("sassc", ">= 2"),
            &index,
            &[Platform::Ruby, "arm64-darwin".parse().unwrap()],
            None,
            Some(" (extra)"),
        );
        assert!(report.message.starts_with(
            "Could not find gem 'sassc (>= 2)' with platforms 'ruby', 'arm64-darwin' (extra) in test index.\n"
        ));
        assert_eq!(report.listed, vec!["sassc-2.4-x86_64-linux"]);

        let single = gem_not_found(&Dependency::parse("sassc", ">= 2"), &index, &[Platform::Ruby], None, None);
        assert!(single.message.contains("'sassc (>= 2)' with platform 'ruby'"));
    }

    #[test]
    fn test_not_found_mentions_reachable_cache() {
        let index = InMemoryIndex::new("test index");
        let report = gem_not_found(
            &Dependency::parse("x", ">= 0"),
            &index,
            &[Platform::Ruby],
            Some(Utf8Path::new("vendor/cache")),
            None,
        );
        assert_eq!(
            report.message,
            "Could not find gem 'x' in test index or in gems cached in vendor/cache.\n"
        );
    }
}
