//! The locked set a resolution starts from

use garnet_core::types::{Artifact, Dependency, GemVersion, Requirement};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Previously locked artifacts, grouped by name
#[derive(Debug, Clone, Default)]
pub struct Base {
    specs: IndexMap<String, Vec<Artifact>>,
    additional: Vec<Dependency>,
    requirements: HashMap<String, Requirement>,
}

impl Base {
    /// `additional` requirements replace the `= version` requirement a locked
    /// artifact would otherwise impose on its name.
    pub fn new(specs: Vec<Artifact>, additional: Vec<Dependency>) -> Self {
        let mut grouped: IndexMap<String, Vec<Artifact>> = IndexMap::new();
        for spec in specs {
            grouped.entry(spec.name.clone()).or_default().push(spec);
        }
        let mut base = Self {
            specs: grouped,
            additional,
            requirements: HashMap::new(),
        };
        base.rebuild_requirements();
        base
    }

    fn rebuild_requirements(&mut self) {
        self.requirements = self
            .specs
            .iter()
            .filter_map(|(name, specs)| {
                specs
                    .first()
                    .map(|spec| (name.clone(), Requirement::exact(&spec.version)))
            })
            .collect();
        for dependency in &self.additional {
            self.requirements
                .insert(dependency.name.clone(), dependency.requirement.clone());
        }
    }

    /// Locked artifacts for `name`
    pub fn get(&self, name: &str) -> &[Artifact] {
        self.specs.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn locked_version(&self, name: &str) -> Option<&GemVersion> {
        self.get(name).first().map(|spec| &spec.version)
    }

    /// Requirement every candidate for `name` must meet while it stays locked
    pub fn base_requirement(&self, name: &str) -> Option<&Requirement> {
        self.requirements.get(name)
    }

    /// Remove an artifact; returns whether it was present
    pub fn delete(&mut self, artifact: &Artifact) -> bool {
        let full_name = artifact.full_name();
        let Some(specs) = self.specs.get_mut(&artifact.name) else {
            return false;
        };
        let before = specs.len();
        specs.retain(|spec| spec.full_name() != full_name);
        let removed = specs.len() != before;
        if specs.is_empty() {
            self.specs.shift_remove(&artifact.name);
        }
        if removed {
            self.rebuild_requirements();
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.specs.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(name: &str, version: &str) -> Artifact {
        Artifact::new(name, version.parse().unwrap())
    }

    #[test]
    fn test_locked_requirements() {
        let base = Base::new(vec![artifact("rack", "2.2.8")], Vec::new());
        assert_eq!(base.base_requirement("rack").unwrap().to_string(), "= 2.2.8");
        assert_eq!(base.locked_version("rack").unwrap().to_string(), "2.2.8");
        assert!(base.base_requirement("puma").is_none());
    }

    #[test]
    fn test_additional_requirements_override() {
        let base = Base::new(
            vec![artifact("rack", "2.2.8")],
            vec![Dependency::parse("rack", ">= 2.2")],
        );
        assert_eq!(base.base_requirement("rack").unwrap().to_string(), ">= 2.2");
    }

    #[test]
    fn test_delete() {
        let mut base = Base::new(vec![artifact("rack", "2.2.8")], Vec::new());
        assert!(!base.delete(&artifact("rack", "3.0")));
        assert!(base.delete(&artifact("rack", "2.2.8")));
        assert!(base.get("rack").is_empty());
        assert!(base.base_requirement("rack").is_none());
        assert!(base.is_empty());
    }
}
