//! Artifact platforms.
//!
//! `ruby` is the platform-independent variant and is acceptable on every
//! target. Everything else is a `cpu-os[-version]` triple.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Platform an artifact was built for
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Platform {
    /// Pure, platform-independent artifact
    Ruby,
    /// Native artifact for a concrete target
    Specific {
        cpu: Option<String>,
        os: String,
        version: Option<String>,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid platform: {input:?}")]
pub struct PlatformError {
    pub input: String,
}

/// How closely an artifact platform fits a target; lower is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Specificity(u32);

impl Platform {
    pub fn is_ruby(&self) -> bool {
        matches!(self, Platform::Ruby)
    }

    /// Check if an artifact built for `self` can be used on `target`
    pub fn matches(&self, target: &Platform) -> bool {
        match (self, target) {
            (Platform::Ruby, _) => true,
            (Platform::Specific { .. }, Platform::Ruby) => false,
            (
                Platform::Specific { cpu, os, version },
                Platform::Specific {
                    cpu: target_cpu,
                    os: target_os,
                    version: target_version,
                },
            ) => {
                let cpu_ok = match (cpu.as_deref(), target_cpu.as_deref()) {
                    (None, _) | (_, None) => true,
                    (Some("universal"), _) | (_, Some("universal")) => true,
                    (Some(a), Some(b)) => a == b,
                };
                let version_ok = match (version, target_version) {
                    (Some(a), Some(b)) => a == b,
                    _ => true,
                };
                cpu_ok && os == target_os && version_ok
            },
        }
    }

    /// Rank `self` as a candidate for `target`. Exact matches rank first,
    /// then partial triples, and the platform-independent variant last.
    pub fn specificity(&self, target: &Platform) -> Specificity {
        match (self, target) {
            (Platform::Ruby, _) => Specificity(1_000_000),
            (Platform::Specific { .. }, Platform::Ruby) => Specificity(1_000_000),
            (
                Platform::Specific { cpu, os, version },
                Platform::Specific {
                    cpu: target_cpu,
                    os: target_os,
                    version: target_version,
                },
            ) => {
                let mut score = 0;
                if os != target_os {
                    score += 100;
                }
                if cpu != target_cpu {
                    score += 10;
                }
                if version != target_version {
                    score += 1;
                }
                Specificity(score)
            },
        }
    }
}

impl FromStr for Platform {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        if input == "ruby" {
            return Ok(Platform::Ruby);
        }

        let invalid = || PlatformError {
            input: s.to_string(),
        };
        if input.is_empty() || input.chars().any(char::is_whitespace) {
            return Err(invalid());
        }

        let parts: Vec<&str> = input.split('-').collect();
        if parts.iter().any(|part| part.is_empty()) {
            return Err(invalid());
        }

        let platform = match parts.as_slice() {
            [os] => Platform::Specific {
                cpu: None,
                os: os.to_string(),
                version: None,
            },
            [cpu, os] => Platform::Specific {
                cpu: Some(cpu.to_string()),
                os: os.to_string(),
                version: None,
            },
            [cpu, os, rest @ ..] => Platform::Specific {
                cpu: Some(cpu.to_string()),
                os: os.to_string(),
                version: Some(rest.join("-")),
            },
            [] => return Err(invalid()),
        };
        Ok(platform)
    }
}

impl TryFrom<String> for Platform {
    type Error = PlatformError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Platform> for String {
    fn from(platform: Platform) -> Self {
        platform.to_string()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Ruby => write!(f, "ruby"),
            Platform::Specific { cpu, os, version } => {
                if let Some(cpu) = cpu {
                    write!(f, "{cpu}-")?;
                }
                write!(f, "{os}")?;
                if let Some(version) = version {
                    write!(f, "-{version}")?;
                }
                Ok(())
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Platform {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!(p("ruby"), Platform::Ruby);
        for text in ["x86_64-linux", "java", "arm64-darwin-22", "x86_64-linux-musl"] {
            assert_eq!(p(text).to_string(), text);
        }
        assert_eq!(
            p("java"),
            Platform::Specific {
                cpu: None,
                os: "java".to_string(),
                version: None
            }
        );
        assert!("".parse::<Platform>().is_err());
        assert!("x86_64--linux".parse::<Platform>().is_err());
    }

    #[test]
    fn test_ruby_matches_everything() {
        assert!(Platform::Ruby.matches(&Platform::Ruby));
        assert!(Platform::Ruby.matches(&p("x86_64-linux")));
        assert!(!p("x86_64-linux").matches(&Platform::Ruby));
    }

    #[test]
    fn test_specific_matching() {
        assert!(p("x86_64-linux").matches(&p("x86_64-linux")));
        assert!(!p("x86_64-linux").matches(&p("arm64-darwin")));
        assert!(!p("x86_64-linux").matches(&p("aarch64-linux")));
        assert!(p("universal-darwin").matches(&p("arm64-darwin")));
        assert!(p("x86_64-linux").matches(&p("x86_64-linux-musl")));
        assert!(!p("x86_64-linux-gnu").matches(&p("x86_64-linux-musl")));
    }

    #[test]
    fn test_specificity_prefers_exact() {
        let target = p("x86_64-linux-musl");
        let exact = p("x86_64-linux-musl").specificity(&target);
        let partial = p("x86_64-linux").specificity(&target);
        let ruby = Platform::Ruby.specificity(&target);
        assert!(exact < partial);
        assert!(partial < ruby);
    }
}
