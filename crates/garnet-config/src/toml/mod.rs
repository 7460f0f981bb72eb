//! Config file parsing and serialization
//!
//! ```toml
//! [resolver]
//! platforms = ["ruby", "x86_64-linux"]
//! update-level = "minor"
//! prerelease = false
//! force-ruby-platform = false
//! unlock = ["rack"]          # or `unlock = true`
//! app-cache-path = "vendor/cache"
//! ```

use crate::settings::{ResolverSettings, Unlock, UpdateLevel};
use crate::ConfigResult;
use camino::{Utf8Path, Utf8PathBuf};
use garnet_core::error::GarnetError;
use garnet_core::types::Platform;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Complete config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GarnetToml {
    /// Resolver section
    #[serde(default)]
    pub resolver: ResolverSection,
}

/// `[resolver]` section; unset keys fall through to lower layers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ResolverSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platforms: Option<Vec<Platform>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_level: Option<UpdateLevel>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prerelease: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_ruby_platform: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlock: Option<UnlockSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_cache_path: Option<Utf8PathBuf>,
}

/// `unlock = true` or `unlock = ["name", ...]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UnlockSpec {
    All(bool),
    Gems(Vec<String>),
}

impl ResolverSection {
    /// Overlay `other` on top of `self`; keys set in `other` win
    pub fn overlay(&mut self, other: ResolverSection) {
        if other.platforms.is_some() {
            self.platforms = other.platforms;
        }
        if other.update_level.is_some() {
            self.update_level = other.update_level;
        }
        if other.prerelease.is_some() {
            self.prerelease = other.prerelease;
        }
        if other.force_ruby_platform.is_some() {
            self.force_ruby_platform = other.force_ruby_platform;
        }
        if other.unlock.is_some() {
            self.unlock = other.unlock;
        }
        if other.app_cache_path.is_some() {
            self.app_cache_path = other.app_cache_path;
        }
    }

    /// Fill unset keys with defaults
    pub fn into_settings(self) -> ResolverSettings {
        let defaults = ResolverSettings::default();
        ResolverSettings {
            platforms: self.platforms.unwrap_or(defaults.platforms),
            update_level: self.update_level.unwrap_or(defaults.update_level),
            prerelease: self.prerelease.unwrap_or(defaults.prerelease),
            force_ruby_platform: self
                .force_ruby_platform
                .unwrap_or(defaults.force_ruby_platform),
            unlock: match self.unlock {
                Some(UnlockSpec::All(true)) => Unlock::All,
                Some(UnlockSpec::All(false)) | None => defaults.unlock,
                Some(UnlockSpec::Gems(names)) if names.is_empty() => Unlock::None,
                Some(UnlockSpec::Gems(names)) => Unlock::Gems(names),
            },
            app_cache_path: self.app_cache_path.or(defaults.app_cache_path),
        }
    }
}

/// Parse a config file
pub fn parse_garnet_toml(content: &str) -> ConfigResult<GarnetToml> {
    // First try with toml_edit for better error reporting
    content
        .parse::<toml_edit::DocumentMut>()
        .map_err(|e| located_error(content, e.message(), e.span()))?;

    // Then parse with serde for type safety
    let config: GarnetToml =
        ::toml::from_str(content).map_err(|e| located_error(content, e.message(), e.span()))?;

    validate_config(&config)?;

    Ok(config)
}

/// Serialize a config file
pub fn serialize_garnet_toml(config: &GarnetToml) -> ConfigResult<String> {
    ::toml::to_string_pretty(config).map_err(|e| GarnetError::TomlParse {
        message: format!("TOML serialization error: {e}"),
        line: 0,
        column: 0,
    })
}

/// Validate a parsed config
pub fn validate_config(config: &GarnetToml) -> ConfigResult<()> {
    let resolver = &config.resolver;

    if let Some(platforms) = &resolver.platforms {
        if platforms.is_empty() {
            return Err(GarnetError::validation(
                "platforms",
                "at least one platform is required",
            ));
        }
        let mut seen = HashSet::new();
        for platform in platforms {
            if !seen.insert(platform) {
                return Err(GarnetError::validation(
                    "platforms",
                    format!("platform '{platform}' is listed twice"),
                ));
            }
        }
    }

    if let Some(UnlockSpec::Gems(names)) = &resolver.unlock {
        if let Some(blank) = names.iter().find(|name| name.trim().is_empty()) {
            return Err(GarnetError::validation(
                "unlock",
                format!("invalid gem name '{blank}'"),
            ));
        }
    }

    Ok(())
}

/// Load and parse a config file from disk
pub fn load_from_file(path: &Utf8Path) -> ConfigResult<GarnetToml> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| GarnetError::io(format!("Failed to read {path}"), e))?;

    parse_garnet_toml(&content).map_err(|e| match e {
        GarnetError::TomlParse {
            message,
            line,
            column,
        } => GarnetError::TomlParse {
            message: format!("in file {path}: {message}"),
            line,
            column,
        },
        GarnetError::ConfigValidation { field, reason } => GarnetError::ConfigValidation {
            field,
            reason: format!("in file {path}: {reason}"),
        },
        other => other,
    })
}

fn located_error(
    content: &str,
    message: &str,
    span: Option<std::ops::Range<usize>>,
) -> GarnetError {
    let (line, column) = span
        .map(|span| line_column(content, span.start))
        .unwrap_or((0, 0));
    GarnetError::TomlParse {
        message: message.trim().to_string(),
        line,
        column,
    }
}

/// 1-based line and column of a byte offset
fn line_column(content: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(content.len());
    let before = content.get(..offset).unwrap_or(content);
    let line = before.matches('\n').count() + 1;
    let column = before.rfind('\n').map_or(before.len(), |nl| before.len() - nl - 1) + 1;
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_config() {
        let config = parse_garnet_toml("").unwrap();
        assert_eq!(config, GarnetToml::default());
        assert_eq!(
            config.resolver.into_settings(),
            ResolverSettings::default()
        );
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[resolver]
platforms = ["ruby", "x86_64-linux"]
update-level = "minor"
prerelease = true
force-ruby-platform = false
unlock = ["rack", "rails"]
app-cache-path = "vendor/cache"
"#;

        let settings = parse_garnet_toml(toml).unwrap().resolver.into_settings();
        assert_eq!(settings.platforms.len(), 2);
        assert_eq!(settings.platforms[1].to_string(), "x86_64-linux");
        assert_eq!(settings.update_level, UpdateLevel::Minor);
        assert!(settings.prerelease);
        assert!(settings.unlock.permits("rails"));
        assert!(!settings.unlock.permits("puma"));
        assert_eq!(
            settings.app_cache_path,
            Some(Utf8PathBuf::from("vendor/cache"))
        );
    }

    #[test]
    fn test_unlock_all() {
        let settings = parse_garnet_toml("[resolver]\nunlock = true\n")
            .unwrap()
            .resolver
            .into_settings();
        assert_eq!(settings.unlock, Unlock::All);
    }

    #[test]
    fn test_syntax_error_has_location() {
        let err = parse_garnet_toml("[resolver]\nprerelease = \n").unwrap_err();
        match err {
            GarnetError::TomlParse { line, .. } => assert!(line >= 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_platform_rejected() {
        assert!(parse_garnet_toml("[resolver]\nplatforms = [\"x86_64--linux\"]\n").is_err());
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(parse_garnet_toml("[resolver]\nstrict = true\n").is_err());
    }

    #[test]
    fn test_duplicate_platforms_rejected() {
        let err = parse_garnet_toml("[resolver]\nplatforms = [\"ruby\", \"ruby\"]\n").unwrap_err();
        assert!(matches!(err, GarnetError::ConfigValidation { .. }));
    }

    #[test]
    fn test_round_trip_serialization() {
        let toml = r#"
[resolver]
platforms = ["ruby", "arm64-darwin"]
update-level = "patch"
"#;

        let config = parse_garnet_toml(toml).unwrap();
        let serialized = serialize_garnet_toml(&config).unwrap();
        assert_eq!(parse_garnet_toml(&serialized).unwrap(), config);
    }

    #[test]
    fn test_overlay() {
        let mut base = ResolverSection {
            prerelease: Some(true),
            update_level: Some(UpdateLevel::Patch),
            ..Default::default()
        };
        base.overlay(ResolverSection {
            update_level: Some(UpdateLevel::Minor),
            ..Default::default()
        });
        assert_eq!(base.prerelease, Some(true));
        assert_eq!(base.update_level, Some(UpdateLevel::Minor));
    }

    #[test]
    fn test_line_column() {
        assert_eq!(line_column("abc\ndef", 5), (2, 2));
        assert_eq!(line_column("abc", 0), (1, 1));
    }
}
