//! Configuration layering, fallback logic, and environment overrides

use crate::settings::{ResolverSettings, UpdateLevel};
use crate::toml::{GarnetToml, ResolverSection, UnlockSpec};
use crate::ConfigResult;
use camino::Utf8PathBuf;
use garnet_core::error::GarnetError;
use garnet_core::types::Platform;
use std::collections::HashMap;
use tracing::debug;

/// Project config location relative to a project directory
pub const PROJECT_CONFIG: &str = ".garnet/config.toml";

/// Prefix of recognized environment overrides
pub const ENV_PREFIX: &str = "GARNET_";

/// Main configuration loading interface
pub struct ConfigLoader {
    /// Current working directory
    cwd: Utf8PathBuf,
}

/// Configuration layering and merging
pub struct ConfigLayering;

/// Configuration source tracking
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// Global config file
    Global(Utf8PathBuf),
    /// Project config file
    Project(Utf8PathBuf),
    /// Environment variable
    Environment(String),
    /// Built-in defaults
    Default,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new(cwd: Utf8PathBuf) -> Self {
        Self { cwd }
    }

    /// Load the project config, if any directory above `cwd` has one
    pub fn load_project_config(&self) -> ConfigResult<Option<(GarnetToml, ConfigSource)>> {
        let path = self.resolve_config_path(PROJECT_CONFIG);
        if !path.exists() {
            return Ok(None);
        }
        let config = crate::toml::load_from_file(&path)?;
        Ok(Some((config, ConfigSource::Project(path))))
    }

    /// Find configuration file in project (walks up directory tree)
    pub fn resolve_config_path(&self, filename: &str) -> Utf8PathBuf {
        let mut current = self.cwd.as_path();

        loop {
            let config_path = current.join(filename);
            if config_path.exists() {
                return config_path;
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }

        // Return path in current directory even if it doesn't exist
        self.cwd.join(filename)
    }

    /// Load global configuration from `~/.garnet/config.toml`
    pub fn load_global_config(&self) -> ConfigResult<Option<GarnetToml>> {
        let home_dir = dirs::home_dir().ok_or_else(|| {
            GarnetError::validation("home_dir", "Could not determine home directory")
        })?;

        let global_config_path = Utf8PathBuf::try_from(home_dir)
            .map_err(|e| {
                GarnetError::validation("home_dir", format!("Invalid home directory path: {e}"))
            })?
            .join(".garnet")
            .join("config.toml");

        if global_config_path.exists() {
            Ok(Some(crate::toml::load_from_file(&global_config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Load every layer and merge them into resolver settings
    pub fn load_settings(&self) -> ConfigResult<ResolverSettings> {
        let global = self.load_global_config()?;
        let project = self.load_project_config()?;
        if let Some((_, source)) = &project {
            debug!(?source, "loaded project config");
        }
        ConfigLayering::merge_configs(
            global,
            project.map(|(config, _)| config),
            ConfigLayering::collect_env_overrides(),
        )
    }
}

impl ConfigLayering {
    /// Merge global < project < environment into final settings
    pub fn merge_configs(
        global_config: Option<GarnetToml>,
        project_config: Option<GarnetToml>,
        env_overrides: HashMap<String, String>,
    ) -> ConfigResult<ResolverSettings> {
        let mut merged = ResolverSection::default();

        if let Some(global) = global_config {
            merged.overlay(global.resolver);
        }
        if let Some(project) = project_config {
            merged.overlay(project.resolver);
        }

        Self::apply_env_overrides(&mut merged, &env_overrides)?;

        crate::toml::validate_config(&GarnetToml {
            resolver: merged.clone(),
        })?;

        Ok(merged.into_settings())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(
        section: &mut ResolverSection,
        overrides: &HashMap<String, String>,
    ) -> ConfigResult<()> {
        for (key, value) in overrides {
            match key.as_str() {
                "GARNET_PLATFORMS" => {
                    let platforms = value
                        .split(',')
                        .map(str::trim)
                        .filter(|platform| !platform.is_empty())
                        .map(str::parse::<Platform>)
                        .collect::<Result<Vec<_>, _>>()?;
                    section.platforms = Some(platforms);
                },
                "GARNET_UPDATE_LEVEL" => {
                    section.update_level = Some(value.parse::<UpdateLevel>()?);
                },
                "GARNET_PRERELEASE" => {
                    section.prerelease = Some(parse_flag(key, value)?);
                },
                "GARNET_FORCE_RUBY_PLATFORM" => {
                    section.force_ruby_platform = Some(parse_flag(key, value)?);
                },
                "GARNET_UNLOCK" => {
                    section.unlock = Some(match value.trim() {
                        "true" | "1" => UnlockSpec::All(true),
                        "false" | "0" | "" => UnlockSpec::All(false),
                        names => UnlockSpec::Gems(
                            names.split(',').map(|name| name.trim().to_string()).collect(),
                        ),
                    });
                },
                "GARNET_APP_CACHE_PATH" => {
                    section.app_cache_path = Some(Utf8PathBuf::from(value));
                },
                _ => {
                    // Unknown environment variable, ignore
                },
            }
        }

        Ok(())
    }

    /// Collect environment variable overrides
    pub fn collect_env_overrides() -> HashMap<String, String> {
        std::env::vars()
            .filter(|(key, _)| key.starts_with(ENV_PREFIX))
            .collect()
    }
}

fn parse_flag(key: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        other => Err(GarnetError::validation(
            key,
            format!("expected a boolean, got '{other}'"),
        )),
    }
}
