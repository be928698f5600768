use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::builds::BuildMatch;

const DEFAULT_CONFIG_FILE: &str = ".ado-pr-tools.toml";
const DEFAULT_BASE_URL: &str = "https://dev.azure.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Azure DevOps {what} is not configured. Set '{key}' in configuration.")]
    Missing {
        what: &'static str,
        key: &'static str,
    },

    #[error("Repository is not configured or provided.")]
    MissingRepository,
}

/// Raw configuration loaded from .ado-pr-tools.toml and the environment.
///
/// Every field is optional here; `settings()` turns it into the validated
/// form the tools run against.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Azure DevOps settings
    #[serde(default)]
    pub ado: AdoConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdoConfig {
    /// Organization name (`Ado:Organization`). Falls back to ADO_ORGANIZATION.
    pub organization: Option<String>,
    /// Project name (`Ado:Project`). Falls back to ADO_PROJECT.
    pub project: Option<String>,
    /// Personal access token (`Ado:Pat`). Falls back to ADO_PAT.
    pub pat: Option<String>,
    /// Default repository (`Ado:Repository`). Falls back to ADO_REPOSITORY.
    pub repository: Option<String>,
    /// How builds are matched to a pull request
    #[serde(default)]
    pub build_match: BuildMatch,
    /// Service root, overridable for on-prem servers and tests
    pub base_url: Option<String>,
}

/// Validated settings. Required values are plain fields, checked once.
#[derive(Debug, Clone)]
pub struct AdoSettings {
    pub organization: String,
    pub project: String,
    pub pat: String,
    pub repository: Option<String>,
    pub build_match: BuildMatch,
    pub base_url: String,
}

impl Config {
    /// Load configuration from `path`, or from .ado-pr-tools.toml in the
    /// current directory when no path is given. A missing default file
    /// yields an empty config; environment variables then fill the gaps.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::load_from(default_path)?
                } else {
                    Config::default()
                }
            }
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from a specific path (useful for testing).
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Fill unset fields from the environment. The file value wins.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let ado = &mut self.ado;
        for (slot, key) in [
            (&mut ado.organization, "ADO_ORGANIZATION"),
            (&mut ado.project, "ADO_PROJECT"),
            (&mut ado.pat, "ADO_PAT"),
            (&mut ado.repository, "ADO_REPOSITORY"),
        ] {
            if slot.is_none() {
                *slot = lookup(key);
            }
        }
    }

    /// Validate required settings before any network call is made.
    pub fn settings(&self) -> Result<AdoSettings, ConfigError> {
        let ado = &self.ado;
        Ok(AdoSettings {
            organization: required(&ado.organization, "organization", "Ado:Organization")?,
            project: required(&ado.project, "project", "Ado:Project")?,
            pat: required(&ado.pat, "PAT", "Ado:Pat")?,
            repository: non_blank(&ado.repository),
            build_match: ado.build_match,
            base_url: non_blank(&ado.base_url)
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }
}

impl AdoSettings {
    /// Pick the repository for a call: the caller's value if present,
    /// otherwise the configured default.
    pub fn resolve_repository(&self, requested: Option<&str>) -> Result<String, ConfigError> {
        requested
            .map(str::trim)
            .filter(|repo| !repo.is_empty())
            .map(str::to_string)
            .or_else(|| self.repository.clone())
            .ok_or(ConfigError::MissingRepository)
    }
}

fn required(
    value: &Option<String>,
    what: &'static str,
    key: &'static str,
) -> Result<String, ConfigError> {
    non_blank(value).ok_or(ConfigError::Missing { what, key })
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
