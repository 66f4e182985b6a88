//! Run configuration from CLI flags, environment and an optional YAML file
//!
//! Precedence, highest first: command-line flag, environment variable, YAML
//! file, built-in default.
//!
//! Environment variables:
//! - `ECL_SOURCE_URL`: source database URL (`postgres://...` or `sqlite:...`)
//! - `ECL_DESTINATION_URL`: destination PostgreSQL URL
//! - `ECL_TABLES`: comma-separated allow list of source tables
//! - `ECL_CONFIG`: path of the YAML config file (default `ecl.yml` if present)

use crate::clean::{RulePreset, RuleSet};
use crate::etl::{AllowList, EmptyTablePolicy};
use crate::store::LoadStrategy;
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SOURCE_URL_VAR: &str = "ECL_SOURCE_URL";
pub const DESTINATION_URL_VAR: &str = "ECL_DESTINATION_URL";
pub const TABLES_VAR: &str = "ECL_TABLES";
pub const CONFIG_VAR: &str = "ECL_CONFIG";

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "ecl.yml";

/// Cleaning rule section of the YAML file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RulesConfig {
    pub preset: Option<RulePreset>,
    pub name_tokens: Option<Vec<String>>,
    pub date_tokens: Option<Vec<String>>,
    pub key_tokens: Option<Vec<String>>,
}

/// Contents of `ecl.yml`
///
/// ```yaml
/// tables: [VENTATICKETS, DEPARTAMENTOS]
/// load_strategy: staging
/// empty_tables: keep
/// rules:
///   preset: legacy
///   date_tokens: [fecha, pagado_en]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub tables: Option<Vec<String>>,
    pub load_strategy: Option<LoadStrategy>,
    pub empty_tables: Option<EmptyTablePolicy>,
    pub rules: RulesConfig,
}

impl FileConfig {
    /// Read a config file
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Locate and read the config file
    ///
    /// An explicit path (flag, then `ECL_CONFIG`) must exist. Without one,
    /// `ecl.yml` is read if present and an empty config is used otherwise.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        let explicit = explicit
            .map(Path::to_path_buf)
            .or_else(|| env_value(CONFIG_VAR).map(PathBuf::from));

        match explicit {
            Some(path) => {
                if !path.exists() {
                    eyre::bail!("Config file not found: {}", path.display());
                }
                log::debug!("Using config file {}", path.display());
                Self::read(&path)
            }
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                log::debug!("Using config file {}", DEFAULT_CONFIG_FILE);
                Self::read(DEFAULT_CONFIG_FILE)
            }
            None => Ok(Self::default()),
        }
    }
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub tables: Option<String>,
    pub strategy: Option<LoadStrategy>,
    pub drop_empty_source: bool,
    pub rules: Option<RulePreset>,
}

/// Fully resolved settings of one invocation
#[derive(Debug, Clone)]
pub struct Settings {
    pub source_url: Option<String>,
    pub destination_url: Option<String>,
    pub allow_list: Option<AllowList>,
    pub load_strategy: LoadStrategy,
    pub empty_tables: EmptyTablePolicy,
    pub rules: RuleSet,
}

impl Settings {
    /// Resolve settings from flags, the environment and the config file
    ///
    /// # Errors
    /// Returns an error if an explicit config file is missing or invalid
    pub fn load(overrides: &Overrides) -> Result<Self> {
        let file = FileConfig::discover(overrides.config.as_deref())?;
        Ok(Self::resolve(overrides, file, env_value))
    }

    fn resolve(
        overrides: &Overrides,
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let allow_list = overrides
            .tables
            .clone()
            .or_else(|| env(TABLES_VAR))
            .map(|tables| AllowList::new(tables.split(',')))
            .or_else(|| file.tables.map(AllowList::new))
            .filter(|list| !list.is_empty());

        let empty_tables = if overrides.drop_empty_source {
            EmptyTablePolicy::DropSource
        } else {
            file.empty_tables.unwrap_or_default()
        };

        let preset = overrides
            .rules
            .or(file.rules.preset)
            .unwrap_or_default();
        let mut rules = RuleSet::from_preset(preset);
        if let Some(tokens) = &file.rules.name_tokens {
            rules = rules.with_name_tokens(tokens);
        }
        if let Some(tokens) = &file.rules.date_tokens {
            rules = rules.with_date_tokens(tokens);
        }
        if let Some(tokens) = &file.rules.key_tokens {
            rules = rules.with_key_tokens(tokens);
        }

        Self {
            source_url: env(SOURCE_URL_VAR),
            destination_url: env(DESTINATION_URL_VAR),
            allow_list,
            load_strategy: overrides
                .strategy
                .or(file.load_strategy)
                .unwrap_or_default(),
            empty_tables,
            rules,
        }
    }

    pub fn require_source(&self) -> Result<&str> {
        self.source_url
            .as_deref()
            .ok_or_else(|| eyre::eyre!("{} environment variable not set", SOURCE_URL_VAR))
    }

    pub fn require_destination(&self) -> Result<&str> {
        self.destination_url
            .as_deref()
            .ok_or_else(|| eyre::eyre!("{} environment variable not set", DESTINATION_URL_VAR))
    }
}

/// Environment variable, with empty values treated as unset
fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
