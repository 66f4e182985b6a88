//! Rule set configuration for the cleaner

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How text in name-like columns is normalized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamePolicy {
    /// Title-case readable values, replace empty, numeric or symbol-laden ones
    /// with the `"Unknown"` sentinel
    Sentinel,
    /// Title-case every value
    TitleCase,
}

/// Named rule set presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RulePreset {
    #[default]
    Default,
    /// Earlier-generation rules: title-case names, upper-case key columns
    Legacy,
}

impl FromStr for RulePreset {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "default" => Ok(RulePreset::Default),
            "legacy" => Ok(RulePreset::Legacy),
            other => Err(eyre::eyre!(
                "Unknown rule set '{}', expected 'default' or 'legacy'",
                other
            )),
        }
    }
}

impl fmt::Display for RulePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RulePreset::Default => write!(f, "default"),
            RulePreset::Legacy => write!(f, "legacy"),
        }
    }
}

/// Column-name driven rule configuration
///
/// Tokens are matched case-insensitively as substrings of the column name,
/// so `nombre` matches `PRODUCTO_NOMBRE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    pub name_policy: NamePolicy,
    pub name_tokens: Vec<String>,
    pub date_tokens: Vec<String>,
    pub key_tokens: Vec<String>,
    pub uppercase_keys: bool,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            name_policy: NamePolicy::Sentinel,
            name_tokens: lowercase(&[
                "nombre",
                "name",
                "descripcion",
                "description",
                "comentario",
                "comment",
            ]),
            date_tokens: lowercase(&["fecha"]),
            key_tokens: lowercase(&["clave"]),
            uppercase_keys: false,
        }
    }
}

impl RuleSet {
    /// Rules used by earlier runs of the pipeline
    pub fn legacy() -> Self {
        Self {
            name_policy: NamePolicy::TitleCase,
            name_tokens: lowercase(&["nombre"]),
            uppercase_keys: true,
            ..Self::default()
        }
    }

    pub fn from_preset(preset: RulePreset) -> Self {
        match preset {
            RulePreset::Default => Self::default(),
            RulePreset::Legacy => Self::legacy(),
        }
    }

    pub fn with_name_tokens(mut self, tokens: &[String]) -> Self {
        self.name_tokens = lowercase(tokens);
        self
    }

    pub fn with_date_tokens(mut self, tokens: &[String]) -> Self {
        self.date_tokens = lowercase(tokens);
        self
    }

    pub fn with_key_tokens(mut self, tokens: &[String]) -> Self {
        self.key_tokens = lowercase(tokens);
        self
    }

    pub fn is_name_like(&self, column: &str) -> bool {
        contains_any(column, &self.name_tokens)
    }

    pub fn is_date_like(&self, column: &str) -> bool {
        contains_any(column, &self.date_tokens)
    }

    pub fn is_key_like(&self, column: &str) -> bool {
        self.uppercase_keys && contains_any(column, &self.key_tokens)
    }
}

fn contains_any(column: &str, tokens: &[String]) -> bool {
    let column = column.to_lowercase();
    tokens.iter().any(|token| column.contains(token.as_str()))
}

fn lowercase<S: AsRef<str>>(tokens: &[S]) -> Vec<String> {
    tokens
        .iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}
