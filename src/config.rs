//! Loading the rule registry from `.stylish-commit.toml`.
//!
//! ```toml
//! [[rule]]
//! name = "trim-trailing-whitespace"
//! builtin = "trim-trailing-whitespace"
//!
//! [[rule]]
//! name = "no-debugger-statement"
//! applies_to = "**/*.js"
//! replace = '\s*debugger;\s*'
//! with = ""
//! ```
//!
//! Rules run in the order they are listed.

use crate::rule::{Rule, RuleBuildError, builtin};
use error_set::error_set;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

/// Name of the configuration file looked up at the repository root
pub const CONFIG_FILE: &str = ".stylish-commit.toml";

error_set! {
    /// Errors from reading the rule configuration
    ConfigError := {
        #[display("Failed to read {path}: {message}")]
        ReadFailed { path: String, message: String },
        #[display("Invalid configuration in {path}: {message}")]
        Malformed { path: String, message: String },
        #[display("Rule '{rule}': {message}")]
        InvalidRule { rule: String, message: String },
        RuleBuildError(RuleBuildError),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default, rename = "rule")]
    rules: Vec<RuleDefinition>,
}

/// One `[[rule]]` entry as written in the file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDefinition {
    pub name: String,
    #[serde(default)]
    pub applies_to: Option<String>,
    #[serde(default)]
    pub builtin: Option<String>,
    #[serde(default)]
    pub tab_width: Option<usize>,
    #[serde(default)]
    pub replace: Option<String>,
    #[serde(default)]
    pub with: Option<String>,
    #[serde(default)]
    pub all: bool,
}

impl RuleDefinition {
    /// Normalize the definition into a [`Rule`].
    pub fn build(&self) -> Result<Rule, ConfigError> {
        let rule = match (&self.builtin, &self.replace) {
            (Some(id), None) => builtin::lookup(id, &self.name, self.tab_width).ok_or_else(|| {
                ConfigError::InvalidRule {
                    rule: self.name.clone(),
                    message: format!(
                        "unknown builtin '{id}' (expected one of: {})",
                        builtin::ALL.join(", ")
                    ),
                }
            })?,
            (None, Some(pattern)) => Rule::search_replace(
                &self.name,
                pattern,
                self.with.clone().unwrap_or_default(),
                self.all,
            )?,
            (Some(_), Some(_)) => {
                return Err(ConfigError::InvalidRule {
                    rule: self.name.clone(),
                    message: "set either 'builtin' or 'replace', not both".to_string(),
                });
            }
            (None, None) => {
                return Err(ConfigError::InvalidRule {
                    rule: self.name.clone(),
                    message: "missing 'builtin' or 'replace'".to_string(),
                });
            }
        };

        match &self.applies_to {
            Some(pattern) => Ok(rule.applies_to(pattern)?),
            None => Ok(rule),
        }
    }
}

/// Parse configuration text; `origin` names the source in error messages.
pub fn parse(text: &str, origin: &str) -> Result<Vec<Rule>, ConfigError> {
    let file: ConfigFile = toml::from_str(text).map_err(|e| ConfigError::Malformed {
        path: origin.to_string(),
        message: e.to_string(),
    })?;

    file.rules.iter().map(RuleDefinition::build).collect()
}

/// Load rules from `path`; a missing file means no rules.
pub fn load(path: &Path) -> Result<Vec<Rule>, ConfigError> {
    let origin = path.display().to_string();
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %origin, "no configuration file, running without rules");
            return Ok(Vec::new());
        }
        Err(e) => {
            return Err(ConfigError::ReadFailed {
                path: origin,
                message: e.to_string(),
            });
        }
    };

    let rules = parse(&text, &origin)?;
    debug!(path = %origin, rules = rules.len(), "loaded rules");
    Ok(rules)
}
