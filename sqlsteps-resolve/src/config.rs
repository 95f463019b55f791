//! Resolver configuration.
//!
//! Configuration can be built in code or loaded from a TOML file:
//!
//! ```toml
//! locations = ["resource:sql", "filesystem:/opt/app/custom-sql"]
//! migration_prefix = ""
//! migration_suffix = ".sql"
//! version_separator = "."
//! target_vendor = "postgresql"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ResolveError, ResolveResult};
use crate::location::ScriptLocation;

/// File name filter applied while scanning.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamingRule {
    /// Required file name prefix.
    pub prefix: String,
    /// Required file name suffix.
    pub suffix: String,
}

impl NamingRule {
    /// Create a naming rule.
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// Check if a bare file name matches the rule.
    pub fn matches(&self, file_name: &str) -> bool {
        file_name.len() >= self.prefix.len() + self.suffix.len()
            && file_name.starts_with(&self.prefix)
            && file_name.ends_with(&self.suffix)
    }
}

impl Default for NamingRule {
    fn default() -> Self {
        Self::new("", ".sql")
    }
}

/// Configuration for migration resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Root locations, in precedence order.
    pub locations: Vec<String>,
    /// Script file name prefix.
    pub migration_prefix: String,
    /// Script file name suffix.
    pub migration_suffix: String,
    /// Separator between the numeric index and the description.
    pub version_separator: char,
    /// Current database vendor, e.g. `postgresql`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_vendor: Option<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            locations: vec!["./migrations".to_string()],
            migration_prefix: String::new(),
            migration_suffix: ".sql".to_string(),
            version_separator: '.',
            target_vendor: None,
        }
    }
}

impl ResolverConfig {
    /// Create a new configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the configured locations.
    pub fn locations<I, S>(mut self, locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locations = locations.into_iter().map(Into::into).collect();
        self
    }

    /// Append a location.
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.locations.push(location.into());
        self
    }

    /// Set the file name prefix.
    pub fn migration_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.migration_prefix = prefix.into();
        self
    }

    /// Set the file name suffix.
    pub fn migration_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.migration_suffix = suffix.into();
        self
    }

    /// Set the version separator.
    pub fn version_separator(mut self, separator: char) -> Self {
        self.version_separator = separator;
        self
    }

    /// Set the target database vendor.
    pub fn target_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.target_vendor = Some(vendor.into());
        self
    }

    /// Target vendor, with an empty value treated as absent.
    pub fn vendor(&self) -> Option<&str> {
        self.target_vendor.as_deref().filter(|v| !v.is_empty())
    }

    /// Naming rule for scanners.
    pub fn naming_rule(&self) -> NamingRule {
        NamingRule::new(&self.migration_prefix, &self.migration_suffix)
    }

    /// Parse the configured locations.
    pub fn script_locations(&self) -> ResolveResult<Vec<ScriptLocation>> {
        self.locations.iter().map(|l| ScriptLocation::parse(l)).collect()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ResolveResult<()> {
        if self.locations.is_empty() {
            return Err(ResolveError::config("at least one location is required"));
        }
        if matches!(self.version_separator, '/' | '\\') {
            return Err(ResolveError::config(format!(
                "version separator '{}' clashes with path separators",
                self.version_separator
            )));
        }
        self.script_locations()?;
        Ok(())
    }

    /// Parse a configuration from TOML.
    pub fn from_toml_str(content: &str) -> ResolveResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ResolveError::config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file, falling back to defaults if it does not exist.
    pub async fn load(path: impl AsRef<Path>) -> ResolveResult<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            ResolveError::config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_toml_str(&content)
    }
}
