//! # Router Configuration
//!
//! Startup configuration for the route table and the default view renderer.
//!
//! ## File formats
//!
//! [`RouterConfig::load`] picks the parser from the file extension:
//! `.yaml`/`.yml` (serde_yaml) or `.toml` (toml).
//!
//! ```yaml
//! methods: [GET, POST, DELETE]
//! duplicate_policy: reject
//! templates_dir: templates
//! ```
//!
//! Every key is optional; missing keys take their defaults.
//!
//! ## Environment Variables
//!
//! Applied after the file, overriding it:
//!
//! - `NEST_METHODS`: comma separated method list, e.g. `GET,POST,PUT`
//! - `NEST_TEMPLATES_DIR`: directory holding `errors/http.html` and other views

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::router::{parse_method, DuplicatePolicy};

/// Methods a table supports when nothing else is configured.
pub const DEFAULT_METHODS: &[&str] = &["GET", "POST"];

/// Route table and renderer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RouterConfig {
    /// Supported HTTP methods, upper-case once loaded
    pub methods: Vec<String>,
    /// Handling of patterns registered twice for one method
    pub duplicate_policy: DuplicatePolicy,
    /// Where dotted template names are looked up
    pub templates_dir: Option<PathBuf>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            methods: DEFAULT_METHODS.iter().map(|m| (*m).to_string()).collect(),
            duplicate_policy: DuplicatePolicy::default(),
            templates_dir: None,
        }
    }
}

impl RouterConfig {
    /// Load `path`, apply environment overrides and validate.
    ///
    /// # Errors
    ///
    /// Unreadable file, unknown extension, parse failure, or an invalid
    /// method list.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let mut config = match ext.as_deref() {
            Some("yaml" | "yml") => Self::from_yaml_str(&text),
            Some("toml") => Self::from_toml_str(&text),
            _ => bail!(
                "unsupported config format for {} (expected .yaml, .yml or .toml)",
                path.display()
            ),
        }
        .with_context(|| format!("failed to parse config {}", path.display()))?;

        config.apply_env_overrides();
        config.validate()?;
        info!(
            path = %path.display(),
            methods = ?config.methods,
            duplicate_policy = ?config.duplicate_policy,
            templates_dir = ?config.templates_dir,
            "Router config loaded"
        );
        Ok(config)
    }

    /// Defaults with environment overrides applied.
    ///
    /// # Errors
    ///
    /// `NEST_METHODS` names an invalid method or is empty.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// `load(path)` when a path is given, otherwise [`RouterConfig::from_env`]
    ///
    /// # Errors
    ///
    /// See [`RouterConfig::load`].
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Self::from_env(),
        }
    }

    /// Parse YAML without overrides or validation
    ///
    /// # Errors
    ///
    /// Malformed YAML or unknown keys.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("invalid YAML router config")
    }

    /// Parse TOML without overrides or validation
    ///
    /// # Errors
    ///
    /// Malformed TOML or unknown keys.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid TOML router config")
    }

    /// Overwrite fields from `NEST_METHODS` and `NEST_TEMPLATES_DIR`
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(methods) = lookup("NEST_METHODS") {
            debug!(methods = %methods, "NEST_METHODS override");
            self.methods = methods
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(dir) = lookup("NEST_TEMPLATES_DIR") {
            debug!(templates_dir = %dir, "NEST_TEMPLATES_DIR override");
            self.templates_dir = Some(PathBuf::from(dir));
        }
    }

    /// Upper-case the method list and reject empty or invalid entries.
    ///
    /// # Errors
    ///
    /// An empty method list or a name that is not an HTTP method token.
    pub fn validate(&mut self) -> Result<()> {
        if self.methods.is_empty() {
            bail!("router config must list at least one HTTP method");
        }
        let mut normalized = Vec::with_capacity(self.methods.len());
        for name in &self.methods {
            let method = parse_method(name)
                .with_context(|| format!("invalid HTTP method '{name}' in router config"))?;
            let method = method.as_str().to_string();
            if !normalized.contains(&method) {
                normalized.push(method);
            }
        }
        self.methods = normalized;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = RouterConfig::default();
        assert_eq!(config.methods, vec!["GET", "POST"]);
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Shadow);
        assert!(config.templates_dir.is_none());
    }

    #[test]
    fn test_yaml_partial() {
        let config = RouterConfig::from_yaml_str("duplicate_policy: reject\n").unwrap();
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Reject);
        assert_eq!(config.methods, vec!["GET", "POST"]);
    }

    #[test]
    fn test_toml() {
        let config = RouterConfig::from_toml_str(
            "methods = [\"get\", \"delete\"]\ntemplates_dir = \"views\"\n",
        )
        .unwrap();
        assert_eq!(config.methods, vec!["get", "delete"]);
        assert_eq!(config.templates_dir, Some(PathBuf::from("views")));
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(RouterConfig::from_yaml_str("method: [GET]\n").is_err());
    }

    #[test]
    fn test_validate_normalizes() {
        let mut config = RouterConfig {
            methods: vec!["get".into(), " post ".into(), "GET".into()],
            ..RouterConfig::default()
        };
        config.validate().unwrap();
        assert_eq!(config.methods, vec!["GET", "POST"]);
    }

    #[test]
    fn test_validate_rejects_bad_methods() {
        let mut empty = RouterConfig {
            methods: vec![],
            ..RouterConfig::default()
        };
        assert!(empty.validate().is_err());

        let mut bad = RouterConfig {
            methods: vec!["GE T".into()],
            ..RouterConfig::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("NEST_METHODS", "GET, PUT,,"),
            ("NEST_TEMPLATES_DIR", "/srv/views"),
        ]
        .into_iter()
        .collect();

        let mut config = RouterConfig::default();
        config.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.methods, vec!["GET", "PUT"]);
        assert_eq!(config.templates_dir, Some(PathBuf::from("/srv/views")));
    }
}
