//! Application-level configuration
//!
//! Settings that apply to a whole application build rather than to one
//! component. Sources are layered: defaults, then an optional JSON file,
//! then `SPRIG_*` environment variables.

use serde::{Deserialize, Serialize};
use sprig_core::{Result, SprigError};
use std::path::{Path, PathBuf};

/// Environment variable overriding [`AppConfig::environment`].
pub const ENV_ENVIRONMENT: &str = "SPRIG_ENVIRONMENT";
/// Environment variable overriding [`AppConfig::base_dir`].
pub const ENV_BASE_DIR: &str = "SPRIG_BASE_DIR";
/// Environment variable overriding [`AppConfig::verbose`].
pub const ENV_VERBOSE: &str = "SPRIG_VERBOSE";

/// How an application is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Environment name; selects `<environment>.json` overlays.
    pub environment: String,
    /// Filesystem root of the top-level component.
    pub base_dir: PathBuf,
    /// Echo informational messages at `info` level instead of `debug`.
    pub verbose: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "devel".to_string(),
            base_dir: PathBuf::from("."),
            verbose: true,
        }
    }
}

impl AppConfig {
    /// Reads a JSON file; missing keys keep their defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SprigError::config(format!("Failed to read {}: {e}", path.display()))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| SprigError::invalid(format!("Invalid JSON in {}: {e}", path.display())))
    }

    /// Applies `SPRIG_*` overrides from the process environment.
    pub fn merge_with_env(&mut self) -> Result<()> {
        self.merge_with_vars(std::env::vars())
    }

    /// Applies `SPRIG_*` overrides from the given variables.
    pub fn merge_with_vars<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            match key.as_str() {
                ENV_ENVIRONMENT => self.set_from_string("environment", &value)?,
                ENV_BASE_DIR => self.set_from_string("base_dir", &value)?,
                ENV_VERBOSE => self.set_from_string("verbose", &value)?,
                _ => {}
            }
        }
        Ok(())
    }

    /// Sets one field from its textual form.
    pub fn set_from_string(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "environment" => self.environment = value.to_string(),
            "base_dir" | "base-dir" => self.base_dir = PathBuf::from(value),
            "verbose" => {
                self.verbose = value.parse().map_err(|_| {
                    SprigError::invalid(format!("Invalid boolean for verbose: {value}"))
                })?;
            }
            _ => {
                return Err(SprigError::invalid(format!(
                    "Unknown configuration key: {key}"
                )))
            }
        }
        Ok(())
    }

    /// Rejects settings no build could use.
    pub fn validate(&self) -> Result<()> {
        if self.environment.is_empty() {
            return Err(SprigError::invalid("Environment cannot be empty"));
        }
        if self
            .environment
            .chars()
            .any(|c| std::path::is_separator(c) || c == '.')
        {
            return Err(SprigError::invalid(format!(
                "Environment must be a plain name: {}",
                self.environment
            )));
        }
        if self.base_dir.as_os_str().is_empty() {
            return Err(SprigError::invalid("Base directory cannot be empty"));
        }
        Ok(())
    }
}
