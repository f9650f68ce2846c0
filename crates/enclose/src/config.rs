//! Session configuration.
//!
//! Loaded from YAML, then overridden from the environment:
//!
//! ```yaml
//! default_selector: css      # omit to follow the process-wide default
//! app_host: http://www.example.com
//! max_redirects: 5
//! ```
//!
//! | Variable                   | Field              |
//! |----------------------------|--------------------|
//! | `ENCLOSE_DEFAULT_SELECTOR` | `default_selector` |
//! | `ENCLOSE_APP_HOST`         | `app_host`         |
//! | `ENCLOSE_MAX_REDIRECTS`    | `max_redirects`    |

use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::driver::{DEFAULT_APP_HOST, DEFAULT_MAX_REDIRECTS};
use crate::result::{EncloseError, EncloseResult};
use crate::selector::{DefaultSelector, SelectorKind};

/// Environment variable overriding [`Config::default_selector`]
pub const ENV_DEFAULT_SELECTOR: &str = "ENCLOSE_DEFAULT_SELECTOR";
/// Environment variable overriding [`Config::app_host`]
pub const ENV_APP_HOST: &str = "ENCLOSE_APP_HOST";
/// Environment variable overriding [`Config::max_redirects`]
pub const ENV_MAX_REDIRECTS: &str = "ENCLOSE_MAX_REDIRECTS";

/// Settings shared by a session and its driver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pin the session's default selector kind; `None` follows the global
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_selector: Option<SelectorKind>,
    /// Base URL relative paths resolve against
    pub app_host: String,
    /// Redirects followed before navigation fails
    pub max_redirects: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_selector: None,
            app_host: DEFAULT_APP_HOST.to_string(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

impl Config {
    /// Parse and validate YAML
    pub fn from_yaml(yaml: &str) -> EncloseResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a YAML file
    pub fn load(path: impl AsRef<Path>) -> EncloseResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// Defaults overridden from the process environment
    pub fn from_env() -> EncloseResult<Self> {
        Self::default().with_env()
    }

    /// Apply `ENCLOSE_*` overrides from the process environment
    pub fn with_env(self) -> EncloseResult<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, keyed by environment variable name
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> EncloseResult<Self> {
        if let Some(kind) = lookup(ENV_DEFAULT_SELECTOR) {
            self.default_selector = Some(kind.parse()?);
        }
        if let Some(host) = lookup(ENV_APP_HOST) {
            self.app_host = host;
        }
        if let Some(max) = lookup(ENV_MAX_REDIRECTS) {
            self.max_redirects = max.trim().parse().map_err(|_| {
                EncloseError::config(format!("{ENV_MAX_REDIRECTS} must be a number, got {max:?}"))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Check that `app_host` is an absolute URL
    pub fn validate(&self) -> EncloseResult<()> {
        let url = Url::parse(&self.app_host)
            .map_err(|e| EncloseError::config(format!("invalid app_host {:?}: {e}", self.app_host)))?;
        if url.cannot_be_a_base() {
            return Err(EncloseError::config(format!(
                "app_host {:?} cannot be used as a base URL",
                self.app_host
            )));
        }
        Ok(())
    }

    /// Default-selector handle a session built from this config uses
    #[must_use]
    pub fn default_selector_handle(&self) -> DefaultSelector {
        self.default_selector
            .map_or_else(DefaultSelector::global, DefaultSelector::isolated)
    }
}
