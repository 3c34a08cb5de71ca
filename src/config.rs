//! TOML configuration types for docshield.
//!
//! The top-level [`ShieldConfig`] is deserialized from `docshield.toml`. Every
//! section is optional; omitted values fall back to the built-in constants, so
//! an empty file yields the stock interceptor.
//!
//! # Example `docshield.toml`
//!
//! ```toml
//! [patterns]
//! extra = ["files\\.internal\\.example"]
//!
//! [limits]
//! max_document_access = 3
//!
//! [session]
//! max_session_secs = 1800
//! max_inactivity_secs = 600
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ShieldError};

/// Pattern registry configuration (`[patterns]` section).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PatternsConfig {
    /// Include the built-in endpoint patterns.
    pub builtin: bool,
    /// Additional regexes, appended after the built-ins in order.
    pub extra: Vec<String>,
}

impl Default for PatternsConfig {
    fn default() -> Self {
        Self {
            builtin: true,
            extra: Vec::new(),
        }
    }
}

/// Replacement strings used by the different redaction surfaces (`[redaction]`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RedactionConfig {
    /// Placeholder for console output and rendered text.
    pub placeholder: String,
    /// Host substituted into rendered address objects.
    pub address_placeholder: String,
    /// Host substituted into current-location reads.
    pub location_placeholder: String,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            placeholder: "[PROTECTED]".to_string(),
            address_placeholder: "secure-document-service.local".to_string(),
            location_placeholder: "secure-service.local".to_string(),
        }
    }
}

/// Access ceilings (`[limits]` section).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Document-retrieval calls allowed per page load.
    pub max_document_access: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_document_access: 3,
        }
    }
}

/// Headers injected into delegated requests (`[headers]` section).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeadersConfig {
    /// Merged over the caller's headers on every delegated fetch.
    pub fetch: BTreeMap<String, String>,
    /// Set on every request object right before `send`.
    pub xhr: BTreeMap<String, String>,
}

impl Default for HeadersConfig {
    fn default() -> Self {
        let fetch = [
            ("X-PDF-Viewer", "secure"),
            ("Cache-Control", "no-cache, no-store, must-revalidate"),
            ("Pragma", "no-cache"),
        ];
        let xhr = [("X-PDF-Viewer", "secure"), ("Cache-Control", "no-cache")];
        Self {
            fetch: fetch
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            xhr: xhr
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

/// Session expiry thresholds (`[session]` section).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    pub max_session_secs: u64,
    pub max_inactivity_secs: u64,
    pub check_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_session_secs: 30 * 60,
            max_inactivity_secs: 10 * 60,
            check_interval_secs: 60,
        }
    }
}

impl SessionConfig {
    pub fn max_session(&self) -> Duration {
        Duration::from_secs(self.max_session_secs)
    }

    pub fn max_inactivity(&self) -> Duration {
        Duration::from_secs(self.max_inactivity_secs)
    }

    /// Interval between periodic checks. Never zero, so the timer stays valid.
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs.max(1))
    }
}

/// Diagnostics configuration (`[logging]` section).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Top-level configuration deserialized from `docshield.toml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ShieldConfig {
    pub patterns: PatternsConfig,
    pub redaction: RedactionConfig,
    pub limits: LimitsConfig,
    pub headers: HeadersConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

impl ShieldConfig {
    /// Load and parse the configuration from a TOML file at the given path.
    ///
    /// `${VAR}` and `$VAR` placeholders are replaced with environment variable
    /// values before parsing. An unset variable is an error.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text, substituting environment variables.
    pub fn from_toml(content: &str) -> Result<Self> {
        let content = substitute_env_vars(content)?;
        let config: ShieldConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

static ENV_BRACES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("env placeholder regex")
});

// Uppercase only, to avoid eating `$` anchors inside pattern strings.
static ENV_BARE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([A-Z_][A-Z0-9_]*)").expect("env placeholder regex"));

/// Replace `${VAR_NAME}` and `$VAR_NAME` placeholders with environment variable values.
fn substitute_env_vars(input: &str) -> Result<String> {
    let mut result = input.to_string();

    for cap in ENV_BRACES.captures_iter(input) {
        let var_name = &cap[1];
        let value =
            std::env::var(var_name).map_err(|_| ShieldError::ConfigEnvVar(var_name.to_string()))?;
        result = result.replace(&cap[0], &value);
    }

    let intermediate = result.clone();
    for cap in ENV_BARE.captures_iter(&intermediate) {
        let var_name = &cap[1];
        let value =
            std::env::var(var_name).map_err(|_| ShieldError::ConfigEnvVar(var_name.to_string()))?;
        result = result.replace(&cap[0], &value);
    }

    Ok(result)
}
