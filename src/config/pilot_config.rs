//! Pilot Configuration: TOML sections and validation

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::pilot::EvaluationPolicy;
use crate::site::{DEFAULT_NEW_TENANT_GRACE, DEFAULT_PLACEHOLDER_SUFFIXES};
use crate::types::TenantMetadata;

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "PILOT_CONFIG";

/// Config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "pilot.toml";

/// Upper bound for every period in the config (ten years, in seconds)
pub const MAX_PERIOD_SECS: u64 = 10 * 365 * 24 * 60 * 60;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a pilot deployment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PilotConfig {
    /// Scheduling and enablement
    #[serde(default)]
    pub pilot: ScheduleConfig,

    /// Identity of the monitored site
    #[serde(default)]
    pub site: SiteConfig,

    /// Site identity heuristics
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Health state persistence
    #[serde(default)]
    pub storage: StorageConfig,

    /// Connection control endpoint
    #[serde(default)]
    pub probe: ProbeConfig,

    /// Notification delivery
    #[serde(default)]
    pub notify: NotifyConfig,
}

impl PilotConfig {
    /// Load configuration using the standard search order:
    /// 1. `explicit` path, if given (errors are returned, not swallowed)
    /// 2. `$PILOT_CONFIG` environment variable
    /// 3. `./pilot.toml` in the current working directory
    /// 4. Built-in defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            let config = Self::load_from_file(path)?;
            info!(path = %path.display(), site = %config.site.url, "Loaded pilot config");
            return Ok(config);
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), site = %config.site.url, "Loaded pilot config from PILOT_CONFIG");
                        return Ok(config);
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from PILOT_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "PILOT_CONFIG points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(site = %config.site.url, "Loaded pilot config from ./pilot.toml");
                    return Ok(config);
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./pilot.toml, using defaults");
                }
            }
        }

        info!("No pilot.toml found, using built-in defaults");
        Ok(Self::default())
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let config: Self = toml::from_str(&contents)
            .map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize back to TOML (for `--print-config` style output)
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Check cross-field constraints, collecting every problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        if self.pilot.interval_secs == 0 {
            errors.push("pilot.interval_secs: must be > 0".to_string());
        }
        Self::check_period(self.pilot.interval_secs, "pilot.interval_secs", &mut errors);
        Self::check_period(
            self.classifier.new_tenant_grace_secs,
            "classifier.new_tenant_grace_secs",
            &mut errors,
        );
        Self::check_period(self.probe.timeout_secs, "probe.timeout_secs", &mut errors);

        // The grace window must outlast one scheduling interval, otherwise a
        // fresh tenant can be reported as a hard failure before its first run.
        if self.classifier.new_tenant_grace_secs <= self.pilot.interval_secs {
            errors.push(format!(
                "classifier.new_tenant_grace_secs ({}) must exceed pilot.interval_secs ({})",
                self.classifier.new_tenant_grace_secs, self.pilot.interval_secs
            ));
        }

        for suffix in &self.classifier.placeholder_suffixes {
            if !suffix.starts_with('.') || suffix.len() < 2 {
                errors.push(format!(
                    "classifier.placeholder_suffixes: {suffix:?} must start with '.' and name a domain"
                ));
            }
        }

        Self::check_url(&self.site.url, "site.url", &mut errors);
        Self::check_url(&self.probe.base_url, "probe.base_url", &mut errors);
        if let Some(webhook) = &self.notify.webhook_url {
            Self::check_url(webhook, "notify.webhook_url", &mut errors);
        }

        if self.probe.timeout_secs == 0 {
            errors.push("probe.timeout_secs: must be > 0".to_string());
        }

        if self.site.registered_at.is_some() && !self.site.multi_tenant {
            errors.push("site.registered_at: only meaningful with site.multi_tenant = true".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_period(value: u64, name: &str, errors: &mut Vec<String>) {
        if value > MAX_PERIOD_SECS {
            errors.push(format!("{name}: {value} exceeds the maximum of {MAX_PERIOD_SECS}"));
        }
    }

    fn check_url(value: &str, name: &str, errors: &mut Vec<String>) {
        if let Err(e) = url::Url::parse(value) {
            errors.push(format!("{name}: {value:?} is not a valid URL ({e})"));
        }
    }

    /// Evaluation tunables derived from the classifier section
    pub fn evaluation_policy(&self) -> EvaluationPolicy {
        EvaluationPolicy {
            placeholder_suffixes: self.classifier.placeholder_suffixes.clone(),
            new_tenant_grace: i64::try_from(self.classifier.new_tenant_grace_secs)
                .ok()
                .and_then(chrono::Duration::try_seconds)
                .unwrap_or(chrono::Duration::MAX),
        }
    }

    pub fn run_interval(&self) -> Duration {
        Duration::from_secs(self.pilot.interval_secs)
    }

    pub fn tenant_metadata(&self) -> TenantMetadata {
        TenantMetadata {
            is_multi_tenant_install: self.site.multi_tenant,
            registered_at: self.site.registered_at,
        }
    }
}

// ============================================================================
// Sections
// ============================================================================

/// `[pilot]`: scheduling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Whether the pilot runs at all
    pub enabled: bool,
    /// Seconds between runs
    pub interval_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 3600,
        }
    }
}

/// `[site]`: what the host reports about the current site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Canonical site URL
    pub url: String,
    /// Whether the site is one tenant of a multi-tenant install
    pub multi_tenant: bool,
    /// Tenant registration time (RFC 3339)
    pub registered_at: Option<DateTime<Utc>>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost".to_string(),
            multi_tenant: false,
            registered_at: None,
        }
    }
}

/// `[classifier]`: site identity heuristics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Host suffixes of placeholder/staging domains
    pub placeholder_suffixes: Vec<String>,
    /// Seconds after registration during which a tenant counts as new
    pub new_tenant_grace_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            placeholder_suffixes: DEFAULT_PLACEHOLDER_SUFFIXES
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            new_tenant_grace_secs: DEFAULT_NEW_TENANT_GRACE.num_seconds().unsigned_abs(),
        }
    }
}

/// `[storage]`: option store location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory of the sled option database
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/pilot_options.db"),
        }
    }
}

/// `[probe]`: connection control endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub base_url: String,
    /// Bearer token for the control endpoint
    pub api_token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8089".to_string(),
            api_token: None,
            timeout_secs: 30,
        }
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// `[notify]`: delivery sinks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Write notifications to the log
    pub log: bool,
    /// POST notifications to this URL
    pub webhook_url: Option<String>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            log: true,
            webhook_url: None,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },
    #[error("Config parse error ({}): {source}", path.display())]
    Parse { path: PathBuf, source: toml::de::Error },
    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation failed:\n{}", format_validation(.0))]
    Validation(Vec<String>),
}

fn format_validation(errors: &[String]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}
