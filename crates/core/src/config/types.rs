use serde::{Deserialize, Serialize};

use crate::plan::PlanConfig;
use crate::staging::StorageConfig;
use crate::tools::{AssemblyConfig, ToolsConfig};

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub redmine: RedmineConfig,
    #[serde(default)]
    pub plan: PlanConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub assembly: AssemblyConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Redmine ticketing backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedmineConfig {
    /// Redmine base URL (e.g., "https://redmine.example.org")
    pub url: String,
    /// Redmine REST API key
    #[serde(deserialize_with = "super::de::string_or_number")]
    pub api_key: String,
    /// Request timeout in seconds (default: 60)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// Numeric status ids used when transitioning tickets
    #[serde(default)]
    pub statuses: StatusIdsConfig,
}

fn default_timeout() -> u32 {
    60
}

/// Mapping between ticket states and Redmine status ids.
///
/// Both `resolved` and `error` default to 4 ("closed"): the outcome of a run
/// is only distinguishable from the note text.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct StatusIdsConfig {
    #[serde(default = "default_open_status")]
    pub open: u32,
    #[serde(default = "default_in_progress_status")]
    pub in_progress: u32,
    #[serde(default = "default_closed_status")]
    pub resolved: u32,
    #[serde(default = "default_closed_status")]
    pub error: u32,
}

impl Default for StatusIdsConfig {
    fn default() -> Self {
        Self {
            open: default_open_status(),
            in_progress: default_in_progress_status(),
            resolved: default_closed_status(),
            error: default_closed_status(),
        }
    }
}

fn default_open_status() -> u32 {
    1
}

fn default_in_progress_status() -> u32 {
    2
}

fn default_closed_status() -> u32 {
    4
}

/// Sanitized config for logging (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub redmine: SanitizedRedmineConfig,
    pub plan: PlanConfig,
    pub tools: ToolsConfig,
    pub assembly: AssemblyConfig,
    pub storage: StorageConfig,
}

/// Sanitized Redmine config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedRedmineConfig {
    pub url: String,
    pub api_key_configured: bool,
    pub timeout_secs: u32,
    pub statuses: StatusIdsConfig,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            redmine: SanitizedRedmineConfig {
                url: config.redmine.url.clone(),
                api_key_configured: !config.redmine.api_key.is_empty(),
                timeout_secs: config.redmine.timeout_secs,
                statuses: config.redmine.statuses.clone(),
            },
            plan: config.plan.clone(),
            tools: config.tools.clone(),
            assembly: config.assembly.clone(),
            storage: config.storage.clone(),
        }
    }
}
