/// Configuration schema and defaults for lifetrack.
///
/// Defines the TOML-serializable configuration structure with the sections
/// `[api]`, `[session]`, `[dashboard]`, `[web]` and `[logging]`.
///
/// Every field has a built-in default. Users only need to set the values
/// they want to override.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default measurements API endpoint.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Default request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Lookback used by the dashboard when no time range is active.
pub const DEFAULT_DASHBOARD_DAYS: u32 = 30;

/// Default address for `lifetrack web`.
pub const DEFAULT_WEB_BIND: &str = "127.0.0.1:9747";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level lifetrack configuration.
///
/// Maps directly to `~/.lifetrack/config.toml` and `.lifetrack.toml`. All
/// sections and fields are optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifetrackConfig {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub dashboard: DashboardConfig,
    pub web: WebConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [api]
// ---------------------------------------------------------------------------

/// Remote API connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to.
    pub base_url: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

// ---------------------------------------------------------------------------
// [session]
// ---------------------------------------------------------------------------

/// Where the bearer credential is persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Credential file. Empty means `~/.lifetrack/credentials.json`.
    pub credentials_file: String,
}

impl SessionConfig {
    /// Resolve the credential file path, falling back to the home directory.
    pub fn credentials_path(&self) -> Option<PathBuf> {
        if self.credentials_file.is_empty() {
            dirs::home_dir().map(|home| home.join(".lifetrack").join("credentials.json"))
        } else {
            Some(PathBuf::from(&self.credentials_file))
        }
    }
}

// ---------------------------------------------------------------------------
// [dashboard]
// ---------------------------------------------------------------------------

/// Dashboard time-range presets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Lookback in days when no preset is selected.
    pub default_days: u32,
    /// Relative time-range presets offered by the selector, in days.
    pub time_ranges: Vec<u32>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            default_days: DEFAULT_DASHBOARD_DAYS,
            time_ranges: vec![7, 30, 90, 365],
        }
    }
}

// ---------------------------------------------------------------------------
// [web]
// ---------------------------------------------------------------------------

/// Local dashboard server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub bind: String,
    /// Open the system browser when the server starts.
    pub open_browser: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_WEB_BIND.to_string(),
            open_browser: true,
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Diagnostics and activity-log settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive used when `LIFETRACK_LOG` is unset.
    pub level: String,
    /// Append one JSONL entry per API call to `~/.lifetrack/activity.jsonl`.
    pub activity_log: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            activity_log: true,
        }
    }
}

impl LifetrackConfig {
    /// Annotated default config written by `lifetrack config init`.
    pub fn default_toml() -> String {
        format!(
            r#"# lifetrack configuration
# Precedence: defaults < ~/.lifetrack/config.toml < .lifetrack.toml < LIFETRACK_* env

[api]
base_url = "{DEFAULT_API_URL}"
timeout_ms = {DEFAULT_TIMEOUT_MS}

[session]
# Empty uses ~/.lifetrack/credentials.json
credentials_file = ""

[dashboard]
default_days = {DEFAULT_DASHBOARD_DAYS}
time_ranges = [7, 30, 90, 365]

[web]
bind = "{DEFAULT_WEB_BIND}"
open_browser = true

[logging]
level = "warn"
activity_log = true
"#
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_toml_parses_to_defaults() {
        let parsed: LifetrackConfig = toml::from_str(&LifetrackConfig::default_toml()).unwrap();
        assert_eq!(parsed, LifetrackConfig::default());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let parsed: LifetrackConfig = toml::from_str(
            r#"
[api]
base_url = "https://measure.example.org"
"#,
        )
        .unwrap();
        assert_eq!(parsed.api.base_url, "https://measure.example.org");
        assert_eq!(parsed.api.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert_eq!(parsed.dashboard.time_ranges, vec![7, 30, 90, 365]);
    }

    #[test]
    fn explicit_credentials_file_wins() {
        let session = SessionConfig {
            credentials_file: "/tmp/creds.json".to_string(),
        };
        assert_eq!(
            session.credentials_path(),
            Some(PathBuf::from("/tmp/creds.json"))
        );
    }
}
