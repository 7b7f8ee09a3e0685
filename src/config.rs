use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::models::TimeWindow;

/// Read when neither `--config` nor `CONFIG_FILE` names a file. Optional.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Every key has a default so command-line flags can fill in what the file omits;
/// `validate` runs once all sources are merged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub appliance: ApplianceConfig,
    pub credentials: CredentialsConfig,
    pub report: ReportConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplianceConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_scheme")]
    pub scheme: String,
    /// Appliances usually ship with self-signed certificates.
    #[serde(default = "default_accept_invalid_certs")]
    pub accept_invalid_certs: bool,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ApplianceConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            scheme: default_scheme(),
            accept_invalid_certs: default_accept_invalid_certs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_scheme() -> String {
    "https".into()
}

fn default_accept_invalid_certs() -> bool {
    true
}

fn default_request_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Appliance timeframe, e.g. "last 30 days".
    #[serde(default)]
    pub duration: String,
    /// Bucket size in seconds: "60", "3600" or "86400".
    #[serde(default)]
    pub granularity: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Upper bound on status polls per sub-report.
    #[serde(default = "default_max_polls")]
    pub max_polls: u32,
    /// Upper bound on wall time per sub-report.
    #[serde(default = "default_job_timeout_secs")]
    pub job_timeout_secs: u64,
    #[serde(default = "default_top_uplinks_limit")]
    pub top_uplinks_limit: u32,
    #[serde(default = "default_site_search_limit")]
    pub site_search_limit: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            duration: String::new(),
            granularity: String::new(),
            poll_interval_secs: default_poll_interval_secs(),
            max_polls: default_max_polls(),
            job_timeout_secs: default_job_timeout_secs(),
            top_uplinks_limit: default_top_uplinks_limit(),
            site_search_limit: default_site_search_limit(),
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_max_polls() -> u32 {
    720
}

fn default_job_timeout_secs() -> u64 {
    3600
}

fn default_top_uplinks_limit() -> u32 {
    10
}

fn default_site_search_limit() -> u32 {
    10_000
}

pub const GRANULARITIES: [&str; 3] = ["60", "3600", "86400"];

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: String,
    #[serde(default = "default_write_attempts")]
    pub write_attempts: u32,
    /// Backoff before retry n is n * retry_backoff_ms.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            write_attempts: default_write_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

fn default_output_path() -> String {
    "InsightsSiteSummary.xlsx".into()
}

fn default_write_attempts() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    500
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        Self::load_from_path(&path)
    }

    pub fn load_from_path(path: &str) -> anyhow::Result<Self> {
        let config = Self::read_from_path(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config = Self::parse_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses without validating; the file may leave required keys to the command line.
    pub fn parse_str(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Reads an unvalidated config. The file must exist.
    pub fn read_from_path(path: &str) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading config {}: {}", path, e))?;
        Self::parse_str(&s)
    }

    /// Like `read_from_path`, but a missing file yields the defaults.
    pub fn read_optional(path: &str) -> anyhow::Result<Self> {
        if !Path::new(path).exists() {
            debug!(path, "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::read_from_path(path)
    }

    /// Unvalidated config from `CONFIG_FILE` (must exist) or the optional default path.
    pub fn read_from_env() -> anyhow::Result<Self> {
        match std::env::var("CONFIG_FILE") {
            Ok(path) => Self::read_from_path(&path),
            Err(_) => Self::read_optional(DEFAULT_CONFIG_PATH),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.appliance.host.is_empty(),
            "appliance.host must be non-empty"
        );
        anyhow::ensure!(
            self.appliance.scheme == "https" || self.appliance.scheme == "http",
            "appliance.scheme must be \"https\" or \"http\", got {:?}",
            self.appliance.scheme
        );
        anyhow::ensure!(
            self.appliance.request_timeout_secs > 0,
            "appliance.request_timeout_secs must be > 0, got {}",
            self.appliance.request_timeout_secs
        );
        anyhow::ensure!(
            !self.credentials.username.is_empty(),
            "credentials.username must be non-empty"
        );
        anyhow::ensure!(
            !self.report.duration.is_empty(),
            "report.duration must be non-empty"
        );
        anyhow::ensure!(
            GRANULARITIES.contains(&self.report.granularity.as_str()),
            "report.granularity must be one of {:?}, got {:?}",
            GRANULARITIES,
            self.report.granularity
        );
        anyhow::ensure!(
            self.report.max_polls > 0,
            "report.max_polls must be > 0, got {}",
            self.report.max_polls
        );
        anyhow::ensure!(
            self.report.job_timeout_secs > 0,
            "report.job_timeout_secs must be > 0, got {}",
            self.report.job_timeout_secs
        );
        anyhow::ensure!(
            self.report.top_uplinks_limit > 0,
            "report.top_uplinks_limit must be > 0, got {}",
            self.report.top_uplinks_limit
        );
        anyhow::ensure!(
            self.report.site_search_limit > 0,
            "report.site_search_limit must be > 0, got {}",
            self.report.site_search_limit
        );
        anyhow::ensure!(!self.output.path.is_empty(), "output.path must be non-empty");
        anyhow::ensure!(
            self.output.write_attempts > 0,
            "output.write_attempts must be > 0, got {}",
            self.output.write_attempts
        );
        Ok(())
    }

    pub fn base_url(&self) -> String {
        format!("{}://{}", self.appliance.scheme, self.appliance.host)
    }

    pub fn time_window(&self) -> TimeWindow {
        TimeWindow::new(&self.report.duration, &self.report.granularity)
    }
}

impl ReportConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs)
    }
}

impl OutputConfig {
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}
