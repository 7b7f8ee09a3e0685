// Command-line overrides on top of the TOML config

use clap::Parser;

use crate::app::ACTIONS;
use crate::config::AppConfig;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "insights-summary",
    version,
    about = "Per-site uplink throughput summary from an Insights appliance"
)]
pub struct Cli {
    /// Config file (default: $CONFIG_FILE or config.toml)
    #[arg(long)]
    pub config: Option<String>,
    /// Hostname or IP address of the appliance
    #[arg(long)]
    pub hostname: Option<String>,
    #[arg(long)]
    pub username: Option<String>,
    #[arg(long, env = "INSIGHTS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
    /// Action to perform
    #[arg(long, default_value = "site_summary")]
    pub action: String,
    /// Report timeframe, e.g. "last 30 days"
    #[arg(long)]
    pub duration: Option<String>,
    /// Report granularity in seconds: 60, 3600 or 86400
    #[arg(long)]
    pub granularity: Option<String>,
    /// Output workbook path
    #[arg(long)]
    pub output: Option<String>,
}

impl Cli {
    /// Merges the config file (if any) with the flags, then validates the result.
    pub fn load_config(&self) -> anyhow::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::read_from_path(path)?,
            None => AppConfig::read_from_env()?,
        };
        self.apply(&mut config)?;
        Ok(config)
    }

    /// Overrides config values with any flags given, then re-validates.
    pub fn apply(&self, config: &mut AppConfig) -> anyhow::Result<()> {
        anyhow::ensure!(
            ACTIONS.contains(&self.action.as_str()),
            "action {} is unknown, expected one of {:?}",
            self.action,
            ACTIONS
        );
        if let Some(host) = &self.hostname {
            config.appliance.host = host.clone();
        }
        if let Some(username) = &self.username {
            config.credentials.username = username.clone();
        }
        if let Some(password) = &self.password {
            config.credentials.password = password.clone();
        }
        if let Some(duration) = &self.duration {
            config.report.duration = duration.clone();
        }
        if let Some(granularity) = &self.granularity {
            config.report.granularity = granularity.clone();
        }
        if let Some(output) = &self.output {
            config.output.path = output.clone();
        }
        config.validate()
    }
}
