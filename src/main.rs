use anyhow::{Context, Result};
use clap::Parser;
use insights_summary::*;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let cli = cli::Cli::parse();
    let app_config = cli.load_config()?;
    tracing::info!(
        name = version::NAME,
        version = version::VERSION,
        host = %app_config.appliance.host,
        duration = %app_config.report.duration,
        granularity = %app_config.report.granularity,
        "starting site summary"
    );

    let http = client::build_http(&app_config.appliance)?;
    let base_url = app_config.base_url();
    let token = auth::request_token(
        &http,
        &base_url,
        &app_config.credentials.username,
        &app_config.credentials.password,
    )
    .await
    .with_context(|| format!("failed to login to {}", app_config.appliance.host))?;

    let report_client = client::HttpReportClient::new(http, base_url, &token);
    let result = app::run_site_summary(&report_client, &app_config).await;
    auth::revoke_token(&token).await;

    let summary = result?;
    tracing::info!(
        sites_discovered = summary.sites_discovered,
        sites_with_data = summary.sites_with_data,
        time_series_results = summary.time_series_results,
        sheets = summary.sheets_written,
        output = %summary.output_path.display(),
        "site summary complete"
    );
    Ok(())
}
