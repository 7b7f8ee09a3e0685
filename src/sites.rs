// Per-site loop: top-talkers summary, active uplink selection, time-series follow-up.
// A site that errors or has nothing active is skipped; only a failed submission stops the loop.

use tracing::{debug, info, instrument, warn};

use crate::client::ReportClient;
use crate::definitions;
use crate::error::ClientError;
use crate::models::{DataPayload, Site, TimeWindow};
use crate::runner::ReportJobRunner;
use crate::selector::select_active_uplinks;

pub struct SiteIterator<'a, C> {
    runner: ReportJobRunner<'a, C>,
    top_uplinks_limit: u32,
}

impl<'a, C: ReportClient> SiteIterator<'a, C> {
    pub fn new(runner: ReportJobRunner<'a, C>, top_uplinks_limit: u32) -> Self {
        Self {
            runner,
            top_uplinks_limit,
        }
    }

    /// Time-series results for every eligible site, in site order.
    pub async fn run(
        &self,
        sites: &[Site],
        window: &TimeWindow,
    ) -> Result<Vec<DataPayload>, ClientError> {
        let mut time_series = Vec::new();
        for site in sites.iter().filter(|s| s.has_data) {
            let mut results = self.run_site(site, window).await?;
            time_series.append(&mut results);
        }
        Ok(time_series)
    }

    #[instrument(skip(self, site, window), fields(site = %site.name(), site_id = %site.id()))]
    async fn run_site(
        &self,
        site: &Site,
        window: &TimeWindow,
    ) -> Result<Vec<DataPayload>, ClientError> {
        let summary_def = definitions::top_talkers(site.id(), window, self.top_uplinks_limit);
        let summary_run = self.runner.run(&summary_def).await?;
        if summary_run.results.is_empty() {
            // Failed sub-reports were already logged by the runner.
            if summary_run.failures.is_empty() {
                warn!("summary report returned no sub-reports, skipping site");
            } else {
                debug!("summary report failed, skipping site");
            }
            return Ok(Vec::new());
        }

        let mut time_series = Vec::new();
        for summary in &summary_run.results {
            if summary.meta.count == 0 {
                info!("no data returned for site");
                continue;
            }
            let uplinks = select_active_uplinks(summary);
            if uplinks.is_empty() {
                info!("no active uplinks for site");
                continue;
            }
            info!(uplinks = uplinks.len(), "requesting uplink time series");
            let series_def = definitions::uplink_time_series(site.id(), &uplinks, window);
            let series_run = self.runner.run(&series_def).await?;
            time_series.extend(series_run.results);
        }
        Ok(time_series)
    }
}
