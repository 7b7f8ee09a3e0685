// Report job lifecycle: submit, poll each sub-report to a terminal state, fetch, delete.
// Sub-reports are independent: one failing never stops its siblings.

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::client::ReportClient;
use crate::config::ReportConfig;
use crate::error::{ClientError, JobError};
use crate::models::{DataPayload, JobState, ReportDefinition};

/// How long to wait between status polls and when to give up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_polls: u32,
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_polls: 720,
            timeout: Duration::from_secs(3600),
        }
    }
}

impl PollPolicy {
    pub fn from_config(config: &ReportConfig) -> Self {
        Self {
            interval: config.poll_interval(),
            max_polls: config.max_polls,
            timeout: config.job_timeout(),
        }
    }
}

#[derive(Debug)]
pub struct SubReportFailure {
    /// Position of the sub-report in the definition's `data_defs`.
    pub index: usize,
    pub item_id: String,
    pub error: JobError,
}

/// Outcome of one submitted definition. `results` keeps definition order, minus failures.
#[derive(Debug, Default)]
pub struct ReportRun {
    pub job_id: String,
    pub results: Vec<DataPayload>,
    pub failures: Vec<SubReportFailure>,
}

pub struct ReportJobRunner<'a, C> {
    client: &'a C,
    policy: PollPolicy,
}

impl<'a, C: ReportClient> ReportJobRunner<'a, C> {
    pub fn new(client: &'a C, policy: PollPolicy) -> Self {
        Self { client, policy }
    }

    /// Submission failure is the only error returned here; there is no job to clean up then.
    #[instrument(skip(self, definition), fields(operation = "run_report"))]
    pub async fn run(&self, definition: &ReportDefinition) -> Result<ReportRun, ClientError> {
        let instance = self.client.submit(definition).await?;
        info!(
            job_id = %instance.id,
            sub_reports = instance.data_defs.len(),
            "report submitted"
        );

        let mut run = ReportRun {
            job_id: instance.id.clone(),
            ..Default::default()
        };
        for (index, item) in instance.data_defs.iter().enumerate() {
            let outcome = self.complete(&instance.id, &item.id).await;
            self.release(&instance.id, &item.id).await;
            match outcome {
                Ok(payload) => run.results.push(payload),
                Err(error) => {
                    warn!(
                        job_id = %instance.id,
                        item_id = %item.id,
                        error = %error,
                        "sub-report failed"
                    );
                    run.failures.push(SubReportFailure {
                        index,
                        item_id: item.id.clone(),
                        error,
                    });
                }
            }
        }
        Ok(run)
    }

    async fn complete(&self, job_id: &str, item_id: &str) -> Result<DataPayload, JobError> {
        self.wait_for_terminal(job_id, item_id).await?;
        Ok(self.client.data(job_id, item_id).await?)
    }

    /// Polls until the sub-report leaves pending/initializing/executing.
    async fn wait_for_terminal(&self, job_id: &str, item_id: &str) -> Result<(), JobError> {
        let started = Instant::now();
        let mut polls: u32 = 0;
        loop {
            let status = self.client.status(job_id, item_id).await?;
            polls += 1;
            match JobState::parse(&status.state) {
                JobState::Error => {
                    return Err(JobError::Failed {
                        messages: status.messages,
                    });
                }
                JobState::Completed(state) => {
                    debug!(job_id, item_id, state = %state, polls, "sub-report complete");
                    return Ok(());
                }
                pending => {
                    let elapsed = started.elapsed();
                    if polls >= self.policy.max_polls || elapsed >= self.policy.timeout {
                        return Err(JobError::TimedOut { polls, elapsed });
                    }
                    debug!(
                        job_id,
                        item_id,
                        state = ?pending,
                        wait_ms = self.policy.interval.as_millis() as u64,
                        "sub-report not ready, waiting"
                    );
                    tokio::time::sleep(self.policy.interval).await;
                }
            }
        }
    }

    /// Best-effort: a failed delete is logged, never returned.
    async fn release(&self, job_id: &str, item_id: &str) {
        match self.client.delete(job_id, item_id).await {
            Ok(()) => debug!(job_id, item_id, "sub-report deleted"),
            Err(e) => warn!(
                job_id,
                item_id,
                error = %e,
                operation = "delete_sub_report",
                "failed to delete sub-report"
            ),
        }
    }
}
