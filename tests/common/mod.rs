// Shared test helpers: scripted in-memory appliance and row builders
#![allow(dead_code)]

use insights_summary::client::{INSTANCES_PATH, ReportClient, data_def_path};
use insights_summary::error::ClientError;
use insights_summary::models::*;
use insights_summary::runner::PollPolicy;
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Script for one sub-report: status sequence (last one repeats), data outcome, delete outcome.
#[derive(Debug, Clone)]
pub struct SubReportPlan {
    statuses: VecDeque<StatusPayload>,
    data: Result<DataPayload, u16>,
    delete_status: Option<u16>,
}

fn status(state: &str) -> StatusPayload {
    StatusPayload {
        state: state.to_string(),
        messages: vec![],
    }
}

impl SubReportPlan {
    /// Walks through `states` in order, the last one being terminal.
    pub fn with_states(states: &[&str], data: DataPayload) -> Self {
        Self {
            statuses: states.iter().map(|s| status(s)).collect(),
            data: Ok(data),
            delete_status: None,
        }
    }

    pub fn completes_after(pending: &[&str], data: DataPayload) -> Self {
        let mut states: Vec<&str> = pending.to_vec();
        states.push("completed");
        Self::with_states(&states, data)
    }

    pub fn completes(data: DataPayload) -> Self {
        Self::completes_after(&[], data)
    }

    pub fn errors(messages: &[&str]) -> Self {
        Self {
            statuses: VecDeque::from([StatusPayload {
                state: "error".to_string(),
                messages: messages.iter().map(|m| m.to_string()).collect(),
            }]),
            data: Err(500),
            delete_status: None,
        }
    }

    pub fn stuck() -> Self {
        Self {
            statuses: VecDeque::from([status("executing")]),
            data: Err(500),
            delete_status: None,
        }
    }

    pub fn data_fails(http_status: u16) -> Self {
        Self {
            statuses: VecDeque::from([status("completed")]),
            data: Err(http_status),
            delete_status: None,
        }
    }

    pub fn delete_fails(mut self, http_status: u16) -> Self {
        self.delete_status = Some(http_status);
        self
    }
}

enum Submission {
    Accept(Vec<SubReportPlan>),
    Reject(u16),
}

#[derive(Default)]
struct Inner {
    next_job: u32,
    queue: VecDeque<Submission>,
    live: HashMap<(String, String), SubReportPlan>,
    submitted: Vec<ReportDefinition>,
    deleted: Vec<(String, String)>,
    status_calls: usize,
    data_calls: usize,
    sites: Vec<Site>,
}

/// In-memory ReportClient: each submission consumes the next queued script.
#[derive(Default)]
pub struct ScriptedClient {
    inner: Mutex<Inner>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sites(sites: Vec<Site>) -> Self {
        let client = Self::default();
        client.inner.lock().unwrap().sites = sites;
        client
    }

    pub fn accept(&self, plans: Vec<SubReportPlan>) {
        self.inner
            .lock()
            .unwrap()
            .queue
            .push_back(Submission::Accept(plans));
    }

    pub fn reject(&self, http_status: u16) {
        self.inner
            .lock()
            .unwrap()
            .queue
            .push_back(Submission::Reject(http_status));
    }

    pub fn submitted(&self) -> Vec<ReportDefinition> {
        self.inner.lock().unwrap().submitted.clone()
    }

    pub fn submitted_filters(&self) -> Vec<String> {
        self.submitted()
            .iter()
            .map(|d| d.data_defs[0].filters[0].value.clone())
            .collect()
    }

    pub fn deleted(&self) -> Vec<(String, String)> {
        self.inner.lock().unwrap().deleted.clone()
    }

    pub fn status_calls(&self) -> usize {
        self.inner.lock().unwrap().status_calls
    }

    pub fn data_calls(&self) -> usize {
        self.inner.lock().unwrap().data_calls
    }
}

fn status_error(method: &str, path: String, http_status: u16) -> ClientError {
    ClientError::Status {
        method: method.to_string(),
        path,
        status: http_status,
        body: "scripted failure".to_string(),
    }
}

impl ReportClient for ScriptedClient {
    async fn submit(&self, definition: &ReportDefinition) -> Result<ReportInstance, ClientError> {
        let mut inner = self.inner.lock().unwrap();
        inner.submitted.push(definition.clone());
        let submission = inner
            .queue
            .pop_front()
            .expect("unexpected report submission");
        let plans = match submission {
            Submission::Accept(plans) => plans,
            Submission::Reject(http_status) => {
                return Err(status_error("POST", INSTANCES_PATH.to_string(), http_status));
            }
        };
        inner.next_job += 1;
        let job_id = format!("j{}", inner.next_job);
        let mut data_defs = Vec::with_capacity(plans.len());
        for (i, plan) in plans.into_iter().enumerate() {
            let item_id = format!("i{}", i);
            inner.live.insert((job_id.clone(), item_id.clone()), plan);
            data_defs.push(DataDefHandle { id: item_id });
        }
        Ok(ReportInstance {
            id: job_id,
            data_defs,
        })
    }

    async fn status(&self, job_id: &str, item_id: &str) -> Result<StatusPayload, ClientError> {
        let mut inner = self.inner.lock().unwrap();
        inner.status_calls += 1;
        let plan = inner
            .live
            .get_mut(&(job_id.to_string(), item_id.to_string()))
            .expect("status for unknown sub-report");
        let next = if plan.statuses.len() > 1 {
            plan.statuses.pop_front()
        } else {
            plan.statuses.front().cloned()
        };
        Ok(next.expect("empty status script"))
    }

    async fn data(&self, job_id: &str, item_id: &str) -> Result<DataPayload, ClientError> {
        let mut inner = self.inner.lock().unwrap();
        inner.data_calls += 1;
        let plan = inner
            .live
            .get(&(job_id.to_string(), item_id.to_string()))
            .expect("data for unknown sub-report");
        plan.data.clone().map_err(|http_status| {
            status_error(
                "GET",
                format!("{}/data", data_def_path(job_id, item_id)),
                http_status,
            )
        })
    }

    async fn delete(&self, job_id: &str, item_id: &str) -> Result<(), ClientError> {
        let mut inner = self.inner.lock().unwrap();
        let key = (job_id.to_string(), item_id.to_string());
        inner.deleted.push(key.clone());
        match inner.live.get(&key).and_then(|p| p.delete_status) {
            Some(http_status) => Err(status_error(
                "DELETE",
                data_def_path(job_id, item_id),
                http_status,
            )),
            None => Ok(()),
        }
    }

    async fn search_sites(&self, _limit: u32) -> Result<Vec<Site>, ClientError> {
        Ok(self.inner.lock().unwrap().sites.clone())
    }
}

pub fn fast_policy() -> PollPolicy {
    PollPolicy {
        interval: Duration::from_millis(1),
        max_polls: 50,
        timeout: Duration::from_secs(30),
    }
}

pub fn payload(rows: Vec<Vec<Value>>) -> DataPayload {
    DataPayload {
        meta: DataMeta {
            count: rows.len() as u64,
        },
        data: rows,
    }
}

pub fn site(id: u64, name: &str, has_data: bool) -> Site {
    Site {
        has_data,
        site: SiteRef {
            id: id.to_string(),
            name: name.to_string(),
        },
    }
}

/// Top-talkers row: id, name, site id, site name, wan id, wan name, bytes/sec.
pub fn summary_row(uplink_id: u64, uplink_name: &str, bytes_ps: f64) -> Vec<Value> {
    vec![
        json!(uplink_id),
        json!(uplink_name),
        json!(1),
        json!("site"),
        json!(1),
        json!("wan"),
        json!(bytes_ps),
    ]
}

/// Time-series row with the columns the pivot reads filled in.
pub fn sample_row(
    start_time: i64,
    uplink_name: &str,
    site_name: &str,
    total: f64,
    inbound: f64,
    outbound: f64,
) -> Vec<Value> {
    vec![
        json!(start_time),
        json!(1),
        json!(uplink_name),
        json!(1),
        json!(site_name),
        json!(1),
        json!("wan"),
        json!(total),
        json!(inbound),
        json!(outbound),
    ]
}

/// Collects formatted log output so tests can count what a run logged.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl LogCapture {
    /// Install with `tracing::subscriber::set_default` on a current-thread runtime.
    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync + 'static {
        let writer = self.clone();
        tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish()
    }

    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock().unwrap())
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn count(&self, level: &str) -> usize {
        let tag = format!(" {} ", level);
        self.lines().iter().filter(|l| l.contains(&tag)).count()
    }
}
