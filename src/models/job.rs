// Report job payloads: instance creation, status, data

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Handle for one sub-report inside a submitted job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataDefHandle {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
}

/// Response of a report submission: job id plus one handle per sub-report, in definition order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportInstance {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub data_defs: Vec<DataDefHandle>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPayload {
    pub state: String,
    #[serde(default)]
    pub messages: Vec<String>,
}

/// Sub-report lifecycle state as reported by the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Initializing,
    Executing,
    Error,
    /// Any other state string is a terminal success.
    Completed(String),
}

impl JobState {
    pub fn parse(s: &str) -> Self {
        match s {
            "pending" => JobState::Pending,
            "initializing" => JobState::Initializing,
            "executing" => JobState::Executing,
            "error" => JobState::Error,
            other => JobState::Completed(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataMeta {
    #[serde(default)]
    pub count: u64,
}

/// Sub-report result: positional rows whose meaning is fixed by the definition's column list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataPayload {
    #[serde(default)]
    pub meta: DataMeta,
    #[serde(default)]
    pub data: Vec<Vec<Value>>,
}

/// Appliance ids arrive as numbers or strings depending on the endpoint.
pub(crate) fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}
