// Typed errors for the client, report jobs, row decoding and workbook export

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{method} {path} returned status {status}: {body}")]
    Status {
        method: String,
        path: String,
        status: u16,
        body: String,
    },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected payload from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error("report failed: {}", messages.join("; "))]
    Failed { messages: Vec<String> },
    #[error("report timed out after {polls} polls ({elapsed:?})")]
    TimedOut { polls: u32, elapsed: Duration },
    #[error(transparent)]
    Client(#[from] ClientError),
}

#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    #[error("row has no column {index} ({column})")]
    MissingColumn { index: usize, column: &'static str },
    #[error("column {index} ({column}) is not {expected}: {value}")]
    WrongKind {
        index: usize,
        column: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write workbook after {attempts} attempts: {source}")]
    Write {
        attempts: u32,
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },
    #[error("invalid sheet layout: {0}")]
    Layout(#[source] rust_xlsxwriter::XlsxError),
    #[error("workbook writer task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
