// Report definition payload (POST /api/npm.reports/1.0/instances)

use serde::{Deserialize, Serialize};

/// Time window shared by every sub-report of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Appliance timeframe expression, e.g. "last 30 days".
    pub duration: String,
    /// Bucket size in seconds as the appliance expects it ("60", "3600", "86400").
    pub granularity: String,
}

impl TimeWindow {
    pub fn new(duration: impl Into<String>, granularity: impl Into<String>) -> Self {
        Self {
            duration: duration.into(),
            granularity: granularity.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopBy {
    pub id: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
}

/// One sub-report. `columns` order is the positional contract of every returned row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataDef {
    pub reference_id: String,
    pub time: TimeWindow,
    pub filters: Vec<Filter>,
    pub group_by: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub top_by: Vec<TopBy>,
    pub columns: Vec<String>,
    pub source: Source,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDefinition {
    pub data_defs: Vec<DataDef>,
}

impl ReportDefinition {
    pub fn single(data_def: DataDef) -> Self {
        Self {
            data_defs: vec![data_def],
        }
    }
}
