// Pivot of raw time-series rows: per site, timestamp x uplink -> (total, inbound, outbound) Mbps.
// Keyed, not appended: a repeated (timestamp, uplink) pair keeps the last sample seen.

use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

use crate::models::{DataPayload, UplinkSample, decode_rows};

/// Bytes/sec to megabits/sec. Multiply first so whole-byte rates stay exact.
pub fn bytes_ps_to_mbps(bytes_ps: f64) -> f64 {
    bytes_ps * 8.0 / 1_000_000.0
}

/// Throughput of one uplink in one bucket, already in Mbps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Throughput {
    pub total: f64,
    pub inbound: f64,
    pub outbound: f64,
}

impl Throughput {
    /// Metrics per uplink; every column block in the sheet is this wide.
    pub const ARITY: usize = 3;

    pub fn from_sample(sample: &UplinkSample) -> Self {
        Self {
            total: bytes_ps_to_mbps(sample.total_bytes_ps),
            inbound: bytes_ps_to_mbps(sample.inbound_bytes_ps),
            outbound: bytes_ps_to_mbps(sample.outbound_bytes_ps),
        }
    }

    pub fn values(&self) -> [f64; Self::ARITY] {
        [self.total, self.inbound, self.outbound]
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PivotTable {
    site_name: String,
    /// First-seen order; drives column block order downstream.
    uplinks: Vec<String>,
    rows: BTreeMap<i64, HashMap<String, Throughput>>,
}

impl PivotTable {
    pub fn new(site_name: impl Into<String>) -> Self {
        Self {
            site_name: site_name.into(),
            ..Default::default()
        }
    }

    pub fn site_name(&self) -> &str {
        &self.site_name
    }

    pub fn uplinks(&self) -> &[String] {
        &self.uplinks
    }

    pub fn insert(&mut self, sample: &UplinkSample) {
        if !self.uplinks.contains(&sample.uplink_name) {
            self.uplinks.push(sample.uplink_name.clone());
        }
        self.rows
            .entry(sample.start_time)
            .or_default()
            .insert(sample.uplink_name.clone(), Throughput::from_sample(sample));
    }

    pub fn get(&self, start_time: i64, uplink: &str) -> Option<&Throughput> {
        self.rows.get(&start_time).and_then(|r| r.get(uplink))
    }

    /// Distinct timestamps, ascending.
    pub fn timestamps(&self) -> impl Iterator<Item = i64> + '_ {
        self.rows.keys().copied()
    }

    /// Rows ascending by timestamp.
    pub fn rows(&self) -> impl Iterator<Item = (i64, &HashMap<String, Throughput>)> {
        self.rows.iter().map(|(ts, row)| (*ts, row))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Pivot tables in first-seen site order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SitePivots {
    tables: Vec<PivotTable>,
}

impl SitePivots {
    pub fn get(&self, site_name: &str) -> Option<&PivotTable> {
        self.tables.iter().find(|t| t.site_name == site_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PivotTable> {
        self.tables.iter()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    fn table_mut(&mut self, site_name: &str) -> &mut PivotTable {
        let idx = match self.tables.iter().position(|t| t.site_name == site_name) {
            Some(idx) => idx,
            None => {
                self.tables.push(PivotTable::new(site_name));
                self.tables.len() - 1
            }
        };
        &mut self.tables[idx]
    }
}

/// Groups each result set under the site named by its first row and pivots its samples.
pub fn build(results: &[DataPayload]) -> SitePivots {
    let mut pivots = SitePivots::default();
    for (i, result) in results.iter().enumerate() {
        let samples = decode_rows(&result.data, UplinkSample::decode);
        let Some(first) = samples.first() else {
            debug!(result = i, "time-series result has no rows, skipping");
            continue;
        };
        let site_name = first.site_name.clone();
        if samples.len() < result.data.len() {
            warn!(
                result = i,
                site = %site_name,
                skipped = result.data.len() - samples.len(),
                "time-series result had malformed rows"
            );
        }
        let table = pivots.table_mut(&site_name);
        for sample in &samples {
            table.insert(sample);
        }
    }
    pivots
}
