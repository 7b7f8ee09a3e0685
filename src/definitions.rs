// Report definition builders. Every request gets a fresh value; nothing is shared between sites.

use crate::models::{DataDef, Direction, Filter, ReportDefinition, Source, TimeWindow, TopBy};

pub const REFERENCE_ID: &str = "topUplinkDD";
pub const SOURCE: &str = "sdwan";
pub const RANK_METRIC: &str = "sum_traffic.total_bytes_ps";

/// Column order is the contract `UplinkSummary::decode` reads by position.
pub const TOP_TALKERS_COLUMNS: [&str; 7] = [
    "sdwan.uplink.id",
    "sdwan.uplink.name",
    "sdwan.site.id",
    "sdwan.site.name",
    "sdwan.wan.id",
    "sdwan.wan.name",
    "sum_traffic.total_bytes_ps",
];

/// Column order is the contract `UplinkSample::decode` reads by position.
pub const TIME_SERIES_COLUMNS: [&str; 10] = [
    "start_time",
    "sdwan.uplink.id",
    "sdwan.uplink.name",
    "sdwan.site.id",
    "sdwan.site.name",
    "sdwan.wan.id",
    "sdwan.wan.name",
    "sum_traffic.total_bytes_ps",
    "sum_traffic.total_p2m_bytes_ps",
    "sum_traffic.total_m2p_bytes_ps",
];

pub fn site_filter(site_id: &str) -> String {
    format!("sdwan.site.id == {}", site_id)
}

pub fn site_uplinks_filter(site_id: &str, uplink_ids: &[String]) -> String {
    format!(
        "{} and sdwan.uplink.id in ({})",
        site_filter(site_id),
        uplink_ids.join(",")
    )
}

/// Top uplinks of one site over the window, ranked by total throughput.
pub fn top_talkers(site_id: &str, window: &TimeWindow, limit: u32) -> ReportDefinition {
    ReportDefinition::single(DataDef {
        reference_id: REFERENCE_ID.to_string(),
        time: window.clone(),
        filters: vec![Filter {
            value: site_filter(site_id),
        }],
        group_by: vec!["sdwan.uplink.id".to_string()],
        top_by: vec![rank_by_throughput()],
        columns: owned(&TOP_TALKERS_COLUMNS),
        source: Source {
            name: SOURCE.to_string(),
        },
        limit: Some(limit),
    })
}

/// Per-bucket throughput of the given uplinks of one site.
pub fn uplink_time_series(
    site_id: &str,
    uplink_ids: &[String],
    window: &TimeWindow,
) -> ReportDefinition {
    ReportDefinition::single(DataDef {
        reference_id: REFERENCE_ID.to_string(),
        time: window.clone(),
        filters: vec![Filter {
            value: site_uplinks_filter(site_id, uplink_ids),
        }],
        group_by: vec!["start_time".to_string(), "sdwan.uplink.id".to_string()],
        top_by: vec![rank_by_throughput()],
        columns: owned(&TIME_SERIES_COLUMNS),
        source: Source {
            name: SOURCE.to_string(),
        },
        limit: None,
    })
}

fn rank_by_throughput() -> TopBy {
    TopBy {
        id: RANK_METRIC.to_string(),
        direction: Direction::Desc,
    }
}

fn owned(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| c.to_string()).collect()
}
