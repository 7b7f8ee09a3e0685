// Picks the uplinks of a top-talkers summary worth a time-series follow-up.

use crate::models::{DataPayload, NO_DATA_UPLINK, UplinkSummary, decode_rows};

/// Uplinks at or below this aggregate rate are treated as idle.
pub const ACTIVE_THRESHOLD_BYTES_PS: f64 = 0.5;

pub fn is_active(uplink: &UplinkSummary) -> bool {
    uplink.total_bytes_ps > ACTIVE_THRESHOLD_BYTES_PS && uplink.uplink_name != NO_DATA_UPLINK
}

/// Active uplink ids in row order. Empty when the summary reports no items.
pub fn select_active_uplinks(summary: &DataPayload) -> Vec<String> {
    if summary.meta.count == 0 {
        return Vec::new();
    }
    decode_rows(&summary.data, UplinkSummary::decode)
        .into_iter()
        .filter(is_active)
        .map(|u| u.uplink_id)
        .collect()
}
