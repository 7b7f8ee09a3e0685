// Typed records for the two report schemas. Decode happens once, right after fetch.

use serde_json::Value;

use crate::error::DecodeError;

/// Name the appliance reports for an uplink it has no inventory data for.
pub const NO_DATA_UPLINK: &str = "#N/D";

/// One row of the top-talkers summary (see `definitions::TOP_TALKERS_COLUMNS`).
#[derive(Debug, Clone, PartialEq)]
pub struct UplinkSummary {
    pub uplink_id: String,
    pub uplink_name: String,
    pub total_bytes_ps: f64,
}

impl UplinkSummary {
    const UPLINK_ID: usize = 0;
    const UPLINK_NAME: usize = 1;
    const TOTAL_BYTES_PS: usize = 6;

    pub fn decode(row: &[Value]) -> Result<Self, DecodeError> {
        Ok(Self {
            uplink_id: text(row, Self::UPLINK_ID, "sdwan.uplink.id")?,
            uplink_name: text(row, Self::UPLINK_NAME, "sdwan.uplink.name")?,
            total_bytes_ps: number(row, Self::TOTAL_BYTES_PS, "sum_traffic.total_bytes_ps")?,
        })
    }
}

/// One row of the per-uplink time series (see `definitions::TIME_SERIES_COLUMNS`).
#[derive(Debug, Clone, PartialEq)]
pub struct UplinkSample {
    /// Bucket start, epoch seconds.
    pub start_time: i64,
    pub uplink_name: String,
    pub site_name: String,
    pub total_bytes_ps: f64,
    pub inbound_bytes_ps: f64,
    pub outbound_bytes_ps: f64,
}

impl UplinkSample {
    const START_TIME: usize = 0;
    const UPLINK_NAME: usize = 2;
    const SITE_NAME: usize = 4;
    const TOTAL_BYTES_PS: usize = 7;
    const INBOUND_BYTES_PS: usize = 8;
    const OUTBOUND_BYTES_PS: usize = 9;

    pub fn decode(row: &[Value]) -> Result<Self, DecodeError> {
        Ok(Self {
            start_time: epoch_seconds(row, Self::START_TIME, "start_time")?,
            uplink_name: text(row, Self::UPLINK_NAME, "sdwan.uplink.name")?,
            site_name: text(row, Self::SITE_NAME, "sdwan.site.name")?,
            total_bytes_ps: number(row, Self::TOTAL_BYTES_PS, "sum_traffic.total_bytes_ps")?,
            inbound_bytes_ps: number(
                row,
                Self::INBOUND_BYTES_PS,
                "sum_traffic.total_p2m_bytes_ps",
            )?,
            outbound_bytes_ps: number(
                row,
                Self::OUTBOUND_BYTES_PS,
                "sum_traffic.total_m2p_bytes_ps",
            )?,
        })
    }
}

/// Decodes every row with `decode`; rows that do not fit the schema are logged and skipped.
pub fn decode_rows<T>(
    rows: &[Vec<Value>],
    decode: fn(&[Value]) -> Result<T, DecodeError>,
) -> Vec<T> {
    rows.iter()
        .enumerate()
        .filter_map(|(i, row)| match decode(row) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(row = i, error = %e, "skipping malformed report row");
                None
            }
        })
        .collect()
}

fn cell<'a>(row: &'a [Value], index: usize, column: &'static str) -> Result<&'a Value, DecodeError> {
    row.get(index)
        .ok_or(DecodeError::MissingColumn { index, column })
}

/// Strings pass through; numbers keep their JSON text form (ids are used verbatim in filters).
fn text(row: &[Value], index: usize, column: &'static str) -> Result<String, DecodeError> {
    match cell(row, index, column)? {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(DecodeError::WrongKind {
            index,
            column,
            expected: "a string",
            value: other.to_string(),
        }),
    }
}

/// Numeric cells arrive either as JSON numbers or as numeric strings. NaN and infinities are rejected.
fn number(row: &[Value], index: usize, column: &'static str) -> Result<f64, DecodeError> {
    let value = cell(row, index, column)?;
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|v| v.is_finite())
        .ok_or_else(|| DecodeError::WrongKind {
            index,
            column,
            expected: "numeric",
            value: value.to_string(),
        })
}

/// Bucket timestamps key the pivot, so only whole seconds in `i64` range are accepted.
fn epoch_seconds(row: &[Value], index: usize, column: &'static str) -> Result<i64, DecodeError> {
    let value = cell(row, index, column)?;
    if let Some(secs) = value.as_i64() {
        return Ok(secs);
    }
    let wrong_kind = || DecodeError::WrongKind {
        index,
        column,
        expected: "whole epoch seconds",
        value: value.to_string(),
    };
    let secs = number(row, index, column).map_err(|_| wrong_kind())?;
    if secs.fract() != 0.0 || secs < i64::MIN as f64 || secs >= i64::MAX as f64 {
        return Err(wrong_kind());
    }
    Ok(secs as i64)
}
