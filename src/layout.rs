// Sheet layout for a pivot table: which value and style go in which cell.
//
//       | Uplink A                           | Uplink B                           |
// Start | Total Tput | Inbound  | Outbound   | Total Tput | Inbound  | Outbound   |
// date  | Mbps       | Mbps     | Mbps       | Mbps       | Mbps     | Mbps       |

use std::collections::HashSet;

use crate::pivot::{PivotTable, SitePivots, Throughput};

pub const TIME_HEADER: &str = "Start Time";
pub const METRIC_HEADERS: [&str; Throughput::ARITY] =
    ["Total Throughput", "Inbound Throughput", "Outbound Throughput"];

/// Row of the merged uplink labels.
pub const GROUP_HEADER_ROW: u32 = 0;
/// Row of "Start Time" and the per-metric labels.
pub const METRIC_HEADER_ROW: u32 = 1;
pub const FIRST_DATA_ROW: u32 = 2;
/// Column 0 holds the time axis; uplink blocks start right after it.
pub const TIME_COLUMN: u16 = 0;

/// Days between the spreadsheet date epoch and 1970-01-01.
pub const SPREADSHEET_EPOCH_OFFSET_DAYS: f64 = 25569.0;
const SECONDS_PER_DAY: f64 = 86400.0;

/// Spreadsheet sheet names are limited to 31 characters.
pub const MAX_SHEET_NAME_LEN: usize = 31;
/// Used when a site name is blank after sanitizing.
pub const BLANK_SHEET_NAME: &str = "Site";
const INVALID_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

pub fn date_serial(epoch_secs: i64) -> f64 {
    epoch_secs as f64 / SECONDS_PER_DAY + SPREADSHEET_EPOCH_OFFSET_DAYS
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellStyle {
    /// Bold, wrapped, centred metric labels.
    Header,
    /// Bold, centred, top-aligned merged uplink label.
    GroupHeader,
    /// "dd/mm/yy hh:mm".
    DateTime,
    /// "#,##0.000".
    Throughput,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub row: u32,
    pub col: u16,
    pub value: CellValue,
    pub style: CellStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergedRange {
    pub row: u32,
    pub first_col: u16,
    pub last_col: u16,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SheetLayout {
    pub name: String,
    pub merged: Vec<MergedRange>,
    /// Written cells only; a missing sample leaves its cells out entirely.
    pub cells: Vec<Cell>,
    /// Columns in use, time column included.
    pub column_count: u16,
    pub data_rows: u32,
}

impl SheetLayout {
    pub fn cell(&self, row: u32, col: u16) -> Option<&Cell> {
        self.cells.iter().find(|c| c.row == row && c.col == col)
    }

    pub fn number(&self, row: u32, col: u16) -> Option<f64> {
        match self.cell(row, col)?.value {
            CellValue::Number(n) => Some(n),
            CellValue::Text(_) => None,
        }
    }

    pub fn text(&self, row: u32, col: u16) -> Option<&str> {
        match &self.cell(row, col)?.value {
            CellValue::Text(s) => Some(s),
            CellValue::Number(_) => None,
        }
    }
}

fn block_start(uplink_index: usize) -> u16 {
    (1 + uplink_index * Throughput::ARITY) as u16
}

/// Lays out one site. The sheet is named after the site as-is.
pub fn emit_sheet(table: &PivotTable) -> SheetLayout {
    let mut merged = Vec::with_capacity(table.uplinks().len());
    let mut cells = Vec::new();

    cells.push(Cell {
        row: METRIC_HEADER_ROW,
        col: TIME_COLUMN,
        value: CellValue::Text(TIME_HEADER.to_string()),
        style: CellStyle::Header,
    });
    for (i, uplink) in table.uplinks().iter().enumerate() {
        let first_col = block_start(i);
        merged.push(MergedRange {
            row: GROUP_HEADER_ROW,
            first_col,
            last_col: first_col + Throughput::ARITY as u16 - 1,
            label: uplink.clone(),
        });
        for (offset, label) in METRIC_HEADERS.iter().enumerate() {
            cells.push(Cell {
                row: METRIC_HEADER_ROW,
                col: first_col + offset as u16,
                value: CellValue::Text(label.to_string()),
                style: CellStyle::Header,
            });
        }
    }

    let mut row = FIRST_DATA_ROW;
    for (start_time, samples) in table.rows() {
        cells.push(Cell {
            row,
            col: TIME_COLUMN,
            value: CellValue::Number(date_serial(start_time)),
            style: CellStyle::DateTime,
        });
        for (i, uplink) in table.uplinks().iter().enumerate() {
            let Some(tput) = samples.get(uplink) else {
                continue;
            };
            let first_col = block_start(i);
            for (offset, value) in tput.values().into_iter().enumerate() {
                cells.push(Cell {
                    row,
                    col: first_col + offset as u16,
                    value: CellValue::Number(value),
                    style: CellStyle::Throughput,
                });
            }
        }
        row += 1;
    }

    SheetLayout {
        name: table.site_name().to_string(),
        merged,
        cells,
        column_count: block_start(table.uplinks().len()),
        data_rows: row - FIRST_DATA_ROW,
    }
}

/// One sheet per site, in pivot order, with names made valid and unique.
pub fn emit(pivots: &SitePivots) -> Vec<SheetLayout> {
    let mut used = HashSet::new();
    pivots
        .iter()
        .map(|table| {
            let mut sheet = emit_sheet(table);
            sheet.name = unique_sheet_name(&sheet.name, &mut used);
            sheet
        })
        .collect()
}

/// Replaces characters spreadsheets reject and truncates to the name limit.
pub fn sanitize_sheet_name(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| if INVALID_SHEET_CHARS.contains(&c) { '_' } else { c })
        .take(MAX_SHEET_NAME_LEN)
        .collect();
    let cleaned = cleaned.trim_matches('\'');
    if cleaned.trim().is_empty() {
        BLANK_SHEET_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Sheet names compare case-insensitively; clashes get a " (n)" suffix.
fn unique_sheet_name(raw: &str, used: &mut HashSet<String>) -> String {
    let base = sanitize_sheet_name(raw);
    let mut candidate = base.clone();
    let mut n = 2;
    while used.contains(&candidate.to_lowercase()) {
        let suffix = format!(" ({})", n);
        let keep = MAX_SHEET_NAME_LEN - suffix.chars().count();
        candidate = base.chars().take(keep).collect::<String>() + &suffix;
        n += 1;
    }
    used.insert(candidate.to_lowercase());
    candidate
}
