// Workbook output: renders sheet layouts with rust_xlsxwriter and saves with bounded retry.

use rust_xlsxwriter::{Format, FormatAlign, Workbook, XlsxError};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::config::OutputConfig;
use crate::error::ExportError;
use crate::layout::{CellStyle, CellValue, METRIC_HEADER_ROW, SheetLayout};

pub const COLUMN_WIDTH: f64 = 14.0;
pub const METRIC_HEADER_HEIGHT: f64 = 45.0;
pub const DATE_FORMAT: &str = "dd/mm/yy hh:mm";
pub const THROUGHPUT_FORMAT: &str = "#,##0.000";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    /// Wait before retry n is n * backoff.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &OutputConfig) -> Self {
        Self {
            attempts: config.write_attempts.max(1),
            backoff: config.retry_backoff(),
        }
    }
}

struct Styles {
    header: Format,
    group_header: Format,
    date_time: Format,
    throughput: Format,
}

impl Styles {
    fn new() -> Self {
        Self {
            header: Format::new()
                .set_bold()
                .set_text_wrap()
                .set_align(FormatAlign::Center),
            group_header: Format::new()
                .set_bold()
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::Top),
            date_time: Format::new().set_num_format(DATE_FORMAT),
            throughput: Format::new().set_num_format(THROUGHPUT_FORMAT),
        }
    }

    fn get(&self, style: CellStyle) -> &Format {
        match style {
            CellStyle::Header => &self.header,
            CellStyle::GroupHeader => &self.group_header,
            CellStyle::DateTime => &self.date_time,
            CellStyle::Throughput => &self.throughput,
        }
    }
}

/// Builds an in-memory workbook, one worksheet per layout.
pub fn build_workbook(layouts: &[SheetLayout]) -> Result<Workbook, XlsxError> {
    let styles = Styles::new();
    let mut workbook = Workbook::new();
    for layout in layouts {
        let sheet = workbook.add_worksheet();
        sheet.set_name(&layout.name)?;
        for col in 0..layout.column_count {
            sheet.set_column_width(col, COLUMN_WIDTH)?;
        }
        sheet.set_row_height(METRIC_HEADER_ROW, METRIC_HEADER_HEIGHT)?;
        for range in &layout.merged {
            sheet.merge_range(
                range.row,
                range.first_col,
                range.row,
                range.last_col,
                &range.label,
                styles.get(CellStyle::GroupHeader),
            )?;
        }
        for cell in &layout.cells {
            let format = styles.get(cell.style);
            match &cell.value {
                CellValue::Text(s) => {
                    sheet.write_string_with_format(cell.row, cell.col, s, format)?;
                }
                CellValue::Number(n) => {
                    sheet.write_number_with_format(cell.row, cell.col, *n, format)?;
                }
            }
        }
    }
    Ok(workbook)
}

/// Saves the layouts to `path`. Layout errors fail at once; save errors are retried.
/// Rendering and zip output run on the blocking pool.
#[instrument(skip(layouts, policy), fields(operation = "write_workbook", sheets = layouts.len()))]
pub async fn write_workbook(
    path: &Path,
    layouts: &[SheetLayout],
    policy: RetryPolicy,
) -> Result<(), ExportError> {
    let layouts: Arc<[SheetLayout]> = layouts.into();
    let mut attempt = 1;
    loop {
        let task_layouts = layouts.clone();
        let task_path = path.to_path_buf();
        let rendered = tokio::task::spawn_blocking(move || {
            let mut workbook = build_workbook(&task_layouts)?;
            Ok::<_, XlsxError>(workbook.save(&task_path))
        })
        .await?;
        match rendered.map_err(ExportError::Layout)? {
            Ok(()) => {
                info!(path = %path.display(), "workbook written");
                return Ok(());
            }
            Err(source) if attempt >= policy.attempts => {
                return Err(ExportError::Write {
                    attempts: attempt,
                    source,
                });
            }
            Err(e) => {
                let wait = policy.backoff * attempt;
                warn!(
                    path = %path.display(),
                    attempt,
                    error = %e,
                    retry_in_ms = wait.as_millis() as u64,
                    "failed to write workbook, retrying"
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
        }
    }
}
