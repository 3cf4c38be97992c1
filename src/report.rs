use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook};
use tracing::debug;

use crate::directory::AccountDirectory;
use crate::error::ReportError;
use crate::summary;
use crate::types::BackupJobRecord;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub const SUMMARY_SHEET: &str = "Resumen";
pub const YESTERDAY_SHEET: &str = "Día Anterior";
pub const TODAY_SHEET: &str = "Día Actual";

pub const SUMMARY_HEADERS: [&str; 3] = ["AccountName", "T. COMPLETED", "T. FAILED"];
pub const DETAIL_HEADERS: [&str; 9] = [
    "BackupJobID",
    "Status",
    "AccountID",
    "AccountName",
    "ResourceName",
    "MessageCategory",
    "ResourceID",
    "ResourceType",
    "CreationTime",
];

const CREATION_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const PLACEHOLDER: &str = "-";
const DEFAULT_STATUS_MESSAGE: &str = "Success";
const HEADER_COLOR: u32 = 0x0066CC;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(u32),
}

impl Cell {
    fn text(value: Option<&str>, default: &str) -> Self {
        Self::Text(value.unwrap_or(default).to_string())
    }
}

#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: &'static str,
    pub headers: &'static [&'static str],
    pub column_widths: Vec<f64>,
    pub rows: Vec<Vec<Cell>>,
}

/// The three-sheet report, built once per run.
#[derive(Debug, Clone)]
pub struct ReportArtifact {
    pub sheets: Vec<Sheet>,
}

impl ReportArtifact {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Serialize to an XLSX workbook.
    pub fn to_xlsx(&self) -> Result<Vec<u8>, ReportError> {
        let mut workbook = Workbook::new();
        let header_format = Format::new()
            .set_bold()
            .set_font_color(Color::White)
            .set_background_color(Color::RGB(HEADER_COLOR))
            .set_align(FormatAlign::Center);

        for sheet in &self.sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(sheet.name).map_err(xlsx_error)?;

            for (col, header) in sheet.headers.iter().enumerate() {
                worksheet
                    .write_string_with_format(0, col as u16, *header, &header_format)
                    .map_err(xlsx_error)?;
            }

            for (idx, row) in sheet.rows.iter().enumerate() {
                let row_num = idx as u32 + 1;
                for (col, cell) in row.iter().enumerate() {
                    match cell {
                        Cell::Text(value) => {
                            worksheet
                                .write_string(row_num, col as u16, value)
                                .map_err(xlsx_error)?;
                        }
                        Cell::Number(value) => {
                            worksheet
                                .write_number(row_num, col as u16, *value)
                                .map_err(xlsx_error)?;
                        }
                    }
                }
            }

            for (col, width) in sheet.column_widths.iter().enumerate() {
                worksheet
                    .set_column_width(col as u16, *width)
                    .map_err(xlsx_error)?;
            }
        }

        workbook.save_to_buffer().map_err(xlsx_error)
    }
}

fn xlsx_error(e: rust_xlsxwriter::XlsxError) -> ReportError {
    ReportError::Render(e.to_string())
}

/// Build the overview sheet from today's jobs plus one detail sheet per day.
pub async fn render(
    yesterday_records: &[BackupJobRecord],
    today_records: &[BackupJobRecord],
    directory: &mut AccountDirectory<'_>,
) -> ReportArtifact {
    let today_summary = summary::aggregate(today_records, directory).await;

    let overview_rows = today_summary
        .iter()
        .map(|(name, counts)| {
            vec![
                Cell::Text(name.to_string()),
                Cell::Number(counts.completed),
                Cell::Number(counts.failed),
            ]
        })
        .collect();

    let overview = Sheet {
        name: SUMMARY_SHEET,
        headers: &SUMMARY_HEADERS,
        column_widths: vec![20.0, 15.0, 15.0],
        rows: overview_rows,
    };

    let yesterday = detail_sheet(YESTERDAY_SHEET, yesterday_records, directory).await;
    let today = detail_sheet(TODAY_SHEET, today_records, directory).await;

    debug!(
        overview_rows = overview.rows.len(),
        yesterday_rows = yesterday.rows.len(),
        today_rows = today.rows.len(),
        "Report artifact rendered"
    );

    ReportArtifact {
        sheets: vec![overview, yesterday, today],
    }
}

async fn detail_sheet(
    name: &'static str,
    records: &[BackupJobRecord],
    directory: &mut AccountDirectory<'_>,
) -> Sheet {
    let mut rows = Vec::with_capacity(records.len());

    for record in records {
        let account_name = directory.display_name(record.account_id.as_deref()).await;
        let creation_time = record
            .creation_date
            .map(|ts| ts.format(CREATION_TIME_FORMAT).to_string())
            .unwrap_or_else(|| PLACEHOLDER.to_string());

        rows.push(vec![
            Cell::text(record.backup_job_id.as_deref(), PLACEHOLDER),
            Cell::text(record.state.as_deref(), PLACEHOLDER),
            Cell::text(record.account_id.as_deref(), PLACEHOLDER),
            Cell::Text(account_name),
            Cell::text(record.resource_name.as_deref(), PLACEHOLDER),
            Cell::text(record.status_message.as_deref(), DEFAULT_STATUS_MESSAGE),
            Cell::text(record.resource_arn.as_deref(), PLACEHOLDER),
            Cell::text(record.resource_type.as_deref(), PLACEHOLDER),
            Cell::Text(creation_time),
        ]);
    }

    Sheet {
        name,
        headers: &DETAIL_HEADERS,
        column_widths: vec![15.0; DETAIL_HEADERS.len()],
        rows,
    }
}
