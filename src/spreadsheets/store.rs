// spreadsheets/store.rs
use crate::domain::listing::{ListingStatus, ReconciledRow};
use crate::spreadsheets::columns::{self, parse_stored_date, CellValue, Column, RowCells};
use calamine::{open_workbook, Data, DataType, Reader, Xlsx, XlsxError};
use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Workbook};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const SHEET_NAME: &str = "Listings";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read workbook {path}: {message}")]
    Read { path: PathBuf, message: String },
    #[error("workbook {0} has no Address column")]
    MissingAddressColumn(PathBuf),
    #[error("failed to render workbook: {0}")]
    Render(#[from] rust_xlsxwriter::XlsxError),
    #[error("failed to write workbook {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The persisted dataset, keyed by address.
///
/// Callers hold the load -> reconcile -> save sequence as one critical section;
/// implementations do no locking of their own.
pub trait ListingStore {
    /// Rows keyed by address. A store that does not exist yet loads as empty.
    fn load(&self) -> Result<HashMap<String, ReconciledRow>, StoreError>;

    /// Replaces the whole dataset. Either every row is written or nothing is.
    fn save(&self, rows: &[ReconciledRow]) -> Result<(), StoreError>;
}

/// Single-sheet `.xlsx` workbook on disk.
#[derive(Debug, Clone)]
pub struct XlsxStore {
    path: PathBuf,
}

impl XlsxStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_err(&self, message: impl ToString) -> StoreError {
        StoreError::Read {
            path: self.path.clone(),
            message: message.to_string(),
        }
    }
}

impl ListingStore for XlsxStore {
    fn load(&self) -> Result<HashMap<String, ReconciledRow>, StoreError> {
        if !self.path.exists() {
            tracing::info!(path = %self.path.display(), "no existing workbook, starting empty");
            return Ok(HashMap::new());
        }

        let mut workbook: Xlsx<_> =
            open_workbook(&self.path).map_err(|e: XlsxError| self.read_err(e))?;
        let range = match workbook.worksheet_range_at(0) {
            Some(range) => range.map_err(|e| self.read_err(e))?,
            None => return Ok(HashMap::new()),
        };

        let mut sheet_rows = range.rows();
        let Some(header) = sheet_rows.next() else {
            return Ok(HashMap::new());
        };
        let layout: Vec<Option<Column>> = header
            .iter()
            .map(|cell| cell_text(cell).and_then(|h| Column::from_header(&h)))
            .collect();
        if !layout.contains(&Some(Column::Address)) {
            return Err(StoreError::MissingAddressColumn(self.path.clone()));
        }

        let mut rows = HashMap::new();
        for (index, cells) in sheet_rows.enumerate() {
            let sheet_row = SheetRow {
                layout: &layout,
                cells,
            };
            let Some(address) = sheet_row.text(Column::Address) else {
                tracing::warn!(row = index + 2, "skipping row without address");
                continue;
            };
            let status = sheet_row.status(index + 2);

            // Duplicate addresses: the last loaded row wins.
            if rows
                .insert(address.clone(), columns::decode(&sheet_row, address, status))
                .is_some()
            {
                tracing::warn!(row = index + 2, "duplicate address in workbook, keeping later row");
            }
        }

        tracing::info!(path = %self.path.display(), rows = rows.len(), "loaded workbook");
        Ok(rows)
    }

    fn save(&self, rows: &[ReconciledRow]) -> Result<(), StoreError> {
        let buffer = render_workbook(rows)?;

        let write_err = |source: std::io::Error| StoreError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        // Rename over the target so readers never see a half-written file.
        let staging = self.path.with_extension("xlsx.partial");
        fs::write(&staging, buffer).map_err(write_err)?;
        if let Err(e) = fs::rename(&staging, &self.path) {
            let _ = fs::remove_file(&staging);
            return Err(write_err(e));
        }

        tracing::info!(path = %self.path.display(), rows = rows.len(), "saved workbook");
        Ok(())
    }
}

/// Renders rows, sorted by address, into an in-memory workbook.
pub fn render_workbook(rows: &[ReconciledRow]) -> Result<Vec<u8>, StoreError> {
    let mut sorted: Vec<&ReconciledRow> = rows.iter().collect();
    sorted.sort_by(|a, b| a.address().cmp(b.address()));

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let bold = Format::new().set_bold();
    for (col, column) in Column::ALL.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, column.header(), &bold)?;
    }

    for (i, row) in sorted.iter().enumerate() {
        let r = (i + 1) as u32;
        for (col, column) in Column::ALL.iter().enumerate() {
            match columns::encode(row, *column) {
                CellValue::Empty => {}
                CellValue::Text(value) => {
                    worksheet.write_string(r, col as u16, &value)?;
                }
                CellValue::Number(value) => {
                    worksheet.write_number(r, col as u16, value)?;
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

struct SheetRow<'a> {
    layout: &'a [Option<Column>],
    cells: &'a [Data],
}

impl SheetRow<'_> {
    fn cell(&self, column: Column) -> Option<&Data> {
        // Rightmost wins if a header appears twice.
        self.layout
            .iter()
            .zip(self.cells)
            .filter(|(c, _)| **c == Some(column))
            .map(|(_, cell)| cell)
            .last()
    }

    fn status(&self, sheet_row: usize) -> ListingStatus {
        match self.text(Column::ListingType).map(|s| s.parse::<ListingStatus>()) {
            Some(Ok(status)) => status,
            Some(Err(e)) => {
                tracing::warn!(row = sheet_row, "{e}, treating as Existing");
                ListingStatus::Existing
            }
            None => ListingStatus::Existing,
        }
    }
}

impl RowCells for SheetRow<'_> {
    fn text(&self, column: Column) -> Option<String> {
        self.cell(column).and_then(cell_text)
    }

    fn number(&self, column: Column) -> Option<f64> {
        match self.cell(column)? {
            Data::Float(f) => Some(*f),
            Data::Int(i) => Some(*i as f64),
            Data::String(s) => crate::scraper::parse::parse_price(Some(s.as_str())),
            _ => None,
        }
    }

    fn date(&self, column: Column) -> Option<NaiveDate> {
        match self.cell(column)? {
            Data::String(s) => parse_stored_date(s),
            Data::Empty => None,
            other => other.as_date(),
        }
    }
}

fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::String(s) | Data::DateTimeIso(s) => s.trim().to_string(),
        Data::Float(f) => format_number(*f),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(_) => cell.as_date()?.format(columns::STORED_DATE_FORMAT).to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

// Whole numbers read back as "3", not "3.0".
fn format_number(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}
