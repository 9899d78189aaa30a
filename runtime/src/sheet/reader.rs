//! Load input items from a spreadsheet or CSV file.
//!
//! Column 0 is the event date, column 1 the entity name. Row 0 is data
//! unless the caller says the sheet has a header. Fully blank rows are
//! ignored; any other row becomes an item, even without a name.

use crate::error::SheetError;
use crate::record::{DateCell, InputItem};
use calamine::{open_workbook_auto, Data, DataType, Reader};
use chrono::{Days, NaiveDate, NaiveTime};
use std::path::Path;
use tracing::{info, warn};

const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Read every item from `path`, dispatching on the file extension.
pub fn load_items(path: &Path, has_header: bool) -> Result<Vec<InputItem>, SheetError> {
    if !path.exists() {
        return Err(SheetError::Missing(path.to_path_buf()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let items = if WORKBOOK_EXTENSIONS.contains(&ext.as_str()) {
        load_workbook(path, has_header)?
    } else if ext == "csv" {
        load_csv(path, has_header)?
    } else {
        return Err(SheetError::UnsupportedFormat(ext));
    };

    info!("loaded {} items from {}", items.len(), path.display());
    Ok(items)
}

fn load_workbook(path: &Path, has_header: bool) -> Result<Vec<InputItem>, SheetError> {
    let workbook_err = |source| SheetError::Workbook {
        path: path.to_path_buf(),
        source,
    };
    let mut workbook = open_workbook_auto(path).map_err(workbook_err)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SheetError::NoWorksheet(path.to_path_buf()))?
        .map_err(workbook_err)?;

    let skip = usize::from(has_header);
    let mut items = Vec::new();
    for (row_idx, row) in range.rows().enumerate().skip(skip) {
        let date = row.first().map(date_cell).unwrap_or(DateCell::Text(String::new()));
        let name = row.get(1).map(|c| c.to_string()).unwrap_or_default();
        push_item(&mut items, row_idx, date, name);
    }
    Ok(items)
}

fn load_csv(path: &Path, has_header: bool) -> Result<Vec<InputItem>, SheetError> {
    let csv_err = |source| SheetError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(has_header)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_err)?;

    let offset = usize::from(has_header);
    let mut items = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(csv_err)?;
        let date = DateCell::Text(record.get(0).unwrap_or_default().to_string());
        let name = record.get(1).unwrap_or_default().to_string();
        push_item(&mut items, idx + offset, date, name);
    }
    Ok(items)
}

/// Keeps every row with any content; only fully blank rows are dropped.
fn push_item(items: &mut Vec<InputItem>, row: usize, date: DateCell, name: String) {
    let blank_date = matches!(&date, DateCell::Text(s) if s.trim().is_empty());
    if name.trim().is_empty() {
        if blank_date {
            return;
        }
        warn!("row {row}: no name, will export an empty row");
    }
    items.push(InputItem::new(row, date, name));
}

/// Convert a workbook cell into a date cell, keeping typed dates typed.
pub fn date_cell(cell: &Data) -> DateCell {
    match cell {
        Data::DateTime(_) | Data::DateTimeIso(_) => match cell.as_datetime() {
            Some(dt) if dt.time() == NaiveTime::MIN => DateCell::Date(dt.date()),
            Some(dt) => DateCell::DateTime(dt),
            None => DateCell::Text(cell.to_string()),
        },
        Data::Float(f) => serial_date(*f).unwrap_or_else(|| DateCell::Text(cell.to_string())),
        Data::Int(i) => serial_date(*i as f64).unwrap_or_else(|| DateCell::Text(cell.to_string())),
        Data::Empty => DateCell::Text(String::new()),
        other => DateCell::Text(other.to_string()),
    }
}

/// Largest serial Excel accepts (9999-12-31).
const MAX_SERIAL: f64 = 2_958_465.0;

/// An unformatted numeric cell read as a 1900-system serial date.
fn serial_date(serial: f64) -> Option<DateCell> {
    if !(1.0..=MAX_SERIAL).contains(&serial) || serial.fract() != 0.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch
        .checked_add_days(Days::new(serial as u64))
        .map(DateCell::Date)
}
