//! Persist export rows beside the input file, as xlsx or CSV depending on
//! the output file extension.

use crate::error::SheetError;
use crate::record::{ExportRow, COLUMNS};
use rust_xlsxwriter::Workbook;
use std::path::{Path, PathBuf};
use tracing::info;

/// Export file formats, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "xlsx" => Some(ExportFormat::Xlsx),
            "csv" => Some(ExportFormat::Csv),
            _ => None,
        }
    }
}

/// `<input dir>/<output_name>`.
pub fn output_path(input: &Path, output_name: &str) -> PathBuf {
    input
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(output_name)
}

/// Write the header and every row. Returns the number of data rows.
pub fn write_rows(path: &Path, rows: &[ExportRow]) -> Result<usize, SheetError> {
    match ExportFormat::from_path(path) {
        Some(ExportFormat::Xlsx) => write_xlsx(path, rows)?,
        Some(ExportFormat::Csv) => write_csv(path, rows)?,
        None => {
            let ext = path
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_default();
            return Err(SheetError::UnsupportedExport(ext));
        }
    }

    info!("wrote {} rows to {}", rows.len(), path.display());
    Ok(rows.len())
}

fn write_xlsx(path: &Path, rows: &[ExportRow]) -> Result<(), SheetError> {
    let xlsx_err = |source| SheetError::Xlsx {
        path: path.to_path_buf(),
        source,
    };
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, name) in COLUMNS.iter().enumerate() {
        sheet
            .write_string(0, col as u16, name.as_str())
            .map_err(xlsx_err)?;
    }
    for (idx, row) in rows.iter().enumerate() {
        let xl_row = (idx + 1) as u32;
        for (col, value) in row.to_record().into_iter().enumerate() {
            // Empty slots stay blank cells.
            if value.is_empty() {
                continue;
            }
            sheet
                .write_string(xl_row, col as u16, value)
                .map_err(xlsx_err)?;
        }
    }
    workbook.save(path).map_err(xlsx_err)
}

fn write_csv(path: &Path, rows: &[ExportRow]) -> Result<(), SheetError> {
    let csv_err = |source| SheetError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    writer.write_record(COLUMNS.iter()).map_err(csv_err)?;
    for row in rows {
        writer.write_record(row.to_record()).map_err(csv_err)?;
    }
    writer.flush().map_err(|source| SheetError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::normalize::normalize;
    use crate::record::{DateCell, RawResultEntry, COLUMN_COUNT};
    use calamine::{open_workbook_auto, Data, Reader};

    fn sample_rows() -> Vec<ExportRow> {
        vec![
            normalize(
                &DateCell::Text("2024-03-07".into()),
                "Fast, Eddie",
                &[RawResultEntry {
                    name: "first".into(),
                    ..RawResultEntry::default()
                }],
            ),
            normalize(&DateCell::Text("2024-03-08".into()), "Empty", &[]),
        ]
    }

    #[test]
    fn test_output_path_beside_input() {
        assert_eq!(
            output_path(Path::new("/data/in/races.xlsx"), "out.csv"),
            PathBuf::from("/data/in/out.csv")
        );
        assert_eq!(output_path(Path::new("races.xlsx"), "out.csv"), PathBuf::from("out.csv"));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ExportFormat::from_path(Path::new("a.XLSX")), Some(ExportFormat::Xlsx));
        assert_eq!(ExportFormat::from_path(Path::new("a.csv")), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::from_path(Path::new("a.ods")), None);
        assert_eq!(ExportFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_xlsx_has_fixed_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        assert_eq!(write_rows(&path, &sample_rows()).unwrap(), 2);

        let mut workbook = open_workbook_auto(&path).unwrap();
        let range = workbook.worksheet_range_at(0).unwrap().unwrap();
        assert_eq!(range.width(), COLUMN_COUNT);
        assert_eq!(range.height(), 3);
        assert_eq!(range.get((0, 2)), Some(&Data::String("Dog1".into())));
        assert_eq!(range.get((0, 57)), Some(&Data::String("SP8".into())));
        assert_eq!(range.get((1, 0)), Some(&Data::String("2024-03-07".into())));
        assert_eq!(range.get((1, 1)), Some(&Data::String("Fast, Eddie".into())));
        assert_eq!(range.get((1, 2)), Some(&Data::String("FIRST".into())));
        assert_eq!(range.get((2, 2)), Some(&Data::Empty));
    }

    #[test]
    fn test_csv_has_fixed_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        assert_eq!(write_rows(&path, &sample_rows()).unwrap(), 2);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let header = reader.headers().unwrap().clone();
        assert_eq!(header.len(), COLUMN_COUNT);
        assert_eq!(&header[2], "Dog1");

        let records: Vec<_> = reader.records().map(Result::unwrap).collect();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.len() == COLUMN_COUNT));
        assert_eq!(&records[0][1], "Fast, Eddie");
        assert_eq!(&records[0][2], "FIRST");
        assert_eq!(&records[1][2], "");
    }

    #[test]
    fn test_unwritable_or_unknown_target_is_error() {
        let rows = sample_rows();
        assert!(write_rows(Path::new("/nonexistent-dir/out.csv"), &rows).is_err());
        assert!(write_rows(Path::new("/nonexistent-dir/out.xlsx"), &rows).is_err());
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            write_rows(&dir.path().join("out.txt"), &rows),
            Err(SheetError::UnsupportedExport(ext)) if ext == "txt"
        ));
    }
}
