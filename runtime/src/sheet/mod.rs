//! Spreadsheet input and export.

pub mod reader;
pub mod writer;
