//! Run diagnostics written alongside the export.

pub mod ledger;
