//! Command-line front end.

pub mod columns_cmd;
pub mod doctor;
pub mod output;
pub mod run_cmd;
