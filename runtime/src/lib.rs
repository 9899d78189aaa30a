//! Parallel extraction of greyhound race results into a fixed-width export.
//!
//! An input sheet lists `(date, name)` pairs. Items are partitioned across
//! workers, each driving its own browser context through [`live::session`],
//! and the per-item [`record::ExportRow`]s are reassembled in input order by
//! [`pool::coordinator`] before [`batch::run_batch`] writes them out.

pub mod audit;
pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod extraction;
pub mod live;
pub mod pool;
pub mod record;
pub mod renderer;
pub mod sheet;

pub use batch::{run_batch, BatchOutput};
pub use config::ScrapeConfig;
pub use error::{BatchError, SheetError};
pub use record::{ExportRow, InputItem, COLUMNS, COLUMN_COUNT};
