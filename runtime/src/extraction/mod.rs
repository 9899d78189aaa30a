//! Pure transforms and row scraping for the results site.
//!
//! `slug` derives entity URLs, `result_table` reads result rows, and
//! `normalize` shapes them into the fixed-width export row.

pub mod normalize;
pub mod result_table;
pub mod slug;
