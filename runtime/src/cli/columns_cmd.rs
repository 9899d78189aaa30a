//! `hound-harvest columns`: print the export header.

use crate::cli::output;
use crate::record::COLUMNS;

pub fn run() {
    if output::is_json() {
        output::print_json(&serde_json::json!(*COLUMNS));
        return;
    }
    for (i, name) in COLUMNS.iter().enumerate() {
        println!("{:>2}  {name}", i + 1);
    }
}
