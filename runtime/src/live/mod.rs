//! Per-worker browser sessions and the outcome of each item they process.

pub mod outcome;
pub mod session;
