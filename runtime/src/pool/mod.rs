//! Worker pool: partitioning, per-worker sessions and batch assembly.

pub mod coordinator;
pub mod manager;
pub mod partition;
pub mod worker;
