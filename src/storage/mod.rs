//! Persisted checkpoint state for the pipeline stages
//!
//! All handoff between stages goes through keyed JSON files; no stage reads
//! another's in-memory state. Each file is owned exclusively by the stage
//! that writes it.

pub mod store;

pub use store::{append_records, read_records, write_records, JobStore};
