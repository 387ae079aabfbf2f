//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - report table exports (CSV) (`export`)
//! - run summary (JSON) (`summary`)

pub mod export;
pub mod ingest;
pub mod summary;

pub use export::*;
pub use ingest::*;
pub use summary::*;
