//! Data export
//!
//! - [`FieldArchive`]: binary per-field persistence (context fields
//!   written once, time-series fields appended per recorded step)
//! - [`FieldHistory`]: in-memory step-by-node matrices built from an
//!   integration report
//! - [`csv`]: CSV export of scalar time series

pub mod csv;
mod fields;
mod history;

pub use csv::{export_series_csv, CsvConfig, CsvMetadata};
pub use fields::FieldArchive;
pub use history::FieldHistory;
