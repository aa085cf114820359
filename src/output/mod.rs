//! Output module for simulation results
//!
//! - **Export**: binary per-field archives (one growable array per field,
//!   in write order) and CSV time series for external analysis
//! - **Visualization**: static PNG plots of the slip-velocity history
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use quake_rs::output::export::FieldArchive;
//! use quake_rs::output::visualization::plot_velocity_history;
//!
//! // Binary archive: context fields once, time series appended per step
//! let mut archive = FieldArchive::create("out/")?;
//! archive.write_context(model.fault())?;
//! archive.write_report(&mut model, &report)?;
//!
//! // Velocity history plot
//! plot_velocity_history(&times, &v_max, "vmax.png", None)?;
//! ```
//!
//! # Design Philosophy
//!
//! The export layer separates concerns:
//! - **Binary archives**: for post-processing tooling (one file per
//!   field, append order = time order)
//! - **CSV**: for spreadsheets and quick scripting
//! - **Visualization**: for human interpretation

pub mod export;
pub mod visualization;

pub use export::{CsvConfig, FieldArchive, FieldHistory};
pub use visualization::{plot_velocity_history, PlotConfig};
