//! Result visualization
//!
//! Static plot generation with the `plotters` library. The workhorse is
//! [`plot_velocity_history`]: the maximum slip velocity over time on a
//! log axis, the standard at-a-glance picture of an earthquake cycle
//! (interseismic creep at the plate rate, seismic spikes meters per
//! second fast).

mod history;

pub use history::{plot_series, plot_velocity_history, PlotConfig};
