//! Static history plots
//!
//! PNG output via `plotters`. Velocity spans many orders of magnitude
//! over a cycle, so [`plot_velocity_history`] plots `log10(V)`;
//! [`plot_series`] draws any scalar series on a linear axis.

use plotters::prelude::*;
use std::error::Error;

// =================================================================================================
// Configuration
// =================================================================================================

/// Configuration for customizing plots
#[derive(Clone)]
pub struct PlotConfig {
    /// Image width in pixels (default: 1024)
    pub width: u32,
    /// Image height in pixels (default: 768)
    pub height: u32,
    /// Plot title
    pub title: String,
    /// X-axis label
    pub xlabel: String,
    /// Y-axis label
    pub ylabel: String,
    /// Line color (default: RED)
    pub line_color: RGBColor,
    /// Background color (default: WHITE)
    pub background: RGBColor,
    /// Line thickness in pixels (default: 2)
    pub line_width: u32,
    /// Show grid lines (default: true)
    pub show_grid: bool,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
            title: "Slip velocity history".to_string(),
            xlabel: "Time (s)".to_string(),
            ylabel: "log10 max slip velocity (m/s)".to_string(),
            line_color: RED,
            background: WHITE,
            line_width: 2,
            show_grid: true,
        }
    }
}

// =================================================================================================
// Plots
// =================================================================================================

/// Plot a scalar series on linear axes
pub fn plot_series(
    time: &[f64],
    values: &[f64],
    path: &str,
    config: Option<&PlotConfig>,
) -> Result<(), Box<dyn Error>> {
    let default_config = PlotConfig::default();
    let config = config.unwrap_or(&default_config);

    if time.is_empty() || time.len() != values.len() {
        return Err(format!(
            "cannot plot series with lengths {} and {}",
            time.len(),
            values.len()
        )
        .into());
    }

    let (x_min, x_max) = bounds(time);
    let (y_min, y_max) = padded_bounds(values);

    let root = BitMapBackend::new(path, (config.width, config.height)).into_drawing_area();
    root.fill(&config.background)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&config.title, ("sans-serif", 30))
        .margin(20)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    let mut mesh = chart.configure_mesh();
    mesh.x_desc(config.xlabel.clone()).y_desc(config.ylabel.clone());
    if !config.show_grid {
        mesh.disable_mesh();
    }
    mesh.draw()?;

    chart.draw_series(LineSeries::new(
        time.iter().zip(values.iter()).map(|(t, v)| (*t, *v)),
        config.line_color.stroke_width(config.line_width),
    ))?;

    root.present()?;
    Ok(())
}

/// Plot the maximum slip velocity over time on a log10 axis
///
/// Velocities are floored at 1e-30 m/s so locked intervals do not
/// produce minus infinity.
pub fn plot_velocity_history(
    time: &[f64],
    v_max: &[f64],
    path: &str,
    config: Option<&PlotConfig>,
) -> Result<(), Box<dyn Error>> {
    let log_v: Vec<f64> = v_max.iter().map(|v| v.max(1e-30).log10()).collect();
    plot_series(time, &log_v, path, config)
}

fn bounds(values: &[f64]) -> (f64, f64) {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        (min - 0.5, max + 0.5)
    } else {
        (min, max)
    }
}

fn padded_bounds(values: &[f64]) -> (f64, f64) {
    let (min, max) = bounds(values);
    let pad = 0.05 * (max - min);
    (min - pad, max + pad)
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn temp_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("quake_rs_plot_{}_{}.png", tag, std::process::id()))
    }

    #[test]
    fn test_velocity_history_plot_is_written() {
        let path = temp_path("vmax");
        let time: Vec<f64> = (0..100).map(|i| i as f64 * 1e5).collect();
        let v_max: Vec<f64> = (0..100)
            .map(|i| if i == 50 { 1.0 } else { 1e-9 })
            .collect();

        plot_velocity_history(&time, &v_max, path.to_str().unwrap(), None).unwrap();
        let size = fs::metadata(&path).unwrap().len();
        assert!(size > 0);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_zero_velocity_is_floored() {
        let path = temp_path("floor");
        let time = vec![0.0, 1.0, 2.0];
        let v_max = vec![0.0, 1e-9, 0.0];

        // must not fail on log10(0)
        plot_velocity_history(&time, &v_max, path.to_str().unwrap(), None).unwrap();
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let path = temp_path("mismatch");
        assert!(plot_series(&[0.0, 1.0], &[1.0], path.to_str().unwrap(), None).is_err());
        assert!(plot_series(&[], &[], path.to_str().unwrap(), None).is_err());
    }
}
