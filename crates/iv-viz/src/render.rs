//! Chart output
//!
//! Renderers receive a finished [`ChartData`] and a target path. The
//! [`NullRenderer`] lets callers run the full pipeline without producing
//! files.

use crate::{ChartData, Error, Result};
use iv_core::VariableSpec;
use iv_estimate::EstimationResult;
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name used when the caller does not choose one
pub const DEFAULT_CHART_FILENAME: &str = "causal_effect_by_stage.png";

/// Draws a causal-effect chart to a file
pub trait ChartRenderer {
    fn render(&self, chart: &ChartData, path: &Path) -> Result<()>;

    /// Whether this renderer actually produces output
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Renderer that draws nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl ChartRenderer for NullRenderer {
    fn render(&self, _chart: &ChartData, _path: &Path) -> Result<()> {
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

/// PNG renderer backed by plotters' bitmap backend
#[derive(Debug, Clone, Copy)]
pub struct PlottersRenderer {
    pub width: u32,
    pub height: u32,
}

impl Default for PlottersRenderer {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 800,
        }
    }
}

impl PlottersRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl ChartRenderer for PlottersRenderer {
    fn render(&self, chart: &ChartData, path: &Path) -> Result<()> {
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(Error::render)?;

        // Plot on top, legend and variable annotation underneath
        let plot_height = self.height * 2 / 3;
        let (plot_area, footer) = root.split_vertically(plot_height);
        let (legend_area, annotation_area) = footer.split_horizontally(self.width * 11 / 20);

        let (x_min, x_max) = chart.x_range();
        let (y_min, y_max) = chart.y_range();
        let mut ctx = ChartBuilder::on(&plot_area)
            .caption(&chart.title, ("sans-serif", 24))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)
            .map_err(Error::render)?;

        ctx.configure_mesh()
            .x_desc(chart.x_label.as_str())
            .y_desc(chart.y_label.as_str())
            .draw()
            .map_err(Error::render)?;

        let text = TextStyle::from(("monospace", 14).into_font()).color(&BLACK);
        for (i, point) in chart.points.iter().enumerate() {
            let color = Palette99::pick(i).to_rgba();
            ctx.draw_series(std::iter::once(ErrorBar::new_vertical(
                point.stage as f64,
                point.lower,
                point.estimate,
                point.upper,
                color.filled(),
                10,
            )))
            .map_err(Error::render)?;
            ctx.draw_series(std::iter::once(Circle::new(
                (point.stage as f64, point.estimate),
                5,
                color.filled(),
            )))
            .map_err(Error::render)?;

            let y = 10 + 20 * i as i32;
            legend_area
                .draw(&Circle::new((20, y + 7), 5, color.filled()))
                .map_err(Error::render)?;
            legend_area
                .draw_text(&point.label, &text, (32, y))
                .map_err(Error::render)?;
        }

        for (i, line) in chart.annotation.lines().enumerate() {
            annotation_area
                .draw_text(line, &text, (10, 10 + 20 * i as i32))
                .map_err(Error::render)?;
        }

        root.present().map_err(Error::render)?;
        debug!("Rendered {} error bar(s) to {}", chart.points.len(), path.display());
        Ok(())
    }
}

/// `<root>/plots/<country>/Causal_Effect`
pub fn plot_dir(root: impl AsRef<Path>, country: &str) -> PathBuf {
    root.as_ref().join("plots").join(country).join("Causal_Effect")
}

/// Create the plot directory if needed and return it
pub fn ensure_plot_dir(root: impl AsRef<Path>, country: &str) -> Result<PathBuf> {
    let dir = plot_dir(root, country);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Draw the causal-effect chart when `spec` asks for a plot
///
/// Returns the written path, or `None` when no plot was requested or the
/// renderer produces no output.
pub fn render_if_requested<R: ChartRenderer + ?Sized>(
    results: &[EstimationResult],
    spec: &VariableSpec,
    dir: &Path,
    filename: &str,
    renderer: &R,
) -> Result<Option<PathBuf>> {
    if !spec.display.wants_plot() || !renderer.is_enabled() {
        return Ok(None);
    }
    if results.is_empty() {
        return Err(iv_core::Error::InsufficientData {
            expected: 1,
            actual: 0,
        }
        .into());
    }

    std::fs::create_dir_all(dir)?;
    let path = dir.join(filename);
    let chart = ChartData::from_results(results, spec);
    renderer.render(&chart, &path)?;
    info!("Saved causal-effect chart to {}", path.display());
    Ok(Some(path))
}
