//! Presentation of staged 2SLS results
//!
//! - [`summarize`] turns per-stage results into a [`ResultTable`] that prints
//!   as aligned text and exports to CSV
//! - [`ChartData`] is the chart model: one error bar (estimate ± standard
//!   error) per stage, legend labels, title and variable annotation
//! - [`ChartRenderer`] implementations draw that model; [`PlottersRenderer`]
//!   writes a PNG and [`NullRenderer`] draws nothing
//!
//! Nothing here mutates the results it is given.

mod chart;
mod error;
mod render;
mod table;

pub use chart::{
    annotation_text, chart_title, format_controls, legend_label, ChartData, ErrorBarPoint,
    X_LABEL, Y_LABEL,
};
pub use error::{Error, Result};
pub use render::{
    ensure_plot_dir, plot_dir, render_if_requested, ChartRenderer, NullRenderer, PlottersRenderer,
    DEFAULT_CHART_FILENAME,
};
pub use table::{summarize, ResultTable, TableRow};
