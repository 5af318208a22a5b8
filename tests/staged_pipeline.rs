//! End-to-end run: processed CSV on disk to per-stage table and chart

use approx::assert_abs_diff_eq;
use polars::prelude::*;
use staged_iv::polars::test_data::cup_fixtures;
use staged_iv::polars::{
    processed_data_path, results_to_dataframe, write_processed_csv, RESULT_COLUMNS, STAGE_COLUMN,
};
use staged_iv::prelude::*;
use staged_iv::viz::{ChartRenderer, ErrorBarPoint};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn cup_spec() -> VariableSpec {
    VariableSpec::new(
        "next_team_points",
        "team_win",
        ["opponent_league_rank_prev", "opponent_division"],
    )
    .with_controls(["team_size"])
    .with_display(DisplayMode::SUMMARY | DisplayMode::PLOT)
}

/// Captures the chart instead of drawing it
#[derive(Default)]
struct Capture {
    points: RefCell<Vec<ErrorBarPoint>>,
    path: RefCell<Option<PathBuf>>,
}

impl ChartRenderer for Capture {
    fn render(&self, chart: &ChartData, path: &Path) -> staged_iv::viz::Result<()> {
        *self.points.borrow_mut() = chart.points.clone();
        *self.path.borrow_mut() = Some(path.to_path_buf());
        Ok(())
    }
}

#[test]
fn test_csv_to_table_and_chart() {
    init_tracing();
    let root = tempfile::tempdir().unwrap();
    let spec = cup_spec();
    write_processed_csv(
        &cup_fixtures(&[1, 2, 3], 150, 11),
        &processed_data_path(root.path(), "combined", "combined_cup"),
    )
    .unwrap();

    let provider = CsvDatasetProvider::for_cup(root.path(), "combined", "combined_cup", &spec)
        .with_imputation(Imputation::opponent_rank());
    let analysis = StagedAnalyzer::new().run_provider(&provider, &spec).unwrap();

    assert_eq!(analysis.stages(), vec![1, 2, 3]);
    assert!(analysis.skipped.is_empty());
    assert_eq!(analysis.reports.len(), 3);
    for result in &analysis.results {
        assert_eq!(result.n_obs, 150);
        assert!((result.estimate - 2.0).abs() < 1.0, "stage {}: {}", result.stage, result.estimate);
        assert!(result.std_error > 0.0);
        assert!(result.f_stat.is_finite());
        assert!((0.0..=1.0).contains(&result.p_value));
    }

    // Text and CSV table
    let table = summarize(&analysis.results);
    assert_eq!(table.len(), 3);
    let mut buffer = Vec::new();
    table.write_csv(&mut buffer).unwrap();
    let csv = String::from_utf8(buffer).unwrap();
    assert_eq!(csv.lines().count(), 4);
    assert!(csv.starts_with("stage,2sls_iv,"));

    // DataFrame view agrees with the records
    let df = results_to_dataframe(&analysis.results).unwrap();
    let names: Vec<&str> = df.get_column_names().iter().map(|name| name.as_str()).collect();
    assert_eq!(names, RESULT_COLUMNS.to_vec());
    let estimates = df.column("2sls_iv").unwrap().f64().unwrap();
    for (i, result) in analysis.results.iter().enumerate() {
        assert_abs_diff_eq!(estimates.get(i).unwrap(), result.estimate, epsilon = 1e-12);
    }

    // Chart
    let capture = Capture::default();
    let dir = staged_iv::viz::plot_dir(root.path(), "combined");
    let written = render_if_requested(
        &analysis.results,
        &spec,
        &dir,
        staged_iv::viz::DEFAULT_CHART_FILENAME,
        &capture,
    )
    .unwrap();
    assert_eq!(written.as_deref(), capture.path.borrow().as_deref());
    let points = capture.points.borrow();
    assert_eq!(points.len(), 3);
    assert!(points[0].label.starts_with("Round 1: p-value: "));
    assert_abs_diff_eq!(
        points[2].upper - points[2].lower,
        2.0 * analysis.results[2].std_error,
        epsilon = 1e-12
    );
}

#[test]
fn test_missing_instrument_without_imputation_is_rejected() {
    init_tracing();
    let root = tempfile::tempdir().unwrap();
    let spec = cup_spec();
    write_processed_csv(
        &cup_fixtures(&[1, 2], 60, 5),
        &processed_data_path(root.path(), "england", "fa_cup"),
    )
    .unwrap();

    // Null league ranks reach the estimator as missing values
    let provider = CsvDatasetProvider::for_cup(root.path(), "england", "fa_cup", &spec);
    let err = StagedAnalyzer::new().run_provider(&provider, &spec).unwrap_err();
    assert!(matches!(
        err.root(),
        staged_iv::core::Error::MissingValues { .. }
    ));
    assert!(err.stage().is_some());
}

#[test]
fn test_dataframe_extension_matches_provider() {
    init_tracing();
    let root = tempfile::tempdir().unwrap();
    let spec = cup_spec().with_display(DisplayMode::empty());
    let fixtures = cup_fixtures(&[1, 2], 120, 23);
    let path = processed_data_path(root.path(), "combined", "combined_cup");
    write_processed_csv(&fixtures, &path).unwrap();

    // Rank is instrument-only, so dropping its nulls keeps the design complete
    let provider = CsvDatasetProvider::for_cup(root.path(), "combined", "combined_cup", &spec)
        .dropping_missing(["opponent_league_rank_prev"]);
    let from_csv = StagedAnalyzer::new().run_provider(&provider, &spec).unwrap();

    let cleaned = fixtures
        .clone()
        .lazy()
        .filter(col("opponent_league_rank_prev").is_not_null())
        .collect()
        .unwrap();
    let from_frame = cleaned
        .staged_2sls(&spec, STAGE_COLUMN, &StagedAnalyzer::new())
        .unwrap();

    assert_eq!(from_csv.results.len(), from_frame.results.len());
    for (a, b) in from_csv.results.iter().zip(&from_frame.results) {
        assert_eq!(a.n_obs, b.n_obs);
        assert_abs_diff_eq!(a.estimate, b.estimate, epsilon = 1e-6);
        assert_abs_diff_eq!(a.std_error, b.std_error, epsilon = 1e-6);
    }
}
