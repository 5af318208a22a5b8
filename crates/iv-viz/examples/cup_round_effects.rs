//! Per-round causal effect of advancing in the combined domestic cups
//!
//! Usage: `cargo run -p iv-viz --example cup_round_effects -- <project-root> [country] [cup]`
//!
//! Reads `<root>/data/process/<country>/<cup>_processed.csv`, fills missing
//! opponent ranks of non-league sides, drops fixtures without a travel
//! distance and writes the chart to `<root>/plots/<country>/Causal_Effect`.

use iv_core::{DisplayMode, Imputation, VariableSpec};
use iv_estimate::{FailurePolicy, StagedAnalyzer};
use iv_polars::{load_processed_csv, processed_data_path, CsvDatasetProvider, IvAnalysisExt};
use iv_viz::{ensure_plot_dir, render_if_requested, summarize, PlottersRenderer, DEFAULT_CHART_FILENAME};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let root = args.next().unwrap_or_else(|| ".".to_string());
    let country = args.next().unwrap_or_else(|| "combined".to_string());
    let cup = args.next().unwrap_or_else(|| "combined_cup".to_string());

    let spec = VariableSpec::new(
        "next_team_points",
        "team_win",
        ["opponent_league_rank_prev", "opponent_division"],
    )
    .with_controls([
        "team_rank_prev",
        "team_size",
        "foreigners",
        "mean_age",
        "mean_value",
        "total_value",
        "distance",
        "extra_time",
        "next_fixture_days",
    ])
    .with_display(DisplayMode::SUMMARY | DisplayMode::PLOT);

    let raw = load_processed_csv(processed_data_path(&root, &country, &cup))?;
    println!("NaN counts for all variables used in the models:");
    println!("{}", raw.spec_nan_counts(&spec)?);

    let provider = CsvDatasetProvider::for_cup(&root, &country, &cup, &spec)
        .with_imputation(Imputation::opponent_rank())
        .dropping_missing(["distance"]);

    let analysis = StagedAnalyzer::new()
        .with_policy(FailurePolicy::Skip)
        .run_provider(&provider, &spec)?;

    println!("{}", summarize(&analysis.results));
    for skipped in &analysis.skipped {
        println!("Round {} skipped: {}", skipped.stage, skipped.reason);
    }
    for warning in &analysis.warnings {
        println!("{warning}");
    }

    let dir = ensure_plot_dir(&root, &country)?;
    let table_path = dir.join("causal_effect_by_stage.csv");
    summarize(&analysis.results).save_csv(&table_path)?;
    println!("Table written to {}", table_path.display());

    if let Some(path) = render_if_requested(
        &analysis.results,
        &spec,
        &dir,
        DEFAULT_CHART_FILENAME,
        &PlottersRenderer::default(),
    )? {
        println!("Chart written to {}", path.display());
    }
    Ok(())
}
