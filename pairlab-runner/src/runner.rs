//! Report pipeline orchestration.
//!
//! `run_report` is the single entry point tying the stages together:
//! load, per-pair metrics, scoring, combination ranking, capital rescale,
//! monthly partitioning. Artifact writing is the caller's concern (see
//! [`crate::export`]), so library users can post-process a [`ReportSet`]
//! without touching the filesystem.

use crate::config::{ConfigError, ReportConfig};
use crate::loader::{load_positions, LoadError};
use crate::monthly::{build_monthly_report, MonthlyReport};
use crate::ranking::{build_combination_rows, selected_pairs, CombinationRow};
use crate::scaling::{normalize_capital, ScaleError};
use crate::scoring::{score_table, PairMetrics, RankedTable};
use pairlab_core::metrics::MetricError;
use pairlab_core::{MetricBundle, PositionStore};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Data(#[from] LoadError),

    #[error(transparent)]
    Scale(#[from] ScaleError),

    #[error("positions file contains no closed positions to analyze")]
    NoClosedPositions,
}

/// Everything a completed run produces, pre-serialization.
#[derive(Debug)]
pub struct ReportSet {
    /// Per-pair metrics ranked by composite score (the base report).
    pub base: RankedTable,
    /// Cumulative top-k combination rows, capital-normalized.
    pub combinations: Vec<CombinationRow>,
    /// Month × combination profit matrix.
    pub monthly: MonthlyReport,
}

/// Run the full pipeline from a config: load the positions file, then
/// analyze.
pub fn run_report(config: &ReportConfig) -> Result<ReportSet, RunError> {
    config.validate()?;
    let store = load_positions(&config.positions_file, config.position_type.as_deref())?;
    run_report_from_store(&store, config)
}

/// Run the analysis stages over an already-loaded store.
pub fn run_report_from_store(
    store: &PositionStore,
    config: &ReportConfig,
) -> Result<ReportSet, RunError> {
    if store.closed_count() == 0 {
        return Err(RunError::NoClosedPositions);
    }

    let month_span = store.month_span();
    println!(
        "Analyzing {} closed positions across {} months",
        store.closed_count(),
        month_span.len()
    );

    let mut pairs = Vec::new();
    for pair in store.pair_names() {
        let subset = store.closed_for_pair(&pair);
        match MetricBundle::compute(&subset, &month_span, &config.metrics) {
            Ok(bundle) => pairs.push(PairMetrics { pair, bundle }),
            Err(MetricError::EmptySubset) => {
                eprintln!("warning: pair {pair} has no closed positions, skipping");
            }
        }
    }

    let base = score_table(pairs, &config.score_weights, config.decay_factor);
    println!("BaseReport: ranked {} pairs", base.len());

    let selected = selected_pairs(&base, &config.excluded_pairs, config.max_combination_rows);
    let mut combinations =
        build_combination_rows(store, &selected, &month_span, &config.metrics);
    normalize_capital(&mut combinations, config.capital_per_trade)?;

    let monthly = build_monthly_report(store, &selected, &combinations, &month_span);

    Ok(ReportSet {
        base,
        combinations,
        monthly,
    })
}
