//! Combination ranking — cumulative top-k pools from the ranked pair table.
//!
//! Row k answers "what if I only traded my top-k-ranked pairs": the closed
//! positions of the first k pairs are pooled and a fresh metric bundle is
//! computed for the pool. Rows are monotonically non-decreasing in pair
//! count, but not in any profit metric.

use crate::scoring::RankedTable;
use chrono::NaiveDate;
use pairlab_core::metrics::MetricError;
use pairlab_core::{MetricBundle, MetricOptions, PositionStore};

/// Metrics for the pooled positions of the top-k ranked pairs.
///
/// `capital_per_trade` starts as the capital observed on the first pooled
/// position (a representative sample, not an average) and becomes the
/// implied per-trade capital once `normalize_capital` has run;
/// `scaling_factor` is 1.0 until then.
#[derive(Debug, Clone)]
pub struct CombinationRow {
    pub pair_count: usize,
    pub capital_per_trade: f64,
    pub scaling_factor: f64,
    pub bundle: MetricBundle,
}

/// The pair order combination rows are built over: ranked pairs minus the
/// exclusions, truncated to `max_rows`.
pub fn selected_pairs(ranked: &RankedTable, excluded: &[String], max_rows: usize) -> Vec<String> {
    ranked
        .iter()
        .map(|row| row.pair.clone())
        .filter(|pair| !excluded.iter().any(|e| e == pair))
        .take(max_rows)
        .collect()
}

/// Build one combination row per prefix length of `selected`.
///
/// A prefix whose pool has no closed positions is skipped with a warning;
/// `pair_count` keeps its k value so surviving rows still line up with the
/// ranked list.
pub fn build_combination_rows(
    store: &PositionStore,
    selected: &[String],
    month_span: &[NaiveDate],
    opts: &MetricOptions,
) -> Vec<CombinationRow> {
    let mut rows = Vec::with_capacity(selected.len());

    for k in 1..=selected.len() {
        println!("FinalReport: pair count {k}");
        let pool = store.closed_for_pairs(&selected[..k]);
        match MetricBundle::compute(&pool, month_span, opts) {
            Ok(bundle) => rows.push(CombinationRow {
                pair_count: k,
                capital_per_trade: pool[0].capital_used,
                scaling_factor: 1.0,
                bundle,
            }),
            Err(MetricError::EmptySubset) => {
                eprintln!("warning: top-{k} combination has no closed positions, skipping row");
            }
        }
    }

    rows
}
