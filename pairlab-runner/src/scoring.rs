//! Scoring engine — normalized, weighted composite score per pair.
//!
//! Raw metric columns have wildly different scales, so each weighted column
//! is min-max normalized across the pair table before the weight is applied.
//! Negative weights mark columns where a lower raw value is better
//! (drawdown, loss streaks). After summing, the score is decayed by
//! `decay_factor ^ missing_months` to penalize pairs with activity gaps.

use pairlab_core::MetricBundle;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Metric column the composite score can draw from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ScoreColumn {
    Performance,
    Winrate,
    NetProfit,
    GrossProfit,
    GrossLoss,
    LargestProfit,
    AverageProfit,
    MaxDrawdown,
    AverageWinStreak,
    MaxWinStreak,
    AverageLossStreak,
    MaxLossStreak,
}

impl ScoreColumn {
    /// Extract the raw column value from a bundle.
    pub fn extract(&self, bundle: &MetricBundle) -> f64 {
        match self {
            Self::Performance => bundle.performance,
            Self::Winrate => bundle.winrate,
            Self::NetProfit => bundle.net_profit,
            Self::GrossProfit => bundle.gross_profit,
            Self::GrossLoss => bundle.gross_loss,
            Self::LargestProfit => bundle.largest_profit,
            Self::AverageProfit => bundle.average_profit,
            Self::MaxDrawdown => bundle.max_drawdown,
            Self::AverageWinStreak => bundle.average_win_streak,
            Self::MaxWinStreak => bundle.max_win_streak as f64,
            Self::AverageLossStreak => bundle.average_loss_streak,
            Self::MaxLossStreak => bundle.max_loss_streak as f64,
        }
    }
}

/// Weight per metric column. Higher absolute weight, more impact;
/// negative weight, lower raw value is better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreWeights(pub BTreeMap<ScoreColumn, f64>);

impl Default for ScoreWeights {
    fn default() -> Self {
        Self(BTreeMap::from([
            (ScoreColumn::Performance, 0.3),
            (ScoreColumn::Winrate, 0.2),
            (ScoreColumn::NetProfit, 0.4),
            (ScoreColumn::GrossProfit, 0.1),
            (ScoreColumn::GrossLoss, 0.1),
            (ScoreColumn::LargestProfit, 0.05),
            (ScoreColumn::AverageProfit, 0.05),
            (ScoreColumn::MaxDrawdown, -0.1),
            (ScoreColumn::AverageWinStreak, 0.05),
            (ScoreColumn::MaxWinStreak, 0.05),
            (ScoreColumn::AverageLossStreak, -0.025),
            (ScoreColumn::MaxLossStreak, -0.025),
        ]))
    }
}

/// One pair with its computed metric bundle, pre-scoring.
#[derive(Debug, Clone)]
pub struct PairMetrics {
    pub pair: String,
    pub bundle: MetricBundle,
}

/// One row of the ranked base table.
#[derive(Debug, Clone)]
pub struct RankedPair {
    pub pair: String,
    pub bundle: MetricBundle,
    pub score: f64,
}

/// Pairs sorted by score descending; the input consumed by combination ranking.
pub type RankedTable = Vec<RankedPair>;

/// Score and rank a pair table.
///
/// Degenerate columns (max == min, or no finite values) contribute zero for
/// every row instead of dividing by zero, and a non-finite cell (undefined
/// performance) contributes zero for its row. Ties keep input order — the
/// sort is stable.
pub fn score_table(
    pairs: Vec<PairMetrics>,
    weights: &ScoreWeights,
    decay_factor: f64,
) -> RankedTable {
    let mut scores = vec![0.0_f64; pairs.len()];

    for (column, weight) in &weights.0 {
        let values: Vec<f64> = pairs.iter().map(|p| column.extract(&p.bundle)).collect();
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in values.iter().filter(|v| v.is_finite()) {
            min = min.min(*v);
            max = max.max(*v);
        }
        if !(max > min) {
            continue;
        }
        for (score, value) in scores.iter_mut().zip(&values) {
            if value.is_finite() {
                *score += (value - min) / (max - min) * weight;
            }
        }
    }

    let mut ranked: RankedTable = pairs
        .into_iter()
        .zip(scores)
        .map(|(p, score)| RankedPair {
            score: score * decay_factor.powi(p.bundle.missing_months as i32),
            pair: p.pair,
            bundle: p.bundle,
        })
        .collect();

    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    ranked
}
