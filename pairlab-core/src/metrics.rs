//! Metric computation — pure functions over a subset of closed positions.
//!
//! Every metric is a pure function: position subset in, scalar out. No
//! dependencies on the store, loader, or report pipeline. Determinism is
//! part of the contract: the same subset always yields a bit-identical
//! [`MetricBundle`].
//!
//! All functions expect the subset in entry-time order (store views
//! guarantee this); streak computation depends on it.

use crate::domain::calendar::{month_contains, month_floor};
use crate::domain::Position;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricError {
    #[error("cannot compute metrics for an empty position subset")]
    EmptySubset,
}

/// Sampling steps for the grid-based metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricOptions {
    /// Equity-curve grid step for drawdown, in minutes.
    pub equity_step_minutes: u32,
    /// Sampling step for concurrent-position counting, in minutes.
    pub concurrency_step_minutes: u32,
}

impl Default for MetricOptions {
    fn default() -> Self {
        Self {
            equity_step_minutes: 15,
            concurrency_step_minutes: 5,
        }
    }
}

/// Aggregate statistics for one position subset (a single pair, or the
/// pooled top-k pairs of a combination row).
///
/// `performance` is NaN when every monthly sum is exactly zero — the ratio
/// has no defined denominator. Consumers treat non-finite cells as
/// "no signal" rather than propagating them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricBundle {
    pub position_count: usize,
    pub performance: f64,
    pub winrate: f64,
    pub net_profit: f64,
    pub gross_profit: f64,
    pub gross_loss: f64,
    pub largest_profit: f64,
    pub average_profit: f64,
    pub average_loss: f64,
    pub max_drawdown: f64,
    pub total_months: usize,
    pub missing_months: usize,
    pub average_concurrent: f64,
    pub average_win_streak: f64,
    pub max_win_streak: usize,
    pub average_loss_streak: f64,
    pub max_loss_streak: usize,
}

impl MetricBundle {
    /// Compute the full bundle for a non-empty subset.
    ///
    /// `month_span` is the global first-to-last month range of the whole
    /// store, computed once and shared across all subset calls so that
    /// missing-month counts are comparable between subsets.
    pub fn compute(
        positions: &[&Position],
        month_span: &[NaiveDate],
        opts: &MetricOptions,
    ) -> Result<Self, MetricError> {
        if positions.is_empty() {
            return Err(MetricError::EmptySubset);
        }
        let (average_win_streak, max_win_streak) = win_streaks(positions);
        let (average_loss_streak, max_loss_streak) = loss_streaks(positions);
        Ok(Self {
            position_count: positions.len(),
            performance: monthly_performance(positions).unwrap_or(f64::NAN),
            winrate: winrate(positions),
            net_profit: net_profit(positions),
            gross_profit: gross_profit(positions),
            gross_loss: gross_loss(positions),
            largest_profit: largest_profit(positions),
            average_profit: average_profit(positions),
            average_loss: average_loss(positions),
            max_drawdown: max_drawdown(
                positions,
                Duration::minutes(i64::from(opts.equity_step_minutes)),
            ),
            total_months: month_span.len(),
            missing_months: missing_months(positions, month_span),
            average_concurrent: average_concurrent(
                positions,
                Duration::minutes(i64::from(opts.concurrency_step_minutes)),
            ),
            average_win_streak,
            max_win_streak,
            average_loss_streak,
            max_loss_streak,
        })
    }
}

// ─── Profit aggregates ──────────────────────────────────────────────

/// Sum of net profit over the subset.
pub fn net_profit(positions: &[&Position]) -> f64 {
    positions.iter().map(|p| p.net_profit).sum()
}

/// Sum of net profit restricted to winning positions. Always >= 0.
pub fn gross_profit(positions: &[&Position]) -> f64 {
    positions
        .iter()
        .filter(|p| p.is_winner())
        .map(|p| p.net_profit)
        .sum()
}

/// Sum of net profit restricted to losing positions. Always <= 0.
pub fn gross_loss(positions: &[&Position]) -> f64 {
    positions
        .iter()
        .filter(|p| p.is_loser())
        .map(|p| p.net_profit)
        .sum()
}

/// Largest single winning trade. 0 when no winning trade exists.
pub fn largest_profit(positions: &[&Position]) -> f64 {
    positions
        .iter()
        .filter(|p| p.is_winner())
        .map(|p| p.net_profit)
        .fold(0.0, f64::max)
}

/// Mean net profit per position.
pub fn average_profit(positions: &[&Position]) -> f64 {
    if positions.is_empty() {
        return 0.0;
    }
    net_profit(positions) / positions.len() as f64
}

/// Mean net profit over losing positions only. 0 when no losing trade exists.
pub fn average_loss(positions: &[&Position]) -> f64 {
    let losses: Vec<f64> = positions
        .iter()
        .filter(|p| p.is_loser())
        .map(|p| p.net_profit)
        .collect();
    if losses.is_empty() {
        return 0.0;
    }
    losses.iter().sum::<f64>() / losses.len() as f64
}

// ─── Winrate and monthly performance ────────────────────────────────

/// Percentage of positions with positive net profit, in [0, 100].
pub fn winrate(positions: &[&Position]) -> f64 {
    if positions.is_empty() {
        return 0.0;
    }
    let winners = positions.iter().filter(|p| p.is_winner()).count();
    winners as f64 / positions.len() as f64 * 100.0
}

/// Percentage of profitable months among months with a non-zero net sum.
///
/// Positions are grouped by the calendar month of their exit time; a month
/// whose net sum is exactly zero counts toward neither side. `None` when
/// every monthly sum is zero (the ratio is undefined).
pub fn monthly_performance(positions: &[&Position]) -> Option<f64> {
    let mut by_month: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for p in positions {
        *by_month.entry(month_floor(p.exit_time)).or_insert(0.0) += p.net_profit;
    }
    let positive = by_month.values().filter(|sum| **sum > 0.0).count();
    let negative = by_month.values().filter(|sum| **sum < 0.0).count();
    if positive + negative == 0 {
        return None;
    }
    Some(positive as f64 / (positive + negative) as f64 * 100.0)
}

// ─── Drawdown ───────────────────────────────────────────────────────

/// Cumulative-profit equity curve sampled on a fixed-interval grid from the
/// subset's earliest to latest exit time.
///
/// A position's profit is credited only to the grid bucket whose timestamp
/// exactly equals its exit time; profit from off-grid exits is dropped.
/// That matches the original sampler and undercounts drawdown for trades
/// that do not align with the grid — interval-containment bucketing would
/// be the correct alternative.
pub fn equity_curve(positions: &[&Position], step: Duration) -> Vec<f64> {
    let Some(first) = positions.iter().map(|p| p.exit_time).min() else {
        return Vec::new();
    };
    // min() succeeded, so max() does too
    let last = positions.iter().map(|p| p.exit_time).max().unwrap();
    let step_secs = step.num_seconds().max(1);
    let samples = ((last - first).num_seconds() / step_secs) as usize + 1;

    let mut buckets = vec![0.0_f64; samples];
    for p in positions {
        let offset = (p.exit_time - first).num_seconds();
        if offset % step_secs == 0 {
            buckets[(offset / step_secs) as usize] += p.net_profit;
        }
    }

    let mut equity = 0.0;
    for bucket in &mut buckets {
        equity += *bucket;
        *bucket = equity;
    }
    buckets
}

/// Max peak-to-trough decline of the subset's equity curve. Always >= 0;
/// degenerates to 0 on a single-sample grid.
pub fn max_drawdown(positions: &[&Position], step: Duration) -> f64 {
    let curve = equity_curve(positions, step);
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;
    for eq in curve {
        if eq > peak {
            peak = eq;
        }
        let dd = (peak - eq).abs();
        if dd > max_dd {
            max_dd = dd;
        }
    }
    max_dd
}

// ─── Streaks ────────────────────────────────────────────────────────

/// Average and maximum run length of consecutive winning positions, in
/// entry-time order. (0.0, 0) when no winning position exists.
pub fn win_streaks(positions: &[&Position]) -> (f64, usize) {
    streaks(positions, |p| p.is_winner())
}

/// Average and maximum run length of consecutive losing positions.
pub fn loss_streaks(positions: &[&Position]) -> (f64, usize) {
    streaks(positions, |p| p.is_loser())
}

fn streaks(positions: &[&Position], classify: impl Fn(&Position) -> bool) -> (f64, usize) {
    let mut runs: Vec<usize> = Vec::new();
    let mut current = 0_usize;
    for p in positions {
        if classify(p) {
            current += 1;
        } else if current > 0 {
            runs.push(current);
            current = 0;
        }
    }
    if current > 0 {
        runs.push(current);
    }
    if runs.is_empty() {
        return (0.0, 0);
    }
    let avg = runs.iter().sum::<usize>() as f64 / runs.len() as f64;
    let max = *runs.iter().max().unwrap();
    (avg, max)
}

// ─── Calendar coverage and concurrency ──────────────────────────────

/// Number of months in the global span with no exit from this subset.
pub fn missing_months(positions: &[&Position], month_span: &[NaiveDate]) -> usize {
    month_span
        .iter()
        .filter(|month| {
            !positions
                .iter()
                .any(|p| month_contains(**month, p.exit_time))
        })
        .count()
}

/// Mean number of simultaneously open positions, sampled on a fixed grid
/// over the subset's full entry-to-exit range. A position is open at `t`
/// when `entry_time <= t < exit_time`.
pub fn average_concurrent(positions: &[&Position], step: Duration) -> f64 {
    let Some(start) = positions.iter().map(|p| p.entry_time).min() else {
        return 0.0;
    };
    let end = positions.iter().map(|p| p.exit_time).max().unwrap();
    let step_secs = step.num_seconds().max(1);
    let samples = ((end - start).num_seconds() / step_secs) as usize + 1;

    let mut total = 0_usize;
    for i in 0..samples {
        let t = start + Duration::seconds(i as i64 * step_secs);
        total += positions
            .iter()
            .filter(|p| p.entry_time <= t && t < p.exit_time)
            .count();
    }
    total as f64 / samples as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PositionSide, PositionStatus};
    use chrono::NaiveDateTime;

    fn base_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 10)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn pos_at(entry: NaiveDateTime, exit: NaiveDateTime, net_profit: f64) -> Position {
        Position {
            pair: "BTCUSDT".into(),
            entry_time: entry,
            exit_time: exit,
            status: PositionStatus::Closed,
            net_profit,
            capital_used: 100.0,
            side: Some(PositionSide::Long),
        }
    }

    /// Positions exiting `minutes_apart` minutes apart, one per profit.
    fn sequence(profits: &[f64], minutes_apart: i64) -> Vec<Position> {
        profits
            .iter()
            .enumerate()
            .map(|(i, &net)| {
                let exit = base_time() + Duration::minutes(i as i64 * minutes_apart);
                pos_at(exit - Duration::minutes(30), exit, net)
            })
            .collect()
    }

    fn refs(positions: &[Position]) -> Vec<&Position> {
        positions.iter().collect()
    }

    // ── Profit aggregates ──

    #[test]
    fn profit_aggregates_mixed() {
        let v = sequence(&[10.0, -5.0, 20.0], 60);
        let subset = refs(&v);
        assert!((net_profit(&subset) - 25.0).abs() < 1e-10);
        assert!((gross_profit(&subset) - 30.0).abs() < 1e-10);
        assert!((gross_loss(&subset) - (-5.0)).abs() < 1e-10);
        assert!((largest_profit(&subset) - 20.0).abs() < 1e-10);
        assert!((average_profit(&subset) - 25.0 / 3.0).abs() < 1e-10);
        assert!((average_loss(&subset) - (-5.0)).abs() < 1e-10);
    }

    #[test]
    fn largest_profit_falls_back_to_zero() {
        let v = sequence(&[-1.0, -2.0], 60);
        assert_eq!(largest_profit(&refs(&v)), 0.0);
    }

    #[test]
    fn average_loss_zero_without_losers() {
        let v = sequence(&[1.0, 2.0], 60);
        assert_eq!(average_loss(&refs(&v)), 0.0);
    }

    #[test]
    fn gross_identity() {
        let v = sequence(&[3.5, -1.25, 0.0, 7.75, -4.0], 60);
        let subset = refs(&v);
        let identity = gross_profit(&subset) + gross_loss(&subset);
        assert!((net_profit(&subset) - identity).abs() < 1e-10);
    }

    // ── Winrate ──

    #[test]
    fn winrate_mixed() {
        let v = sequence(&[10.0, -5.0, 20.0], 60);
        assert!((winrate(&refs(&v)) - 200.0 / 3.0).abs() < 1e-10);
    }

    #[test]
    fn winrate_zero_profit_is_not_a_win() {
        let v = sequence(&[0.0, 5.0], 60);
        assert!((winrate(&refs(&v)) - 50.0).abs() < 1e-10);
    }

    // ── Monthly performance ──

    #[test]
    fn performance_two_months() {
        let jan = NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let feb = NaiveDate::from_ymd_opt(2024, 2, 5)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let v = vec![
            pos_at(jan - Duration::hours(1), jan, 8.0),
            pos_at(jan, jan + Duration::hours(1), -3.0), // Jan sums to +5
            pos_at(feb - Duration::hours(1), feb, -3.0), // Feb sums to -3
        ];
        assert_eq!(monthly_performance(&refs(&v)), Some(50.0));
    }

    #[test]
    fn performance_undefined_when_all_months_net_zero() {
        let v = sequence(&[5.0, -5.0], 60);
        assert_eq!(monthly_performance(&refs(&v)), None);
    }

    #[test]
    fn performance_zero_month_counts_neither_side() {
        let jan = NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let feb = NaiveDate::from_ymd_opt(2024, 2, 5)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let v = vec![
            pos_at(jan - Duration::hours(1), jan, 5.0),
            pos_at(jan, jan + Duration::hours(1), -5.0), // Jan nets to zero
            pos_at(feb - Duration::hours(1), feb, 2.0),  // Feb positive
        ];
        assert_eq!(monthly_performance(&refs(&v)), Some(100.0));
    }

    // ── Equity curve / drawdown ──

    #[test]
    fn drawdown_known_case_on_grid() {
        // Exits at 0, 15, 30 minutes: equity [10, 5, 25], peak dips by 5.
        let v = sequence(&[10.0, -5.0, 20.0], 15);
        let dd = max_drawdown(&refs(&v), Duration::minutes(15));
        assert!((dd - 5.0).abs() < 1e-10);
    }

    #[test]
    fn drawdown_single_position_is_zero() {
        let v = sequence(&[-42.0], 15);
        assert_eq!(max_drawdown(&refs(&v), Duration::minutes(15)), 0.0);
    }

    #[test]
    fn drawdown_drops_off_grid_exits() {
        // The -5 exit lands 7 minutes past the grid start and is dropped
        // from the curve, so no drawdown is observed.
        let t0 = base_time();
        let v = vec![
            pos_at(t0 - Duration::hours(1), t0, 10.0),
            pos_at(t0, t0 + Duration::minutes(7), -5.0),
            pos_at(t0, t0 + Duration::minutes(30), 20.0),
        ];
        assert_eq!(max_drawdown(&refs(&v), Duration::minutes(15)), 0.0);
    }

    #[test]
    fn equity_curve_is_cumulative() {
        let v = sequence(&[10.0, -5.0, 20.0], 15);
        let curve = equity_curve(&refs(&v), Duration::minutes(15));
        assert_eq!(curve.len(), 3);
        assert!((curve[0] - 10.0).abs() < 1e-10);
        assert!((curve[1] - 5.0).abs() < 1e-10);
        assert!((curve[2] - 25.0).abs() < 1e-10);
    }

    #[test]
    fn drawdown_monotonic_equity_is_zero() {
        let v = sequence(&[5.0, 5.0, 5.0], 15);
        assert_eq!(max_drawdown(&refs(&v), Duration::minutes(15)), 0.0);
    }

    // ── Streaks ──

    #[test]
    fn streaks_reference_sequence() {
        // [+1, +1, -1, +1]: win runs [2, 1], loss runs [1].
        let v = sequence(&[1.0, 1.0, -1.0, 1.0], 60);
        let subset = refs(&v);
        let (avg_win, max_win) = win_streaks(&subset);
        let (avg_loss, max_loss) = loss_streaks(&subset);
        assert!((avg_win - 1.5).abs() < 1e-10);
        assert_eq!(max_win, 2);
        assert!((avg_loss - 1.0).abs() < 1e-10);
        assert_eq!(max_loss, 1);
    }

    #[test]
    fn streaks_zero_profit_breaks_runs() {
        let v = sequence(&[1.0, 0.0, 1.0], 60);
        let (avg_win, max_win) = win_streaks(&refs(&v));
        assert!((avg_win - 1.0).abs() < 1e-10);
        assert_eq!(max_win, 1);
    }

    #[test]
    fn streaks_absent_class_reports_zero() {
        let v = sequence(&[1.0, 2.0], 60);
        assert_eq!(loss_streaks(&refs(&v)), (0.0, 0));
    }

    // ── Missing months ──

    #[test]
    fn missing_months_counts_gaps() {
        let jan = NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let mar = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let v = vec![
            pos_at(jan - Duration::hours(1), jan, 1.0),
            pos_at(mar - Duration::hours(1), mar, 1.0),
        ];
        let span = vec![
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        ];
        assert_eq!(missing_months(&refs(&v), &span), 1);
    }

    // ── Concurrency ──

    #[test]
    fn average_concurrent_overlapping_pair() {
        // Two positions open over the same 10 minutes, sampled at 0/5/10:
        // counts are [2, 2, 0] (exit is exclusive) → mean 4/3.
        let t0 = base_time();
        let v = vec![
            pos_at(t0, t0 + Duration::minutes(10), 1.0),
            pos_at(t0, t0 + Duration::minutes(10), -1.0),
        ];
        let avg = average_concurrent(&refs(&v), Duration::minutes(5));
        assert!((avg - 4.0 / 3.0).abs() < 1e-10);
    }

    // ── Bundle ──

    #[test]
    fn compute_rejects_empty_subset() {
        let err = MetricBundle::compute(&[], &[], &MetricOptions::default());
        assert!(matches!(err, Err(MetricError::EmptySubset)));
    }

    #[test]
    fn compute_full_bundle() {
        let v = sequence(&[10.0, -5.0, 20.0], 15);
        let span = vec![NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()];
        let bundle = MetricBundle::compute(&refs(&v), &span, &MetricOptions::default()).unwrap();
        assert_eq!(bundle.position_count, 3);
        assert!((bundle.net_profit - 25.0).abs() < 1e-10);
        assert!((bundle.winrate - 200.0 / 3.0).abs() < 1e-10);
        assert!((bundle.max_drawdown - 5.0).abs() < 1e-10);
        assert_eq!(bundle.total_months, 1);
        assert_eq!(bundle.missing_months, 0);
        assert_eq!(bundle.max_win_streak, 1);
        assert_eq!(bundle.max_loss_streak, 1);
        assert!(bundle.average_concurrent > 0.0);
    }

    #[test]
    fn compute_is_deterministic() {
        let v = sequence(&[3.0, -2.0, 8.0, -1.0], 15);
        let span = vec![NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()];
        let opts = MetricOptions::default();
        let a = MetricBundle::compute(&refs(&v), &span, &opts).unwrap();
        let b = MetricBundle::compute(&refs(&v), &span, &opts).unwrap();
        assert_eq!(a.net_profit.to_bits(), b.net_profit.to_bits());
        assert_eq!(a.max_drawdown.to_bits(), b.max_drawdown.to_bits());
        assert_eq!(a.average_concurrent.to_bits(), b.average_concurrent.to_bits());
    }
}
