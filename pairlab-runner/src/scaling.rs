//! Capital-invariant rescaling of combination rows.
//!
//! Every row is rescaled so that it implies the same total deployed
//! capital: `capital_per_trade × position_count(last row)`. A row with
//! fewer positions therefore gets more capital per trade, and every
//! profit-dimensioned field is multiplied by the resulting factor.
//! Dimensionless fields (counts, winrate, performance, streaks) are left
//! alone.

use crate::ranking::CombinationRow;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScaleError {
    /// The rescale anchors on the last row's position count; by
    /// construction the last (largest) combination should pool the most
    /// positions. Anything else means ranking or exclusion broke that
    /// assumption, and silently scaling would produce factors above 1.
    #[error(
        "combination row k={offender} pools {offender_count} positions, \
         more than the final row's {final_count}"
    )]
    FinalRowNotLargest {
        offender: usize,
        offender_count: usize,
        final_count: usize,
    },

    #[error("combination row k={0} observed a non-positive capital per trade")]
    NonPositiveCapital(usize),
}

/// Rescale all rows in place against a fixed per-trade capital target.
pub fn normalize_capital(
    rows: &mut [CombinationRow],
    capital_per_trade: f64,
) -> Result<(), ScaleError> {
    let Some(last) = rows.last() else {
        return Ok(());
    };
    let final_count = last.bundle.position_count;

    if let Some(offender) = rows
        .iter()
        .find(|row| row.bundle.position_count > final_count)
    {
        return Err(ScaleError::FinalRowNotLargest {
            offender: offender.pair_count,
            offender_count: offender.bundle.position_count,
            final_count,
        });
    }

    let total_capital = final_count as f64 * capital_per_trade;

    for row in rows.iter_mut() {
        let observed = row.capital_per_trade;
        if !(observed > 0.0) {
            return Err(ScaleError::NonPositiveCapital(row.pair_count));
        }
        let implied = total_capital / row.bundle.position_count as f64;
        let factor = implied / observed;

        row.capital_per_trade = implied;
        row.scaling_factor = factor;

        let bundle = &mut row.bundle;
        bundle.net_profit *= factor;
        bundle.gross_profit *= factor;
        bundle.gross_loss *= factor;
        bundle.max_drawdown *= factor;
        bundle.largest_profit *= factor;
        bundle.average_profit *= factor;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pairlab_core::MetricBundle;

    fn row(pair_count: usize, position_count: usize, observed_capital: f64) -> CombinationRow {
        CombinationRow {
            pair_count,
            capital_per_trade: observed_capital,
            scaling_factor: 1.0,
            bundle: MetricBundle {
                position_count,
                performance: 60.0,
                winrate: 55.0,
                net_profit: 100.0,
                gross_profit: 150.0,
                gross_loss: -50.0,
                largest_profit: 30.0,
                average_profit: 100.0 / position_count as f64,
                average_loss: -5.0,
                max_drawdown: 20.0,
                total_months: 6,
                missing_months: 1,
                average_concurrent: 1.5,
                average_win_streak: 2.0,
                max_win_streak: 4,
                average_loss_streak: 1.0,
                max_loss_streak: 2,
            },
        }
    }

    #[test]
    fn total_capital_constant_across_rows() {
        let mut rows = vec![row(1, 3, 100.0), row(2, 5, 100.0), row(3, 10, 100.0)];
        normalize_capital(&mut rows, 60.0).unwrap();

        let total = rows
            .last()
            .map(|r| r.capital_per_trade * r.bundle.position_count as f64)
            .unwrap();
        for r in &rows {
            let deployed = r.capital_per_trade * r.bundle.position_count as f64;
            assert!((deployed - total).abs() < 1e-9);
        }
        // total = 10 positions × 60 target = 600
        assert!((total - 600.0).abs() < 1e-9);
    }

    #[test]
    fn factor_is_one_when_implied_matches_observed() {
        // Last row: 5 positions × 100 target = 500 total.
        // First row: 500 / 5... use counts so implied(1) == observed(1).
        let mut rows = vec![row(1, 3, 100.0), row(2, 5, 60.0)];
        normalize_capital(&mut rows, 60.0).unwrap();
        // total = 5 × 60 = 300; implied(1) = 300/3 = 100 = observed(1)
        assert!((rows[0].scaling_factor - 1.0).abs() < 1e-10);
        assert!((rows[0].bundle.net_profit - 100.0).abs() < 1e-10);
        // implied(2) = 300/5 = 60 = observed(2)
        assert!((rows[1].scaling_factor - 1.0).abs() < 1e-10);
    }

    #[test]
    fn profit_fields_scale_and_dimensionless_fields_do_not() {
        let mut rows = vec![row(1, 5, 50.0), row(2, 10, 100.0)];
        normalize_capital(&mut rows, 100.0).unwrap();
        // total = 10 × 100 = 1000; implied(1) = 200; factor(1) = 200/50 = 4.
        let first = &rows[0];
        assert!((first.scaling_factor - 4.0).abs() < 1e-10);
        assert!((first.bundle.net_profit - 400.0).abs() < 1e-10);
        assert!((first.bundle.gross_profit - 600.0).abs() < 1e-10);
        assert!((first.bundle.gross_loss - (-200.0)).abs() < 1e-10);
        assert!((first.bundle.max_drawdown - 80.0).abs() < 1e-10);
        assert!((first.bundle.largest_profit - 120.0).abs() < 1e-10);
        assert!((first.bundle.average_profit - 80.0).abs() < 1e-10);
        // untouched
        assert_eq!(first.bundle.position_count, 5);
        assert!((first.bundle.winrate - 55.0).abs() < 1e-10);
        assert!((first.bundle.performance - 60.0).abs() < 1e-10);
        assert!((first.bundle.average_loss - (-5.0)).abs() < 1e-10);
        assert_eq!(first.bundle.max_win_streak, 4);
    }

    #[test]
    fn rejects_non_maximal_final_row() {
        let mut rows = vec![row(1, 10, 100.0), row(2, 5, 100.0)];
        let err = normalize_capital(&mut rows, 100.0).unwrap_err();
        assert!(matches!(
            err,
            ScaleError::FinalRowNotLargest {
                offender: 1,
                offender_count: 10,
                final_count: 5
            }
        ));
    }

    #[test]
    fn rejects_non_positive_observed_capital() {
        let mut rows = vec![row(1, 5, 0.0)];
        assert!(matches!(
            normalize_capital(&mut rows, 100.0),
            Err(ScaleError::NonPositiveCapital(1))
        ));
    }

    #[test]
    fn empty_rows_are_a_no_op() {
        let mut rows: Vec<CombinationRow> = Vec::new();
        assert!(normalize_capital(&mut rows, 100.0).is_ok());
    }
}
