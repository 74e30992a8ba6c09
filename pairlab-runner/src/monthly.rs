//! Monthly profit partitioning for combination rows.
//!
//! Each combination row's pooled, already-rescaled profit is split across
//! the calendar months of the store's span by exit time, yielding a
//! month × combination matrix. Summing a row across months recovers its
//! scaled net profit exactly (up to float addition order).

use crate::ranking::CombinationRow;
use chrono::NaiveDate;
use pairlab_core::domain::calendar::month_contains;
use pairlab_core::PositionStore;

/// One combination row's profit split by month, scaled by the row's factor.
#[derive(Debug, Clone)]
pub struct MonthlyRow {
    pub pair_count: usize,
    /// Profit per month, parallel to `MonthlyReport::months`.
    pub profits: Vec<f64>,
}

/// Month × combination profit matrix.
#[derive(Debug, Clone)]
pub struct MonthlyReport {
    pub months: Vec<NaiveDate>,
    pub rows: Vec<MonthlyRow>,
}

/// Partition each combination row's pooled profit across the month span.
///
/// Rows must already be capital-normalized; the per-position profits are
/// multiplied by the row's scaling factor so the matrix lines up with the
/// rescaled combination report.
pub fn build_monthly_report(
    store: &PositionStore,
    selected: &[String],
    rows: &[CombinationRow],
    month_span: &[NaiveDate],
) -> MonthlyReport {
    let mut monthly_rows = Vec::with_capacity(rows.len());

    for row in rows {
        let k = row.pair_count.min(selected.len());
        let pool = store.closed_for_pairs(&selected[..k]);

        let profits = month_span
            .iter()
            .map(|month| {
                pool.iter()
                    .filter(|p| month_contains(*month, p.exit_time))
                    .map(|p| p.net_profit * row.scaling_factor)
                    .sum()
            })
            .collect();

        monthly_rows.push(MonthlyRow {
            pair_count: row.pair_count,
            profits,
        });
    }

    MonthlyReport {
        months: month_span.to_vec(),
        rows: monthly_rows,
    }
}
