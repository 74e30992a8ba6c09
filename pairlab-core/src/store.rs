//! PositionStore — the immutable, entry-time-sorted set of loaded positions.
//!
//! The store owns every row of the input file (open positions included, so
//! the global time span matches the source data) and hands out borrowed,
//! filtered views. Views over closed positions preserve entry-time order,
//! which streak computation relies on.

use crate::domain::calendar::month_span;
use crate::domain::Position;
use chrono::{NaiveDate, NaiveDateTime};

#[derive(Debug, Default)]
pub struct PositionStore {
    positions: Vec<Position>,
}

impl PositionStore {
    /// Build a store, sorting by entry time.
    pub fn new(mut positions: Vec<Position>) -> Self {
        positions.sort_by_key(|p| p.entry_time);
        Self { positions }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Pair names in first-appearance (entry-time) order, deduplicated.
    pub fn pair_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for p in &self.positions {
            if !names.iter().any(|n| n == &p.pair) {
                names.push(p.pair.clone());
            }
        }
        names
    }

    /// Closed positions for a single pair, entry-time order.
    pub fn closed_for_pair(&self, pair: &str) -> Vec<&Position> {
        self.positions
            .iter()
            .filter(|p| p.is_closed() && p.pair == pair)
            .collect()
    }

    /// Closed positions pooled across a set of pairs, entry-time order.
    pub fn closed_for_pairs(&self, pairs: &[String]) -> Vec<&Position> {
        self.positions
            .iter()
            .filter(|p| p.is_closed() && pairs.iter().any(|name| name == &p.pair))
            .collect()
    }

    pub fn closed_count(&self) -> usize {
        self.positions.iter().filter(|p| p.is_closed()).count()
    }

    pub fn open_count(&self) -> usize {
        self.positions.len() - self.closed_count()
    }

    /// Global time range: earliest entry to latest exit, over all positions.
    pub fn time_range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let start = self.positions.iter().map(|p| p.entry_time).min()?;
        let end = self.positions.iter().map(|p| p.exit_time).max()?;
        Some((start, end))
    }

    /// Every calendar month the store's positions span, first to last
    /// inclusive. Shared by missing-month counting and the monthly report.
    pub fn month_span(&self) -> Vec<NaiveDate> {
        match self.time_range() {
            Some((start, end)) => month_span(start, end),
            None => Vec::new(),
        }
    }
}
