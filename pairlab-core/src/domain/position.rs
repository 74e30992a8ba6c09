//! Position — one historical trade record for a pair.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a position in the source data.
///
/// Source files carry a richer set of strings (`CLOSED-WIN`, `CLOSED-LOSS`,
/// `STOPPED`, …); everything that is not explicitly open or pending collapses
/// to `Closed`. Only non-open positions carry realized profit and are
/// eligible for metric computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionStatus {
    Pending,
    Active,
    Entered,
    Closed,
}

impl PositionStatus {
    /// Parse a raw status string. Unrecognized values collapse to `Closed`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Self::Pending,
            "ACTIVE" => Self::Active,
            "ENTERED" => Self::Entered,
            _ => Self::Closed,
        }
    }

    /// Whether the position is still open (no realized profit yet).
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Active | Self::Entered)
    }
}

/// Trade direction, used only as an optional input filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    /// Parse a raw side string (case-insensitive). Unknown values map to `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "long" => Some(Self::Long),
            "short" => Some(Self::Short),
            _ => None,
        }
    }
}

/// One historical trade record: pair, entry/exit times, realized profit.
///
/// Positions are immutable facts once loaded. `exit_time >= entry_time`
/// is enforced by the loader; rows violating it never reach the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub pair: String,
    pub entry_time: NaiveDateTime,
    pub exit_time: NaiveDateTime,
    pub status: PositionStatus,
    pub net_profit: f64,
    pub capital_used: f64,
    pub side: Option<PositionSide>,
}

impl Position {
    pub fn is_winner(&self) -> bool {
        self.net_profit > 0.0
    }

    pub fn is_loser(&self) -> bool {
        self.net_profit < 0.0
    }

    /// Whether the position is closed and therefore eligible for analytics.
    pub fn is_closed(&self) -> bool {
        !self.status.is_open()
    }
}
