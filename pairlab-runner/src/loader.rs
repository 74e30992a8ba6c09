//! Positions CSV loading — schema validation, parsing, filtering.
//!
//! The loader is the only place raw input is trusted-but-verified: the
//! header is validated before any row is parsed (a missing required column
//! is fatal), and rows whose entry time lies after their exit time are
//! dropped with a warning rather than aborting the whole run.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use pairlab_core::domain::{Position, PositionSide, PositionStatus};
use pairlab_core::PositionStore;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Columns the positions file must carry. `Type` is optional and only
/// required when a position-type filter is requested.
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "Pair name",
    "Entry time",
    "Exit time",
    "Status",
    "Net profit",
    "Capital used",
];

/// Errors from the positions loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open positions file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("positions file is missing required column '{0}'")]
    MissingColumn(String),

    #[error("failed to read positions file: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}: unparseable timestamp '{value}'")]
    Timestamp { row: usize, value: String },
}

/// One CSV row as it appears in the source file.
#[derive(Debug, Deserialize)]
struct RawPosition {
    #[serde(rename = "Pair name")]
    pair: String,
    #[serde(rename = "Entry time")]
    entry_time: String,
    #[serde(rename = "Exit time")]
    exit_time: String,
    #[serde(rename = "Status")]
    status: String,
    #[serde(rename = "Net profit")]
    net_profit: f64,
    #[serde(rename = "Capital used")]
    capital_used: f64,
    #[serde(rename = "Type", default)]
    position_type: Option<String>,
}

/// Load a positions file into a store, optionally filtering by `Type`.
pub fn load_positions(
    path: &Path,
    position_type: Option<&str>,
) -> Result<PositionStore, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_positions(file, position_type)
}

/// Parse positions from any reader. Exposed separately so tests and callers
/// with in-memory data avoid the filesystem.
pub fn read_positions<R: Read>(
    reader: R,
    position_type: Option<&str>,
) -> Result<PositionStore, LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(LoadError::MissingColumn(column.to_string()));
        }
    }
    if position_type.is_some() && !headers.iter().any(|h| h == "Type") {
        return Err(LoadError::MissingColumn("Type".to_string()));
    }

    let mut positions = Vec::new();
    let mut dropped = 0_usize;

    for (idx, record) in csv_reader.deserialize::<RawPosition>().enumerate() {
        let raw = record?;
        let row = idx + 2; // 1-based, header is row 1

        if let Some(wanted) = position_type {
            let matches = raw
                .position_type
                .as_deref()
                .is_some_and(|t| t.eq_ignore_ascii_case(wanted));
            if !matches {
                continue;
            }
        }

        let entry_time = parse_timestamp(&raw.entry_time).ok_or_else(|| LoadError::Timestamp {
            row,
            value: raw.entry_time.clone(),
        })?;
        let exit_time = parse_timestamp(&raw.exit_time).ok_or_else(|| LoadError::Timestamp {
            row,
            value: raw.exit_time.clone(),
        })?;

        if entry_time > exit_time {
            eprintln!(
                "warning: row {row}: '{}' entry time {entry_time} is after exit time {exit_time}, dropping position",
                raw.pair
            );
            dropped += 1;
            continue;
        }

        positions.push(Position {
            side: raw.position_type.as_deref().and_then(PositionSide::parse),
            pair: raw.pair,
            entry_time,
            exit_time,
            status: PositionStatus::parse(&raw.status),
            net_profit: raw.net_profit,
            capital_used: raw.capital_used,
        });
    }

    if dropped > 0 {
        eprintln!("warning: dropped {dropped} position(s) with non-monotonic time ranges");
    }

    Ok(PositionStore::new(positions))
}

/// Accepted timestamp shapes, most specific first. Offsets are discarded —
/// all analysis runs on naive timestamps.
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
