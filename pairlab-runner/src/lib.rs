//! PairLab Runner — report orchestration on top of `pairlab-core`.
//!
//! This crate builds on `pairlab-core` to provide:
//! - Positions CSV loading with schema validation
//! - Serializable report configuration (TOML) with blake3 run ids
//! - Scoring engine (normalized weighted composite score per pair)
//! - Combination ranking over cumulative top-k pair pools
//! - Capital-invariant rescaling of combination rows
//! - Monthly profit partitioning
//! - CSV artifact export (base, final, monthly, combined reports)

pub mod config;
pub mod export;
pub mod loader;
pub mod monthly;
pub mod ranking;
pub mod runner;
pub mod scaling;
pub mod scoring;

pub use config::{ConfigError, ReportConfig, RunId};
pub use export::{write_reports, ReportPaths, RunManifest};
pub use loader::{load_positions, read_positions, LoadError};
pub use monthly::{build_monthly_report, MonthlyReport, MonthlyRow};
pub use ranking::{build_combination_rows, selected_pairs, CombinationRow};
pub use runner::{run_report, run_report_from_store, ReportSet, RunError};
pub use scaling::{normalize_capital, ScaleError};
pub use scoring::{score_table, PairMetrics, RankedPair, RankedTable, ScoreColumn, ScoreWeights};
