//! PairLab Core — position domain types, the position store, and metric computation.
//!
//! This crate holds everything needed to turn a set of closed trade records
//! into a [`MetricBundle`]: the immutable [`PositionStore`], calendar-month
//! helpers, and the pure metric function library. Report orchestration,
//! scoring, and artifact export live in `pairlab-runner`.

pub mod domain;
pub mod metrics;
pub mod store;

pub use domain::{Position, PositionSide, PositionStatus};
pub use metrics::{MetricBundle, MetricError, MetricOptions};
pub use store::PositionStore;
