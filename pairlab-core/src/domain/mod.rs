//! Domain types: positions and calendar-month arithmetic.

pub mod calendar;
pub mod position;

pub use position::{Position, PositionSide, PositionStatus};
