//! Shared value types.

pub mod percent;

pub use percent::{Percent, PercentError};
