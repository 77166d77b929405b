//! Group-expense share splitting and settlement tracking.

pub mod calculator;
pub mod error;
pub mod types;

#[cfg(test)]
mod calculator_props;

pub use calculator::SplitCalculator;
pub use error::SplitError;
pub use types::{
    GroupExpense, Participant, ParticipantShare, Payment, PaymentCheck, PaymentMethod,
    ShareBreakdown, SplitPolicy,
};
