//! Split validation and membership error types.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Rejections from split operations. All are local validation failures:
/// nothing is retried and nothing is fatal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SplitError {
    /// Payment amount is zero or negative.
    #[error("Payment amount must be positive")]
    InvalidAmount,

    /// A single submission may never exceed the payer's expected share.
    #[error("Payment amount cannot exceed your share of {share}")]
    ExceedsShare {
        /// The payer's expected share.
        share: Decimal,
    },

    /// The payer is neither the owner nor a joined participant.
    #[error("User {0} is not a participant of this group expense")]
    NotParticipant(Uuid),

    /// The owner cannot join their own expense.
    #[error("You are the owner of this group expense")]
    AlreadyOwner,

    /// The requester has already joined.
    #[error("You have already joined this group expense")]
    AlreadyJoined,

    /// All non-owner slots are taken.
    #[error("This group expense is already full")]
    GroupFull,
}
