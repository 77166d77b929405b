//! Group-expense data types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use wais_shared::Percent;

/// How a group expense is divided among its participant slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum SplitPolicy {
    /// Every slot owes the same share (100 / participant count).
    Equal,
    /// The owner keeps a chosen share; the rest is divided among the
    /// remaining slots.
    Percentage {
        /// Share kept by the owner (0-100).
        owner_share: Percent,
        /// Combined share of all non-owner slots (0-100).
        other_share: Percent,
    },
}

/// How a payment was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash.
    Cash,
    /// Bank transfer.
    BankTransfer,
    /// GCash e-wallet.
    Gcash,
    /// PayMaya e-wallet.
    Paymaya,
    /// Credit card.
    CreditCard,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cash => write!(f, "Cash"),
            Self::BankTransfer => write!(f, "Bank Transfer"),
            Self::Gcash => write!(f, "GCash"),
            Self::Paymaya => write!(f, "PayMaya"),
            Self::CreditCard => write!(f, "Credit Card"),
        }
    }
}

/// A participant who has joined a group expense (the owner is implicit
/// and never appears here).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Participant's user ID.
    pub user_id: Uuid,
    /// Display name for presentation.
    pub display_name: String,
}

/// A shared bill split among a fixed number of participant slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupExpense {
    /// Expense ID.
    pub id: Uuid,
    /// User who created the expense.
    pub owner_id: Uuid,
    /// Owner's display name.
    pub owner_name: String,
    /// Display title.
    pub title: String,
    /// Full bill amount.
    pub total_amount: Decimal,
    /// Total number of slots, owner included (>= 2 at creation).
    pub participant_count: u32,
    /// Participants who have joined via the join code, owner excluded.
    pub participants: Vec<Participant>,
    /// Split policy.
    pub split_policy: SplitPolicy,
    /// Short code other participants use to join.
    pub join_code: String,
    /// First day the expense covers.
    pub start_date: NaiveDate,
    /// Optional last day the expense covers.
    pub end_date: Option<NaiveDate>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A single contribution toward a group expense. Immutable once created;
/// the ledger is append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    /// Payment ID.
    pub id: Uuid,
    /// Expense this payment belongs to.
    pub group_expense_id: Uuid,
    /// User who paid.
    pub payer_id: Uuid,
    /// Amount paid (positive).
    pub amount: Decimal,
    /// Payment method.
    pub method: PaymentMethod,
    /// Optional reference notes.
    pub notes: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// One slot of a share breakdown. Unfilled slots carry no participant ID
/// and a placeholder display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantShare {
    /// Participant occupying the slot, if anyone has.
    pub participant_id: Option<Uuid>,
    /// Display name (placeholder text for unfilled slots).
    pub display_name: String,
    /// Slot percentage of the total (0-100).
    pub percentage: Decimal,
    /// Amount this slot is responsible for.
    pub expected_share: Decimal,
    /// Sum of this participant's payments.
    pub amount_paid: Decimal,
    /// Expected share minus paid, floored at zero.
    pub remaining: Decimal,
    /// Paid over expected, clamped to [0, 100].
    pub completion_percent: Decimal,
}

/// Full settlement picture for one expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareBreakdown {
    /// Ordered slots: owner first, joined participants, then unfilled slots.
    pub slots: Vec<ParticipantShare>,
    /// Sum of every payment on the ledger.
    pub total_paid: Decimal,
    /// Total paid over total amount, clamped to [0, 100].
    pub overall_completion_percent: Decimal,
}

/// Outcome of a successful payment validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentCheck {
    /// The payer's expected share.
    pub expected_share: Decimal,
    /// The payer's remaining balance before this payment.
    pub remaining: Decimal,
    /// Amount above the remaining balance, when the submission overpays.
    /// Advisory only; the payment is still accepted.
    pub overpayment: Option<Decimal>,
}
