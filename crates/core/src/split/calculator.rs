//! Share computation and payment/join validation for group expenses.
//!
//! Everything here is pure computation over data already fetched: no I/O,
//! no hidden state. Callers re-run [`SplitCalculator::compute_shares`] after
//! any mutating call to obtain fresh figures.

use rust_decimal::Decimal;
use uuid::Uuid;

use super::error::SplitError;
use super::types::{
    GroupExpense, ParticipantShare, Payment, PaymentCheck, ShareBreakdown, SplitPolicy,
};

/// Display name used for slots nobody has joined yet.
const UNFILLED_SLOT_NAME: &str = "Other Participant";

/// Split calculator for group-expense settlement logic.
pub struct SplitCalculator;

impl SplitCalculator {
    /// Tolerance for the percentage-sum invariant (±0.01).
    fn rounding_tolerance() -> Decimal {
        Decimal::new(1, 2)
    }

    /// Computes the per-slot and aggregate settlement figures for an
    /// expense and its payment ledger.
    ///
    /// Slots are ordered owner first, then joined participants, then
    /// unfilled placeholder slots. Percentages are corrected so they sum
    /// to 100 within tolerance, with any difference spread equally across
    /// the non-owner slots.
    ///
    /// Degenerate inputs (`participant_count` of zero, non-positive
    /// `total_amount`) yield zeroed output rather than an error so stored
    /// data can always be rendered.
    #[must_use]
    pub fn compute_shares(expense: &GroupExpense, payments: &[Payment]) -> ShareBreakdown {
        let slot_count = expense.participant_count as usize;
        if slot_count == 0 {
            return ShareBreakdown {
                slots: Vec::new(),
                total_paid: Decimal::ZERO,
                overall_completion_percent: Decimal::ZERO,
            };
        }

        let mut slots = Self::assign_percentages(expense, slot_count);
        Self::correct_rounding(&mut slots);

        let total = expense.total_amount;
        let degenerate = total <= Decimal::ZERO;
        let total_paid: Decimal = payments.iter().map(|p| p.amount).sum();

        let slots = slots
            .into_iter()
            .map(|slot| {
                let expected_share = if degenerate {
                    Decimal::ZERO
                } else {
                    (total * slot.percentage / Decimal::ONE_HUNDRED).round_dp(2)
                };
                let amount_paid = slot.participant_id.map_or(Decimal::ZERO, |id| {
                    payments
                        .iter()
                        .filter(|p| p.payer_id == id)
                        .map(|p| p.amount)
                        .sum()
                });
                let remaining = (expected_share - amount_paid).max(Decimal::ZERO);
                let completion_percent = if expected_share <= Decimal::ZERO {
                    Decimal::ZERO
                } else {
                    (amount_paid / expected_share * Decimal::ONE_HUNDRED)
                        .min(Decimal::ONE_HUNDRED)
                        .round_dp(2)
                };

                ParticipantShare {
                    expected_share,
                    amount_paid,
                    remaining,
                    completion_percent,
                    ..slot
                }
            })
            .collect();

        let overall_completion_percent = if degenerate {
            Decimal::ZERO
        } else {
            (total_paid / total * Decimal::ONE_HUNDRED)
                .min(Decimal::ONE_HUNDRED)
                .round_dp(2)
        };

        ShareBreakdown {
            slots,
            total_paid,
            overall_completion_percent,
        }
    }

    /// Validates a single payment submission against the payer's share.
    ///
    /// The cap applies to the single submission, not the cumulative total:
    /// a submission of exactly the expected share is accepted regardless of
    /// prior payments. Paying more than the remaining balance is advisory
    /// only and reported through [`PaymentCheck::overpayment`].
    ///
    /// # Errors
    ///
    /// Returns `SplitError::InvalidAmount` for non-positive amounts,
    /// `SplitError::NotParticipant` if the payer holds no slot, and
    /// `SplitError::ExceedsShare` if the submission exceeds the payer's
    /// expected share.
    pub fn validate_payment(
        expense: &GroupExpense,
        payer_id: Uuid,
        amount: Decimal,
        payments: &[Payment],
    ) -> Result<PaymentCheck, SplitError> {
        if amount <= Decimal::ZERO {
            return Err(SplitError::InvalidAmount);
        }

        let breakdown = Self::compute_shares(expense, payments);
        let slot = breakdown
            .slots
            .iter()
            .find(|s| s.participant_id == Some(payer_id))
            .ok_or(SplitError::NotParticipant(payer_id))?;

        if amount > slot.expected_share {
            return Err(SplitError::ExceedsShare {
                share: slot.expected_share,
            });
        }

        let overpayment = if amount > slot.remaining {
            Some(amount - slot.remaining)
        } else {
            None
        };

        Ok(PaymentCheck {
            expected_share: slot.expected_share,
            remaining: slot.remaining,
            overpayment,
        })
    }

    /// Validates a join request and returns the updated non-owner
    /// participant ID set on success. The caller persists the result.
    ///
    /// # Errors
    ///
    /// Returns `SplitError::AlreadyOwner`, `SplitError::AlreadyJoined`, or
    /// `SplitError::GroupFull` when the request is rejected.
    pub fn join_group(expense: &GroupExpense, requester_id: Uuid) -> Result<Vec<Uuid>, SplitError> {
        if requester_id == expense.owner_id {
            return Err(SplitError::AlreadyOwner);
        }
        if expense
            .participants
            .iter()
            .any(|p| p.user_id == requester_id)
        {
            return Err(SplitError::AlreadyJoined);
        }

        let capacity = expense.participant_count.saturating_sub(1) as usize;
        if expense.participants.len() >= capacity {
            return Err(SplitError::GroupFull);
        }

        let mut updated: Vec<Uuid> = expense.participants.iter().map(|p| p.user_id).collect();
        updated.push(requester_id);
        Ok(updated)
    }

    /// Builds the ordered slot list with raw (uncorrected) percentages.
    fn assign_percentages(expense: &GroupExpense, slot_count: usize) -> Vec<ParticipantShare> {
        let (owner_percentage, other_percentage) = match expense.split_policy {
            SplitPolicy::Equal => {
                let each = Decimal::ONE_HUNDRED / Decimal::from(expense.participant_count);
                (each, each)
            }
            SplitPolicy::Percentage {
                owner_share,
                other_share,
            } => {
                let other_slots = expense.participant_count.saturating_sub(1);
                let per_other = if other_slots == 0 {
                    Decimal::ZERO
                } else {
                    other_share.value() / Decimal::from(other_slots)
                };
                (owner_share.value(), per_other)
            }
        };

        let mut slots = Vec::with_capacity(slot_count);
        slots.push(Self::empty_slot(
            Some(expense.owner_id),
            expense.owner_name.clone(),
            owner_percentage,
        ));
        for participant in expense.participants.iter().take(slot_count - 1) {
            slots.push(Self::empty_slot(
                Some(participant.user_id),
                participant.display_name.clone(),
                other_percentage,
            ));
        }
        while slots.len() < slot_count {
            slots.push(Self::empty_slot(
                None,
                UNFILLED_SLOT_NAME.to_string(),
                other_percentage,
            ));
        }
        slots
    }

    /// Redistributes any deviation of the percentage sum from 100 equally
    /// across the non-owner slots. The owner's share is what they chose.
    fn correct_rounding(slots: &mut [ParticipantShare]) {
        let sum: Decimal = slots.iter().map(|s| s.percentage).sum();
        let difference = Decimal::ONE_HUNDRED - sum;
        if difference.abs() <= Self::rounding_tolerance() || slots.len() < 2 {
            return;
        }

        let adjustment = difference / Decimal::from(slots.len() - 1);
        for slot in slots.iter_mut().skip(1) {
            slot.percentage += adjustment;
        }
    }

    /// A slot with percentage assigned and money figures still zeroed.
    fn empty_slot(
        participant_id: Option<Uuid>,
        display_name: String,
        percentage: Decimal,
    ) -> ParticipantShare {
        ParticipantShare {
            participant_id,
            display_name,
            percentage,
            expected_share: Decimal::ZERO,
            amount_paid: Decimal::ZERO,
            remaining: Decimal::ZERO,
            completion_percent: Decimal::ZERO,
        }
    }
}
