//! Property-based tests for split-share computation invariants.

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;
use wais_shared::Percent;

use super::calculator::SplitCalculator;
use super::error::SplitError;
use super::types::{GroupExpense, Participant, Payment, PaymentMethod, SplitPolicy};

/// Strategy for a positive total amount (0.01 to 1,000,000.00).
fn total_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for a positive payment amount (0.01 to 10,000.00).
fn payment_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for a split policy. Percentage shares are drawn independently,
/// so their sum may drift from 100 and exercise the rounding correction.
fn split_policy() -> impl Strategy<Value = SplitPolicy> {
    prop_oneof![
        Just(SplitPolicy::Equal),
        (0u32..=100u32, 0u32..=100u32).prop_map(|(owner, other)| SplitPolicy::Percentage {
            owner_share: Percent::new(Decimal::from(owner)).unwrap(),
            other_share: Percent::new(Decimal::from(other)).unwrap(),
        }),
    ]
}

/// Builds an expense with `joined` of the non-owner slots filled.
fn make_expense(
    total: Decimal,
    participant_count: u32,
    joined: u32,
    policy: SplitPolicy,
) -> GroupExpense {
    let participants = (0..joined)
        .map(|i| Participant {
            user_id: Uuid::new_v4(),
            display_name: format!("user{i}"),
        })
        .collect();
    GroupExpense {
        id: Uuid::new_v4(),
        owner_id: Uuid::new_v4(),
        owner_name: "owner".to_string(),
        title: "expense".to_string(),
        total_amount: total,
        participant_count,
        participants,
        split_policy: policy,
        join_code: "AAAAAA".to_string(),
        start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        end_date: None,
        created_at: Utc::now(),
    }
}

fn make_payment(expense: &GroupExpense, payer_id: Uuid, amount: Decimal) -> Payment {
    Payment {
        id: Uuid::new_v4(),
        group_expense_id: expense.id,
        payer_id,
        amount,
        method: PaymentMethod::Cash,
        notes: None,
        created_at: Utc::now(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// For any policy and any fill level, slot percentages sum to 100
    /// within the 0.01 tolerance.
    #[test]
    fn prop_percentage_sum_is_hundred(
        total in total_amount(),
        count in 2u32..=12,
        joined_fraction in 0u32..=100,
        policy in split_policy(),
    ) {
        let joined = (count - 1) * joined_fraction / 100;
        let expense = make_expense(total, count, joined, policy);
        let breakdown = SplitCalculator::compute_shares(&expense, &[]);

        let sum: Decimal = breakdown.slots.iter().map(|s| s.percentage).sum();
        prop_assert!(
            (Decimal::ONE_HUNDRED - sum).abs() <= Decimal::new(1, 2),
            "percentages sum to {sum}, expected ~100"
        );
    }

    /// Equal split gives every slot exactly 100/N.
    #[test]
    fn prop_equal_split_symmetry(
        total in total_amount(),
        count in 2u32..=12,
    ) {
        let expense = make_expense(total, count, 0, SplitPolicy::Equal);
        let breakdown = SplitCalculator::compute_shares(&expense, &[]);

        let each = Decimal::ONE_HUNDRED / Decimal::from(count);
        for slot in &breakdown.slots {
            prop_assert_eq!(slot.percentage, each);
        }
    }

    /// Remaining is never negative and completion percentages stay in
    /// [0, 100], no matter how payments pile up.
    #[test]
    fn prop_remaining_and_completion_bounded(
        total in total_amount(),
        count in 2u32..=8,
        amounts in prop::collection::vec(payment_amount(), 0..6),
    ) {
        let expense = make_expense(total, count, count - 1, SplitPolicy::Equal);
        let payments: Vec<Payment> = amounts
            .iter()
            .enumerate()
            .map(|(i, amount)| {
                let payer = if i % 2 == 0 {
                    expense.owner_id
                } else {
                    expense.participants[i % expense.participants.len()].user_id
                };
                make_payment(&expense, payer, *amount)
            })
            .collect();

        let breakdown = SplitCalculator::compute_shares(&expense, &payments);
        for slot in &breakdown.slots {
            prop_assert!(slot.remaining >= Decimal::ZERO);
            prop_assert!(slot.completion_percent >= Decimal::ZERO);
            prop_assert!(slot.completion_percent <= Decimal::ONE_HUNDRED);
        }
        prop_assert!(breakdown.overall_completion_percent >= Decimal::ZERO);
        prop_assert!(breakdown.overall_completion_percent <= Decimal::ONE_HUNDRED);
    }

    /// Any single submission above the payer's expected share is rejected.
    #[test]
    fn prop_share_cap_rejects_excess(
        total in total_amount(),
        count in 2u32..=8,
        excess in payment_amount(),
    ) {
        let expense = make_expense(total, count, 0, SplitPolicy::Equal);
        let breakdown = SplitCalculator::compute_shares(&expense, &[]);
        let share = breakdown.slots[0].expected_share;

        let result =
            SplitCalculator::validate_payment(&expense, expense.owner_id, share + excess, &[]);
        prop_assert_eq!(result, Err(SplitError::ExceedsShare { share }));
    }

    /// Joining succeeds exactly participant_count - 1 times, then rejects
    /// with GroupFull.
    #[test]
    fn prop_join_capacity(count in 2u32..=10) {
        let mut expense = make_expense(Decimal::ONE_HUNDRED, count, 0, SplitPolicy::Equal);

        for _ in 0..count - 1 {
            let requester = Uuid::new_v4();
            let updated = SplitCalculator::join_group(&expense, requester);
            prop_assert!(updated.is_ok());
            expense.participants.push(Participant {
                user_id: requester,
                display_name: "joined".to_string(),
            });
        }

        prop_assert_eq!(
            SplitCalculator::join_group(&expense, Uuid::new_v4()),
            Err(SplitError::GroupFull)
        );
    }

    /// compute_shares is a pure function: identical inputs, identical output.
    #[test]
    fn prop_compute_shares_idempotent(
        total in total_amount(),
        count in 2u32..=8,
        policy in split_policy(),
        amounts in prop::collection::vec(payment_amount(), 0..4),
    ) {
        let expense = make_expense(total, count, count - 1, policy);
        let payments: Vec<Payment> = amounts
            .iter()
            .map(|amount| make_payment(&expense, expense.owner_id, *amount))
            .collect();

        let first = SplitCalculator::compute_shares(&expense, &payments);
        let second = SplitCalculator::compute_shares(&expense, &payments);
        prop_assert_eq!(first, second);
    }
}
