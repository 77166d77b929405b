//! Payment repository for the append-only contribution ledger.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use crate::entities::{payments, transactions};
use wais_core::split::{Payment, PaymentMethod};

/// Category written on the payer's personal ledger row.
const LEDGER_CATEGORY: &str = "Group Expense";

/// Error types for payment operations.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for recording a validated payment.
#[derive(Debug, Clone)]
pub struct RecordPaymentInput {
    /// Expense being paid.
    pub group_expense_id: Uuid,
    /// Paying participant.
    pub payer_id: Uuid,
    /// Amount paid (already validated against the payer's share).
    pub amount: Decimal,
    /// Payment method.
    pub method: PaymentMethod,
    /// Optional reference notes.
    pub notes: Option<String>,
    /// Expense title, copied onto the payer's ledger row.
    pub expense_title: String,
}

/// Payment repository. Rows are append-only; there is no update or delete.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    db: DatabaseConnection,
}

impl PaymentRepository {
    /// Creates a new payment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists the full payment ledger for an expense, oldest first.
    pub async fn list_for_expense(
        &self,
        group_expense_id: Uuid,
    ) -> Result<Vec<Payment>, PaymentError> {
        let rows = payments::Entity::find()
            .filter(payments::Column::GroupExpenseId.eq(group_expense_id))
            .order_by_asc(payments::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(into_domain).collect())
    }

    /// Records a payment plus the payer's personal ledger row in one
    /// database transaction.
    ///
    /// The caller must have validated the amount with the split calculator
    /// first; this method only persists.
    pub async fn record(&self, input: RecordPaymentInput) -> Result<Payment, PaymentError> {
        let now = Utc::now();
        let txn = self.db.begin().await?;

        let payment = payments::ActiveModel {
            id: Set(Uuid::new_v4()),
            group_expense_id: Set(input.group_expense_id),
            payer_id: Set(input.payer_id),
            amount: Set(input.amount),
            method: Set(input.method.into()),
            notes: Set(input.notes),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;

        transactions::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(input.payer_id),
            title: Set(input.expense_title),
            category: Set(LEDGER_CATEGORY.to_string()),
            amount: Set(input.amount),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        info!(
            payment_id = %payment.id,
            expense_id = %payment.group_expense_id,
            amount = %payment.amount,
            "Recorded group-expense payment"
        );
        Ok(into_domain(payment))
    }
}

/// Converts a payment row into the domain type.
fn into_domain(model: payments::Model) -> Payment {
    Payment {
        id: model.id,
        group_expense_id: model.group_expense_id,
        payer_id: model.payer_id,
        amount: model.amount,
        method: model.method.into(),
        notes: model.notes,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
