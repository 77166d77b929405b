//! Group-expense repository for shared-bill database operations.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::entities::{
    group_expense_participants, group_expenses, payments,
    sea_orm_active_enums::SplitPolicy as DbSplitPolicy, users,
};
use wais_core::split::{GroupExpense, Participant, SplitCalculator, SplitError, SplitPolicy};
use wais_shared::Percent;

/// Characters used for join codes (original client convention: 6 of A-Z/0-9).
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CODE_LENGTH: usize = 6;
const CODE_ATTEMPTS: usize = 5;

/// Error types for group-expense operations.
#[derive(Debug, thiserror::Error)]
pub enum GroupExpenseError {
    /// Group expense not found.
    #[error("Group expense not found: {0}")]
    NotFound(Uuid),

    /// No group expense with this join code.
    #[error("No group expense found for code {0}")]
    JoinCodeNotFound(String),

    /// Referenced user does not exist.
    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    /// Only the owner may modify or delete an expense.
    #[error("Only the owner can modify this group expense")]
    NotOwner,

    /// Expenses with recorded payments can never be deleted.
    #[error("Group expense has payments and cannot be deleted")]
    HasPayments,

    /// Participant count must be at least 2.
    #[error("Participant count must be at least 2, got {0}")]
    InvalidParticipantCount(u32),

    /// Total amount must be positive.
    #[error("Total amount must be positive")]
    NonPositiveAmount,

    /// Percentage shares must sum to 100 within tolerance.
    #[error("Owner and other shares must sum to 100")]
    InvalidSplitShares,

    /// Could not allocate a unique join code.
    #[error("Could not allocate a unique join code")]
    JoinCodeCollision,

    /// Split validation rejection.
    #[error(transparent)]
    Split(#[from] SplitError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a group expense.
#[derive(Debug, Clone)]
pub struct CreateGroupExpenseInput {
    /// User creating the expense.
    pub owner_id: Uuid,
    /// Display title.
    pub title: String,
    /// Full bill amount.
    pub total_amount: Decimal,
    /// Total number of slots, owner included.
    pub participant_count: u32,
    /// Split policy.
    pub split_policy: SplitPolicy,
    /// First day the expense covers.
    pub start_date: chrono::NaiveDate,
    /// Optional last day the expense covers.
    pub end_date: Option<chrono::NaiveDate>,
}

/// Input for owner mutations of a group expense.
#[derive(Debug, Clone, Default)]
pub struct UpdateGroupExpenseInput {
    /// New title.
    pub title: Option<String>,
    /// New total amount.
    pub total_amount: Option<Decimal>,
    /// New split policy.
    pub split_policy: Option<SplitPolicy>,
    /// New start date.
    pub start_date: Option<chrono::NaiveDate>,
    /// New end date (outer `None` = unchanged, inner `None` = cleared).
    pub end_date: Option<Option<chrono::NaiveDate>>,
}

/// Outcome of a successful join.
#[derive(Debug, Clone)]
pub struct JoinedGroup {
    /// The expense that was joined.
    pub group_expense_id: Uuid,
    /// Updated non-owner participant IDs, requester included.
    pub participant_ids: Vec<Uuid>,
}

/// Group-expense repository for CRUD, join, and hydration operations.
#[derive(Debug, Clone)]
pub struct GroupExpenseRepository {
    db: DatabaseConnection,
}

impl GroupExpenseRepository {
    /// Creates a new group-expense repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a new group expense with a freshly generated join code.
    ///
    /// # Errors
    ///
    /// Returns an error if the input fails validation, the owner does not
    /// exist, a unique join code cannot be allocated, or the database
    /// operation fails.
    pub async fn create(
        &self,
        input: CreateGroupExpenseInput,
    ) -> Result<group_expenses::Model, GroupExpenseError> {
        if input.participant_count < 2 {
            return Err(GroupExpenseError::InvalidParticipantCount(
                input.participant_count,
            ));
        }
        if input.total_amount <= Decimal::ZERO {
            return Err(GroupExpenseError::NonPositiveAmount);
        }
        let (db_policy, owner_share, other_share) = split_policy_columns(input.split_policy)?;

        users::Entity::find_by_id(input.owner_id)
            .one(&self.db)
            .await?
            .ok_or(GroupExpenseError::UserNotFound(input.owner_id))?;

        let join_code = self.allocate_join_code().await?;
        let now = Utc::now();
        let participant_count = i32::try_from(input.participant_count)
            .map_err(|_| GroupExpenseError::InvalidParticipantCount(input.participant_count))?;

        let expense = group_expenses::ActiveModel {
            id: Set(Uuid::new_v4()),
            owner_id: Set(input.owner_id),
            title: Set(input.title),
            total_amount: Set(input.total_amount),
            participant_count: Set(participant_count),
            split_policy: Set(db_policy),
            owner_share: Set(owner_share),
            other_share: Set(other_share),
            join_code: Set(join_code),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&self.db)
        .await?;

        info!(expense_id = %expense.id, join_code = %expense.join_code, "Created group expense");
        Ok(expense)
    }

    /// Finds a group expense by ID.
    ///
    /// # Errors
    ///
    /// Returns `GroupExpenseError::NotFound` if no row exists.
    pub async fn find_by_id(&self, id: Uuid) -> Result<group_expenses::Model, GroupExpenseError> {
        group_expenses::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(GroupExpenseError::NotFound(id))
    }

    /// Finds a group expense by its join code.
    ///
    /// # Errors
    ///
    /// Returns `GroupExpenseError::JoinCodeNotFound` if the code resolves
    /// to nothing.
    pub async fn find_by_join_code(
        &self,
        code: &str,
    ) -> Result<group_expenses::Model, GroupExpenseError> {
        let normalized = code.trim().to_uppercase();
        group_expenses::Entity::find()
            .filter(group_expenses::Column::JoinCode.eq(normalized.clone()))
            .one(&self.db)
            .await?
            .ok_or(GroupExpenseError::JoinCodeNotFound(normalized))
    }

    /// Lists the expenses a user owns or has joined, newest first.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<group_expenses::Model>, GroupExpenseError> {
        let owned = group_expenses::Entity::find()
            .filter(group_expenses::Column::OwnerId.eq(user_id))
            .all(&self.db)
            .await?;

        let joined_ids: Vec<Uuid> = group_expense_participants::Entity::find()
            .filter(group_expense_participants::Column::UserId.eq(user_id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|p| p.group_expense_id)
            .collect();

        let joined = if joined_ids.is_empty() {
            Vec::new()
        } else {
            group_expenses::Entity::find()
                .filter(group_expenses::Column::Id.is_in(joined_ids))
                .all(&self.db)
                .await?
        };

        let mut expenses = owned;
        expenses.extend(joined);
        expenses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(expenses)
    }

    /// Hydrates the domain `GroupExpense` for the calculator: expense row,
    /// owner display name, and joined participants with display names.
    ///
    /// # Errors
    ///
    /// Returns an error if the expense or a referenced user is missing.
    pub async fn load_for_split(&self, id: Uuid) -> Result<GroupExpense, GroupExpenseError> {
        let model = self.find_by_id(id).await?;
        hydrate(&self.db, model).await
    }

    /// Joins the expense behind a join code.
    ///
    /// The expense row is locked `FOR UPDATE` inside the transaction, so
    /// concurrent joins for the same expense serialize: the second one
    /// blocks until the first commits and then sees its membership row in
    /// the capacity check.
    ///
    /// # Errors
    ///
    /// Returns `GroupExpenseError::JoinCodeNotFound` for unknown codes and
    /// propagates `SplitError` rejections (already owner, already joined,
    /// group full).
    pub async fn join(
        &self,
        code: &str,
        requester_id: Uuid,
    ) -> Result<JoinedGroup, GroupExpenseError> {
        let normalized = code.trim().to_uppercase();

        users::Entity::find_by_id(requester_id)
            .one(&self.db)
            .await?
            .ok_or(GroupExpenseError::UserNotFound(requester_id))?;

        let txn = self.db.begin().await?;

        let model = find_by_join_code_locked(&normalized)
            .one(&txn)
            .await?
            .ok_or(GroupExpenseError::JoinCodeNotFound(normalized))?;
        let expense = hydrate(&txn, model).await?;

        let participant_ids = SplitCalculator::join_group(&expense, requester_id)?;

        group_expense_participants::ActiveModel {
            group_expense_id: Set(expense.id),
            user_id: Set(requester_id),
            joined_at: Set(Utc::now().into()),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        info!(expense_id = %expense.id, user_id = %requester_id, "User joined group expense");
        Ok(JoinedGroup {
            group_expense_id: expense.id,
            participant_ids,
        })
    }

    /// Applies an owner mutation (title, amount, dates, split policy).
    ///
    /// # Errors
    ///
    /// Returns `GroupExpenseError::NotOwner` if the actor does not own the
    /// expense, or a validation error for bad amounts/shares.
    pub async fn update(
        &self,
        id: Uuid,
        actor_id: Uuid,
        input: UpdateGroupExpenseInput,
    ) -> Result<group_expenses::Model, GroupExpenseError> {
        let model = self.find_by_id(id).await?;
        if model.owner_id != actor_id {
            return Err(GroupExpenseError::NotOwner);
        }

        let mut active: group_expenses::ActiveModel = model.into();
        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(amount) = input.total_amount {
            if amount <= Decimal::ZERO {
                return Err(GroupExpenseError::NonPositiveAmount);
            }
            active.total_amount = Set(amount);
        }
        if let Some(policy) = input.split_policy {
            let (db_policy, owner_share, other_share) = split_policy_columns(policy)?;
            active.split_policy = Set(db_policy);
            active.owner_share = Set(owner_share);
            active.other_share = Set(other_share);
        }
        if let Some(start_date) = input.start_date {
            active.start_date = Set(start_date);
        }
        if let Some(end_date) = input.end_date {
            active.end_date = Set(end_date);
        }
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Deletes an expense if the actor owns it and no payments exist.
    ///
    /// # Errors
    ///
    /// Returns `GroupExpenseError::HasPayments` while any payment row
    /// references the expense.
    pub async fn delete(&self, id: Uuid, actor_id: Uuid) -> Result<(), GroupExpenseError> {
        let model = self.find_by_id(id).await?;
        if model.owner_id != actor_id {
            return Err(GroupExpenseError::NotOwner);
        }

        let payment_count = payments::Entity::find()
            .filter(payments::Column::GroupExpenseId.eq(id))
            .count(&self.db)
            .await?;
        if payment_count > 0 {
            return Err(GroupExpenseError::HasPayments);
        }

        group_expenses::Entity::delete_by_id(id).exec(&self.db).await?;
        info!(expense_id = %id, "Deleted group expense");
        Ok(())
    }

    /// Generates join codes until one is free, giving up after a few tries.
    async fn allocate_join_code(&self) -> Result<String, GroupExpenseError> {
        for _ in 0..CODE_ATTEMPTS {
            let code = generate_join_code();
            let taken = group_expenses::Entity::find()
                .filter(group_expenses::Column::JoinCode.eq(code.clone()))
                .one(&self.db)
                .await?
                .is_some();
            if !taken {
                return Ok(code);
            }
            debug!(code = %code, "Join code collision, retrying");
        }
        Err(GroupExpenseError::JoinCodeCollision)
    }
}

/// Join-code lookup with an exclusive row lock, for the join transaction.
fn find_by_join_code_locked(code: &str) -> Select<group_expenses::Entity> {
    group_expenses::Entity::find()
        .filter(group_expenses::Column::JoinCode.eq(code))
        .lock_exclusive()
}

/// Generates a random 6-character join code from A-Z/0-9.
fn generate_join_code() -> String {
    use rand::Rng;
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| {
            let idx = rng.random_range(0..CODE_ALPHABET.len());
            char::from(CODE_ALPHABET[idx])
        })
        .collect()
}

/// Maps a domain split policy onto the three storage columns.
fn split_policy_columns(
    policy: SplitPolicy,
) -> Result<(DbSplitPolicy, Option<Decimal>, Option<Decimal>), GroupExpenseError> {
    match policy {
        SplitPolicy::Equal => Ok((DbSplitPolicy::Equal, None, None)),
        SplitPolicy::Percentage {
            owner_share,
            other_share,
        } => {
            let sum = owner_share.value() + other_share.value();
            if (Decimal::ONE_HUNDRED - sum).abs() > Decimal::new(1, 2) {
                return Err(GroupExpenseError::InvalidSplitShares);
            }
            Ok((
                DbSplitPolicy::Percentage,
                Some(owner_share.value()),
                Some(other_share.value()),
            ))
        }
    }
}

/// Loads owner and participant display names and builds the domain type.
async fn hydrate<C: ConnectionTrait>(
    conn: &C,
    model: group_expenses::Model,
) -> Result<GroupExpense, GroupExpenseError> {
    let owner = users::Entity::find_by_id(model.owner_id)
        .one(conn)
        .await?
        .ok_or(GroupExpenseError::UserNotFound(model.owner_id))?;

    let memberships = group_expense_participants::Entity::find()
        .filter(group_expense_participants::Column::GroupExpenseId.eq(model.id))
        .order_by_asc(group_expense_participants::Column::JoinedAt)
        .all(conn)
        .await?;

    let mut participants = Vec::with_capacity(memberships.len());
    for membership in memberships {
        let user = users::Entity::find_by_id(membership.user_id)
            .one(conn)
            .await?
            .ok_or(GroupExpenseError::UserNotFound(membership.user_id))?;
        participants.push(Participant {
            user_id: user.id,
            display_name: user.username,
        });
    }

    let split_policy = match model.split_policy {
        DbSplitPolicy::Equal => SplitPolicy::Equal,
        DbSplitPolicy::Percentage => SplitPolicy::Percentage {
            owner_share: Percent::new(model.owner_share.unwrap_or_default())
                .map_err(|_| GroupExpenseError::InvalidSplitShares)?,
            other_share: Percent::new(model.other_share.unwrap_or_default())
                .map_err(|_| GroupExpenseError::InvalidSplitShares)?,
        },
    };

    Ok(GroupExpense {
        id: model.id,
        owner_id: model.owner_id,
        owner_name: owner.username,
        title: model.title,
        total_amount: model.total_amount,
        participant_count: u32::try_from(model.participant_count).unwrap_or(0),
        participants,
        split_policy,
        join_code: model.join_code,
        start_date: model.start_date,
        end_date: model.end_date,
        created_at: model.created_at.with_timezone(&Utc),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_generate_join_code_shape() {
        let code = generate_join_code();
        assert_eq!(code.len(), CODE_LENGTH);
        assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_join_lookup_locks_expense_row() {
        use sea_orm::{DbBackend, QueryTrait};

        let sql = find_by_join_code_locked("AAAAAA")
            .build(DbBackend::Postgres)
            .to_string();
        assert!(sql.ends_with("FOR UPDATE"), "missing row lock: {sql}");
    }

    #[test]
    fn test_split_policy_columns_equal() {
        let (policy, owner, other) = split_policy_columns(SplitPolicy::Equal).unwrap();
        assert_eq!(policy, DbSplitPolicy::Equal);
        assert!(owner.is_none());
        assert!(other.is_none());
    }

    #[test]
    fn test_split_policy_columns_percentage() {
        let policy = SplitPolicy::Percentage {
            owner_share: Percent::new(dec!(60)).unwrap(),
            other_share: Percent::new(dec!(40)).unwrap(),
        };
        let (db_policy, owner, other) = split_policy_columns(policy).unwrap();
        assert_eq!(db_policy, DbSplitPolicy::Percentage);
        assert_eq!(owner, Some(dec!(60)));
        assert_eq!(other, Some(dec!(40)));
    }

    #[test]
    fn test_split_policy_columns_rejects_bad_sum() {
        let policy = SplitPolicy::Percentage {
            owner_share: Percent::new(dec!(60)).unwrap(),
            other_share: Percent::new(dec!(60)).unwrap(),
        };
        assert!(matches!(
            split_policy_columns(policy),
            Err(GroupExpenseError::InvalidSplitShares)
        ));
    }
}
