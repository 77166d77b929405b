//! Group-expense routes: create, list, breakdown, join, pay, update, delete.
//!
//! Handlers are thin: they fetch through the repositories, run the split
//! calculator, and map domain rejections onto the shared error taxonomy.
//! Identity comes from the request payloads; authentication is handled by
//! an external collaborator in front of this service.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::AppState;
use wais_core::split::{
    Payment, PaymentMethod, ShareBreakdown, SplitCalculator, SplitError, SplitPolicy,
};
use wais_db::repositories::{
    CreateGroupExpenseInput, GroupExpenseError, GroupExpenseRepository, PaymentError,
    PaymentRepository, RecordPaymentInput, UpdateGroupExpenseInput,
};
use wais_shared::{AppError, Percent};

/// Creates the group-expense routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/group-expenses", post(create_group_expense))
        .route("/group-expenses/join", post(join_group_expense))
        .route("/group-expenses/{id}", put(update_group_expense))
        .route("/group-expenses/{id}", delete(delete_group_expense))
        .route("/group-expenses/{id}/breakdown", get(get_breakdown))
        .route("/group-expenses/{id}/payments", post(submit_payment))
        .route("/users/{user_id}/group-expenses", get(list_group_expenses))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Split policy selector on create/update requests.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitPolicyKind {
    /// Equal split.
    Equal,
    /// Percentage split (requires owner/other shares).
    Percentage,
}

/// Request body for creating a group expense.
#[derive(Debug, Deserialize)]
pub struct CreateGroupExpenseRequest {
    /// User creating the expense.
    pub owner_id: Uuid,
    /// Display title.
    pub title: String,
    /// Full bill amount.
    pub total_amount: Decimal,
    /// Total number of slots, owner included.
    pub participant_count: u32,
    /// Split policy: equal or percentage.
    pub split_policy: SplitPolicyKind,
    /// Owner's percentage; accepts `60` or `"60%"`.
    pub owner_share: Option<Percent>,
    /// Combined non-owner percentage; accepts `40` or `"40%"`.
    pub other_share: Option<Percent>,
    /// First day the expense covers.
    pub start_date: NaiveDate,
    /// Optional last day the expense covers.
    pub end_date: Option<NaiveDate>,
}

/// Request body for updating a group expense (owner only).
#[derive(Debug, Deserialize)]
pub struct UpdateGroupExpenseRequest {
    /// Acting user; must be the owner.
    pub actor_id: Uuid,
    /// New title.
    pub title: Option<String>,
    /// New total amount.
    pub total_amount: Option<Decimal>,
    /// New split policy.
    pub split_policy: Option<SplitPolicyKind>,
    /// Owner's percentage for a percentage policy.
    pub owner_share: Option<Percent>,
    /// Combined non-owner percentage for a percentage policy.
    pub other_share: Option<Percent>,
    /// New start date.
    pub start_date: Option<NaiveDate>,
    /// New end date; `null` clears it, absent leaves it unchanged.
    #[serde(default, deserialize_with = "double_option")]
    pub end_date: Option<Option<NaiveDate>>,
}

/// Request body for joining via a shared code.
#[derive(Debug, Deserialize)]
pub struct JoinGroupExpenseRequest {
    /// User requesting to join.
    pub requester_id: Uuid,
    /// The expense's join code.
    pub join_code: String,
}

/// Request body for submitting a payment.
#[derive(Debug, Deserialize)]
pub struct SubmitPaymentRequest {
    /// Paying participant.
    pub payer_id: Uuid,
    /// Amount paid.
    pub amount: Decimal,
    /// Payment method.
    pub method: PaymentMethod,
    /// Optional reference notes.
    pub notes: Option<String>,
}

/// Query parameters naming the acting user.
#[derive(Debug, Deserialize)]
pub struct ActorQuery {
    /// Acting user.
    pub user_id: Uuid,
}

/// Response for a single group expense.
#[derive(Debug, Serialize)]
pub struct GroupExpenseResponse {
    /// Expense ID.
    pub id: Uuid,
    /// Owner's user ID.
    pub owner_id: Uuid,
    /// Display title.
    pub title: String,
    /// Full bill amount.
    pub total_amount: Decimal,
    /// Total number of slots.
    pub participant_count: i32,
    /// Join code other participants use.
    pub join_code: String,
    /// First day the expense covers.
    pub start_date: NaiveDate,
    /// Optional last day the expense covers.
    pub end_date: Option<NaiveDate>,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
}

/// Summary row for the list view.
#[derive(Debug, Serialize)]
pub struct GroupExpenseSummary {
    /// Expense ID.
    pub id: Uuid,
    /// Display title.
    pub title: String,
    /// Full bill amount.
    pub total_amount: Decimal,
    /// Total number of slots.
    pub participant_count: u32,
    /// Slots filled so far, owner included.
    pub joined_count: usize,
    /// Join code.
    pub join_code: String,
    /// Sum of every payment.
    pub total_paid: Decimal,
    /// Overall completion, clamped to [0, 100].
    pub overall_completion_percent: Decimal,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
}

/// Response for the settlement breakdown of one expense.
#[derive(Debug, Serialize)]
pub struct BreakdownResponse {
    /// Expense ID.
    pub group_expense_id: Uuid,
    /// Display title.
    pub title: String,
    /// Full bill amount.
    pub total_amount: Decimal,
    /// Per-slot and aggregate settlement figures.
    #[serde(flatten)]
    pub breakdown: ShareBreakdown,
}

/// Response after a payment is accepted.
#[derive(Debug, Serialize)]
pub struct PaymentAcceptedResponse {
    /// The recorded payment.
    pub payment: Payment,
    /// Advisory overpayment warning, when the submission exceeded the
    /// remaining balance.
    pub warning: Option<String>,
    /// Updated settlement figures.
    #[serde(flatten)]
    pub breakdown: ShareBreakdown,
}

// ============================================================================
// Error Mapping
// ============================================================================

/// Renders an `AppError` as the standard error body.
fn error_response(err: &AppError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({
            "error": err.error_code(),
            "message": err.to_string(),
        })),
    )
        .into_response()
}

fn map_split_error(err: &SplitError) -> AppError {
    match err {
        SplitError::InvalidAmount => AppError::Validation(err.to_string()),
        SplitError::ExceedsShare { .. } | SplitError::GroupFull => {
            AppError::BusinessRule(err.to_string())
        }
        SplitError::NotParticipant(_) => AppError::Forbidden(err.to_string()),
        SplitError::AlreadyOwner | SplitError::AlreadyJoined => AppError::Conflict(err.to_string()),
    }
}

fn map_expense_error(err: &GroupExpenseError) -> AppError {
    match err {
        GroupExpenseError::NotFound(_)
        | GroupExpenseError::JoinCodeNotFound(_)
        | GroupExpenseError::UserNotFound(_) => AppError::NotFound(err.to_string()),
        GroupExpenseError::NotOwner => AppError::Forbidden(err.to_string()),
        GroupExpenseError::HasPayments => AppError::BusinessRule(err.to_string()),
        GroupExpenseError::InvalidParticipantCount(_)
        | GroupExpenseError::NonPositiveAmount
        | GroupExpenseError::InvalidSplitShares => AppError::Validation(err.to_string()),
        GroupExpenseError::JoinCodeCollision => AppError::Conflict(err.to_string()),
        GroupExpenseError::Split(split) => map_split_error(split),
        GroupExpenseError::Database(e) => {
            error!(error = %e, "Group-expense database operation failed");
            AppError::Database("An error occurred".to_string())
        }
    }
}

fn map_payment_error(err: &PaymentError) -> AppError {
    match err {
        PaymentError::Database(e) => {
            error!(error = %e, "Payment database operation failed");
            AppError::Database("An error occurred".to_string())
        }
    }
}

/// Builds the domain split policy from the request fields.
fn resolve_split_policy(
    kind: SplitPolicyKind,
    owner_share: Option<Percent>,
    other_share: Option<Percent>,
) -> Result<SplitPolicy, AppError> {
    match kind {
        SplitPolicyKind::Equal => Ok(SplitPolicy::Equal),
        SplitPolicyKind::Percentage => {
            let (Some(owner_share), Some(other_share)) = (owner_share, other_share) else {
                return Err(AppError::Validation(
                    "owner_share and other_share are required for a percentage split".to_string(),
                ));
            };
            Ok(SplitPolicy::Percentage {
                owner_share,
                other_share,
            })
        }
    }
}

/// Deserializes a doubly-optional field, distinguishing absent from null.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/group-expenses` - Create a group expense.
async fn create_group_expense(
    State(state): State<AppState>,
    Json(request): Json<CreateGroupExpenseRequest>,
) -> Response {
    let split_policy = match resolve_split_policy(
        request.split_policy,
        request.owner_share,
        request.other_share,
    ) {
        Ok(policy) => policy,
        Err(err) => return error_response(&err),
    };

    let repo = GroupExpenseRepository::new((*state.db).clone());
    let input = CreateGroupExpenseInput {
        owner_id: request.owner_id,
        title: request.title,
        total_amount: request.total_amount,
        participant_count: request.participant_count,
        split_policy,
        start_date: request.start_date,
        end_date: request.end_date,
    };

    match repo.create(input).await {
        Ok(expense) => (
            StatusCode::CREATED,
            Json(GroupExpenseResponse {
                id: expense.id,
                owner_id: expense.owner_id,
                title: expense.title,
                total_amount: expense.total_amount,
                participant_count: expense.participant_count,
                join_code: expense.join_code,
                start_date: expense.start_date,
                end_date: expense.end_date,
                created_at: expense.created_at.to_rfc3339(),
            }),
        )
            .into_response(),
        Err(err) => error_response(&map_expense_error(&err)),
    }
}

/// GET `/users/{user_id}/group-expenses` - List a user's expenses with
/// overall completion, newest first.
async fn list_group_expenses(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Response {
    let expense_repo = GroupExpenseRepository::new((*state.db).clone());
    let payment_repo = PaymentRepository::new((*state.db).clone());

    let models = match expense_repo.list_for_user(user_id).await {
        Ok(models) => models,
        Err(err) => return error_response(&map_expense_error(&err)),
    };

    let mut summaries = Vec::with_capacity(models.len());
    for model in models {
        let expense = match expense_repo.load_for_split(model.id).await {
            Ok(expense) => expense,
            Err(err) => return error_response(&map_expense_error(&err)),
        };
        let payments = match payment_repo.list_for_expense(expense.id).await {
            Ok(payments) => payments,
            Err(err) => return error_response(&map_payment_error(&err)),
        };
        let breakdown = SplitCalculator::compute_shares(&expense, &payments);

        summaries.push(GroupExpenseSummary {
            id: expense.id,
            title: expense.title,
            total_amount: expense.total_amount,
            participant_count: expense.participant_count,
            joined_count: expense.participants.len() + 1,
            join_code: expense.join_code,
            total_paid: breakdown.total_paid,
            overall_completion_percent: breakdown.overall_completion_percent,
            created_at: expense.created_at.to_rfc3339(),
        });
    }

    (StatusCode::OK, Json(summaries)).into_response()
}

/// GET `/group-expenses/{id}/breakdown` - Per-slot settlement figures.
async fn get_breakdown(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    let expense_repo = GroupExpenseRepository::new((*state.db).clone());
    let payment_repo = PaymentRepository::new((*state.db).clone());

    let expense = match expense_repo.load_for_split(id).await {
        Ok(expense) => expense,
        Err(err) => return error_response(&map_expense_error(&err)),
    };
    let payments = match payment_repo.list_for_expense(id).await {
        Ok(payments) => payments,
        Err(err) => return error_response(&map_payment_error(&err)),
    };

    let breakdown = SplitCalculator::compute_shares(&expense, &payments);
    (
        StatusCode::OK,
        Json(BreakdownResponse {
            group_expense_id: expense.id,
            title: expense.title,
            total_amount: expense.total_amount,
            breakdown,
        }),
    )
        .into_response()
}

/// POST `/group-expenses/join` - Join an expense via its code.
async fn join_group_expense(
    State(state): State<AppState>,
    Json(request): Json<JoinGroupExpenseRequest>,
) -> Response {
    let repo = GroupExpenseRepository::new((*state.db).clone());

    match repo.join(&request.join_code, request.requester_id).await {
        Ok(joined) => (
            StatusCode::OK,
            Json(json!({
                "group_expense_id": joined.group_expense_id,
                "participant_ids": joined.participant_ids,
            })),
        )
            .into_response(),
        Err(err) => error_response(&map_expense_error(&err)),
    }
}

/// POST `/group-expenses/{id}/payments` - Validate and record a payment,
/// returning the updated breakdown.
async fn submit_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SubmitPaymentRequest>,
) -> Response {
    let expense_repo = GroupExpenseRepository::new((*state.db).clone());
    let payment_repo = PaymentRepository::new((*state.db).clone());

    let expense = match expense_repo.load_for_split(id).await {
        Ok(expense) => expense,
        Err(err) => return error_response(&map_expense_error(&err)),
    };
    let payments = match payment_repo.list_for_expense(id).await {
        Ok(payments) => payments,
        Err(err) => return error_response(&map_payment_error(&err)),
    };

    let check = match SplitCalculator::validate_payment(
        &expense,
        request.payer_id,
        request.amount,
        &payments,
    ) {
        Ok(check) => check,
        Err(err) => return error_response(&map_split_error(&err)),
    };

    let warning = check.overpayment.map(|over| {
        format!(
            "You're paying {over} more than your remaining balance of {}",
            check.remaining
        )
    });

    let recorded = payment_repo
        .record(RecordPaymentInput {
            group_expense_id: expense.id,
            payer_id: request.payer_id,
            amount: request.amount,
            method: request.method,
            notes: request.notes,
            expense_title: expense.title.clone(),
        })
        .await;
    let payment = match recorded {
        Ok(payment) => payment,
        Err(err) => return error_response(&map_payment_error(&err)),
    };

    // Re-read the ledger so the response reflects the new payment.
    let payments = match payment_repo.list_for_expense(id).await {
        Ok(payments) => payments,
        Err(err) => return error_response(&map_payment_error(&err)),
    };
    let breakdown = SplitCalculator::compute_shares(&expense, &payments);

    (
        StatusCode::CREATED,
        Json(PaymentAcceptedResponse {
            payment,
            warning,
            breakdown,
        }),
    )
        .into_response()
}

/// PUT `/group-expenses/{id}` - Owner mutation of title/amount/dates/split.
async fn update_group_expense(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateGroupExpenseRequest>,
) -> Response {
    let split_policy = match request.split_policy {
        Some(kind) => {
            match resolve_split_policy(kind, request.owner_share, request.other_share) {
                Ok(policy) => Some(policy),
                Err(err) => return error_response(&err),
            }
        }
        None => None,
    };

    let repo = GroupExpenseRepository::new((*state.db).clone());
    let input = UpdateGroupExpenseInput {
        title: request.title,
        total_amount: request.total_amount,
        split_policy,
        start_date: request.start_date,
        end_date: request.end_date,
    };

    match repo.update(id, request.actor_id, input).await {
        Ok(expense) => (
            StatusCode::OK,
            Json(GroupExpenseResponse {
                id: expense.id,
                owner_id: expense.owner_id,
                title: expense.title,
                total_amount: expense.total_amount,
                participant_count: expense.participant_count,
                join_code: expense.join_code,
                start_date: expense.start_date,
                end_date: expense.end_date,
                created_at: expense.created_at.to_rfc3339(),
            }),
        )
            .into_response(),
        Err(err) => error_response(&map_expense_error(&err)),
    }
}

/// DELETE `/group-expenses/{id}` - Owner delete, refused once payments exist.
async fn delete_group_expense(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(actor): Query<ActorQuery>,
) -> Response {
    let repo = GroupExpenseRepository::new((*state.db).clone());

    match repo.delete(id, actor.user_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(&map_expense_error(&err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(SplitError::InvalidAmount, 400)]
    #[case(SplitError::ExceedsShare { share: dec!(250) }, 422)]
    #[case(SplitError::GroupFull, 422)]
    #[case(SplitError::AlreadyOwner, 409)]
    #[case(SplitError::AlreadyJoined, 409)]
    #[case(SplitError::NotParticipant(Uuid::nil()), 403)]
    fn test_split_error_mapping(#[case] error: SplitError, #[case] status: u16) {
        assert_eq!(map_split_error(&error).status_code(), status);
    }

    #[test]
    fn test_expense_error_mapping() {
        assert_eq!(
            map_expense_error(&GroupExpenseError::NotFound(Uuid::new_v4())).status_code(),
            404
        );
        assert_eq!(
            map_expense_error(&GroupExpenseError::NotOwner).status_code(),
            403
        );
        assert_eq!(
            map_expense_error(&GroupExpenseError::HasPayments).status_code(),
            422
        );
        assert_eq!(
            map_expense_error(&GroupExpenseError::NonPositiveAmount).status_code(),
            400
        );
    }

    #[test]
    fn test_resolve_split_policy_requires_shares() {
        let result = resolve_split_policy(SplitPolicyKind::Percentage, None, None);
        assert!(result.is_err());

        let result = resolve_split_policy(
            SplitPolicyKind::Percentage,
            Some(Percent::new(dec!(60)).unwrap()),
            Some(Percent::new(dec!(40)).unwrap()),
        );
        assert!(matches!(result, Ok(SplitPolicy::Percentage { .. })));
    }

    #[tokio::test]
    async fn test_create_rejects_percentage_without_shares() {
        use std::sync::Arc;

        use axum::body::Body;
        use axum::http::{Request, header};
        use sea_orm::DatabaseConnection;
        use tower::ServiceExt;

        let app = routes().with_state(crate::AppState {
            db: Arc::new(DatabaseConnection::Disconnected),
        });

        // Share fields missing for a percentage policy: rejected before any
        // database access.
        let body = json!({
            "owner_id": Uuid::nil(),
            "title": "Road trip",
            "total_amount": "1000",
            "participant_count": 4,
            "split_policy": "percentage",
            "start_date": "2026-03-01",
        });

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/group-expenses")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
