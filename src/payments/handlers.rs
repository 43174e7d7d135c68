use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{post, put},
    Json, Router,
};
use tracing::{error, info, instrument};

use crate::{
    auth::extractors::AuthUser,
    auth::policy::{self, Action, Role},
    error::ApiError,
    payments::dto::{Confirmation, CreatePaymentRequest, ListQuery, UpdatePaymentRequest},
    payments::repo::{DeactivateOutcome, Payment, UpdateOutcome},
    state::AppState,
};

// Mounted under /api/payments.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_payment).get(list_payments))
        .route("/:id", put(update_payment).delete(delete_payment))
}

#[instrument(skip(state, payload))]
pub async fn create_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<Payment>), ApiError> {
    policy::authorize(Action::CreatePayment, auth.role)?;

    let payment = Payment::create(&state.db, &payload).await.map_err(|e| {
        error!(error = %e, "create payment failed");
        ApiError::storage("payment creation failed", e)
    })?;

    info!(payment_id = payment.id, user_id = payment.user_id, "payment created");
    Ok((StatusCode::CREATED, Json(payment)))
}

#[instrument(skip(state))]
pub async fn list_payments(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Payment>>, ApiError> {
    policy::authorize(Action::ListPayments, auth.role)?;

    let user_id = effective_user(auth.role, auth.user_id, query.user_id);
    let payments = Payment::list_active(&state.db, user_id)
        .await
        .map_err(|e| {
            error!(error = %e, %user_id, "list payments failed");
            ApiError::storage("payment fetch failed", e)
        })?;

    Ok(Json(payments))
}

/// A `usuario` only ever sees their own payments, whatever filter they ask
/// for. Other roles may list any user's payments and fall back to their own.
fn effective_user(role: Role, caller_id: i64, requested: Option<i64>) -> i64 {
    match role {
        Role::Usuario => caller_id,
        _ => requested.unwrap_or(caller_id),
    }
}

#[instrument(skip(state, changes))]
pub async fn update_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(changes): Json<UpdatePaymentRequest>,
) -> Result<Json<Confirmation>, ApiError> {
    policy::authorize(Action::UpdatePayment, auth.role)?;

    let outcome = Payment::update_fields(&state.db, id, &changes)
        .await
        .map_err(|e| {
            error!(error = %e, payment_id = id, "update payment failed");
            ApiError::storage("payment update failed", e)
        })?;

    match outcome {
        UpdateOutcome::Updated => {
            info!(payment_id = id, "payment updated");
            Ok(Json(Confirmation {
                message: "payment updated successfully",
            }))
        }
        UpdateOutcome::NotModified => Err(ApiError::NotModified),
        UpdateOutcome::NotFound => Err(ApiError::NotFound),
    }
}

#[instrument(skip(state))]
pub async fn delete_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Confirmation>, ApiError> {
    policy::authorize(Action::DeactivatePayment, auth.role)?;

    let outcome = Payment::deactivate(&state.db, id, auth.user_id)
        .await
        .map_err(|e| {
            error!(error = %e, payment_id = id, actor = auth.user_id, "deactivate payment failed");
            ApiError::DeactivationFailed(e)
        })?;

    match outcome {
        DeactivateOutcome::Deactivated => {
            info!(payment_id = id, actor = auth.user_id, "payment deactivated");
            Ok(Json(Confirmation {
                message: "payment deleted successfully",
            }))
        }
        DeactivateOutcome::NotFound => Err(ApiError::NotFound),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usuario_filter_is_always_ignored() {
        assert_eq!(effective_user(Role::Usuario, 1, Some(99)), 1);
        assert_eq!(effective_user(Role::Usuario, 1, None), 1);
    }

    #[test]
    fn admin_and_super_may_pick_a_user() {
        assert_eq!(effective_user(Role::Admin, 1, Some(99)), 99);
        assert_eq!(effective_user(Role::Super, 1, Some(99)), 99);
    }

    #[test]
    fn admin_defaults_to_their_own_payments() {
        assert_eq!(effective_user(Role::Admin, 1, None), 1);
    }
}
