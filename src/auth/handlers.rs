use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest, TokenResponse},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        policy::Role,
        repo::{Login, User},
    },
    error::ApiError,
    state::AppState,
};

// Mounted under /api/users.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    match User::find_by_email(&state.db, &payload.email).await {
        Ok(Some(_)) => {
            warn!(email = %payload.email, "email already registered");
            return Err(ApiError::DuplicateEmail);
        }
        Ok(None) => {}
        Err(e) => {
            error!(error = %e, "find_by_email failed");
            return Err(ApiError::storage("user lookup failed", e));
        }
    }

    let hash = hash_password(&payload.password).map_err(|e| {
        error!(error = %e, "hash_password failed");
        ApiError::storage("user creation failed", e)
    })?;

    let role = payload.role.unwrap_or(Role::Usuario);
    let user = User::create(&state.db, &payload.name, &payload.email, &hash, role)
        .await
        .map_err(|e| {
            error!(error = %e, "create user failed");
            ApiError::storage("user creation failed", e)
        })?;

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    let user = match User::find_by_email(&state.db, &payload.email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(email = %payload.email, "login unknown email");
            return Err(ApiError::InvalidCredentials);
        }
        Err(e) => {
            error!(error = %e, "find_by_email failed");
            return Err(ApiError::storage("login failed", e));
        }
    };

    let ok = verify_password(&payload.password, &user.password_hash).map_err(|e| {
        error!(error = %e, "verify_password failed");
        ApiError::storage("login failed", e)
    })?;

    if !ok {
        warn!(email = %payload.email, user_id = user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id, user.role).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        ApiError::storage("login failed", e)
    })?;

    Login::record(&state.db, user.id).await.map_err(|e| {
        error!(error = %e, user_id = user.id, "login record failed");
        ApiError::storage("login failed", e)
    })?;

    info!(user_id = user.id, email = %user.email, "user logged in");
    Ok(Json(TokenResponse { token }))
}
