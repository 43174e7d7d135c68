use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::auth::jwt::JwtKeys;
use crate::auth::policy::Role;
use crate::error::ApiError;

/// Extracts and validates the bearer token, exposing the caller's resolved
/// identity and role to the handler. Rejections carry this API's historical
/// status mapping: 403 for a missing or unverifiable token; role checks
/// happen later, in the policy gate.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: i64,
    pub role: Role,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);

        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::AuthenticationRequired)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::AuthenticationRequired)?;

        let claims = match keys.verify(token) {
            Ok(c) => c,
            Err(_) => {
                warn!("invalid or expired token");
                return Err(ApiError::InvalidToken);
            }
        };

        Ok(AuthUser {
            user_id: claims.sub,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use axum::http::Request;

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/payments");
        if let Some(v) = value {
            builder = builder.header(axum::http::header::AUTHORIZATION, v);
        }
        let (parts, _) = builder.body(()).expect("request").into_parts();
        parts
    }

    #[tokio::test]
    async fn missing_header_is_authentication_required() {
        let state = AppState::fake();
        let mut parts = parts_with_auth(None);
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::AuthenticationRequired));
    }

    #[tokio::test]
    async fn non_bearer_scheme_is_authentication_required() {
        let state = AppState::fake();
        let mut parts = parts_with_auth(Some("Token abc"));
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::AuthenticationRequired));
    }

    #[tokio::test]
    async fn garbage_token_is_invalid_token() {
        let state = AppState::fake();
        let mut parts = parts_with_auth(Some("Bearer garbage"));
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidToken));
    }

    #[tokio::test]
    async fn valid_token_resolves_identity_and_role() {
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        let token = keys.sign(7, Role::Admin).expect("sign");

        let mut parts = parts_with_auth(Some(&format!("Bearer {token}")));
        let auth = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .expect("extract");
        assert_eq!(auth.user_id, 7);
        assert_eq!(auth.role, Role::Admin);
    }
}
