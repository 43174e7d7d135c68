use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Every failure the API can report, in one place.
///
/// Status mapping is the historical one this API's clients rely on: missing
/// or unverifiable credentials are 403, a role mismatch is 401.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("token required")]
    AuthenticationRequired,
    #[error("invalid token")]
    InvalidToken,
    #[error("not authorized")]
    Forbidden,
    #[error("email already exist")]
    DuplicateEmail,
    #[error("wrong email or password")]
    InvalidCredentials,
    #[error("payment not found")]
    NotFound,
    // Not a fault: the update matched a row but changed nothing.
    #[error("payment not modified")]
    NotModified,
    #[error("payment delete failed")]
    DeactivationFailed(#[source] anyhow::Error),
    #[error("{context}")]
    Storage {
        context: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ApiError {
    pub fn storage(context: &'static str, source: anyhow::Error) -> Self {
        Self::Storage { context, source }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::AuthenticationRequired | Self::InvalidToken => StatusCode::FORBIDDEN,
            Self::Forbidden | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::DuplicateEmail => StatusCode::CONFLICT,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::NotModified => StatusCode::NOT_MODIFIED,
            Self::DeactivationFailed(_) | Self::Storage { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error = match &self {
            Self::DeactivationFailed(source) => Some(source.to_string()),
            Self::Storage { source, .. } => Some(source.to_string()),
            _ => None,
        };
        let body = ErrorBody {
            message: self.to_string(),
            error,
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn credential_failures_map_to_403() {
        assert_eq!(status_of(ApiError::AuthenticationRequired), StatusCode::FORBIDDEN);
        assert_eq!(status_of(ApiError::InvalidToken), StatusCode::FORBIDDEN);
    }

    #[test]
    fn role_mismatch_maps_to_401() {
        assert_eq!(status_of(ApiError::Forbidden), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn remaining_variants_keep_their_codes() {
        assert_eq!(status_of(ApiError::DuplicateEmail), StatusCode::CONFLICT);
        assert_eq!(status_of(ApiError::InvalidCredentials), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(ApiError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_of(ApiError::NotModified), StatusCode::NOT_MODIFIED);
        assert_eq!(
            status_of(ApiError::storage("payment fetch failed", anyhow::anyhow!("boom"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn storage_errors_carry_the_underlying_message() {
        let err = ApiError::storage("payment update failed", anyhow::anyhow!("pool timed out"));
        assert_eq!(err.to_string(), "payment update failed");
        let detail = match &err {
            ApiError::Storage { source, .. } => source.to_string(),
            _ => unreachable!(),
        };
        assert_eq!(detail, "pool timed out");
    }
}
