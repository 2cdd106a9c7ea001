//! `DomainError` → HTTP status + envelope

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use super::ApiResponse;
use crate::domain::DomainError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        let status = match &e {
            DomainError::InvalidWindow { .. } => StatusCode::BAD_REQUEST,
            DomainError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
            DomainError::SlotConflict(_) => StatusCode::CONFLICT,
            DomainError::InvalidStateTransition { .. } => StatusCode::CONFLICT,
            DomainError::Unauthorized(_) => StatusCode::FORBIDDEN,
            DomainError::DependencyUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        if status == StatusCode::SERVICE_UNAVAILABLE {
            error!(error = %e, "Request failed on a dependency");
            // store details stay in the log
            return Self::new(status, "Service temporarily unavailable");
        }
        Self::new(status, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::<()>::error(self.message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_statuses() {
        let cases = [
            (DomainError::SlotConflict("x".into()), StatusCode::CONFLICT),
            (DomainError::not_found("Station", 1), StatusCode::NOT_FOUND),
            (DomainError::Unauthorized("x".into()), StatusCode::FORBIDDEN),
            (DomainError::Validation("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (
                DomainError::InvalidStateTransition {
                    entity: "Booking",
                    from: "cancelled".into(),
                    to: "cancelled".into(),
                },
                StatusCode::CONFLICT,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn dependency_failures_hide_details() {
        let e = ApiError::from(DomainError::DependencyUnavailable("sqlite: disk I/O".into()));
        assert_eq!(e.status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(!e.message.contains("sqlite"));
    }
}
