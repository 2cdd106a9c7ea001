//! Bearer-token authentication middleware for Axum
//!
//! Verifies the `Authorization: Bearer` credential through the configured
//! [`IdentityProvider`] and stores the resulting [`Identity`] in the request
//! extensions for handlers to pick up with `Extension<Identity>`.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::common::ApiError;
use crate::domain::{Identity, IdentityError, IdentityProvider, UserRole};

#[derive(Clone)]
pub struct AuthState {
    pub identities: Arc<dyn IdentityProvider>,
}

/// Extract token from Authorization header
fn extract_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub fn identity_rejection(e: IdentityError) -> ApiError {
    match e {
        IdentityError::Unavailable(_) => {
            ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "Identity service unavailable")
        }
        IdentityError::Disabled => ApiError::forbidden(e.to_string()),
        other => ApiError::unauthorized(other.to_string()),
    }
}

/// Authentication middleware - requires a verifiable bearer token
pub async fn auth_middleware(
    State(auth): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_token)
        .map(str::to_owned);

    let Some(token) = token else {
        return ApiError::unauthorized("Missing bearer token").into_response();
    };

    match auth.identities.verify(&token).await {
        Ok(identity) => {
            debug!(user_id = identity.user_id, role = %identity.role, "Request authenticated");
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(e) => identity_rejection(e).into_response(),
    }
}

/// Role gate used by handlers after authentication
pub fn require_role(identity: &Identity, allowed: &[UserRole]) -> Result<(), ApiError> {
    identity.require_role(allowed).map_err(ApiError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_prefix_is_required() {
        assert_eq!(extract_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_token("Basic abc"), None);
        assert_eq!(extract_token("Bearer   "), None);
    }

    #[test]
    fn rejection_statuses() {
        assert_eq!(identity_rejection(IdentityError::Expired).status, StatusCode::UNAUTHORIZED);
        assert_eq!(identity_rejection(IdentityError::Disabled).status, StatusCode::FORBIDDEN);
        assert_eq!(
            identity_rejection(IdentityError::Unavailable("db".into())).status,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
