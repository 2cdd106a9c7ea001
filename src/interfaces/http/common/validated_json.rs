//! Validated JSON extractor for Axum
//!
//! `ValidatedJson<T>` works like `axum::Json<T>`, but additionally runs
//! `validator::Validate::validate()` on the deserialized value. Malformed
//! JSON is a 400; a body that parses but fails validation is a 422 listing
//! every failing field.

use axum::extract::FromRequest;
use axum::http::StatusCode;
use axum::Json;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use super::ApiError;

pub struct ValidatedJson<T>(pub T);

fn describe(errors: &ValidationErrors) -> String {
    let mut fields: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let msg = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                format!("{}: {}", field, msg)
            })
        })
        .collect();
    fields.sort();

    if fields.is_empty() {
        "Validation failed".to_string()
    } else {
        fields.join("; ")
    }
}

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: axum::extract::Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                ApiError::new(StatusCode::BAD_REQUEST, format!("Invalid JSON: {}", rejection))
            })?;

        value
            .validate()
            .map_err(|errors| ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, describe(&errors)))?;

        Ok(ValidatedJson(value))
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::post;
    use axum::Router;
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Debug, Deserialize, Validate)]
    struct Probe {
        #[validate(range(min = 1, message = "must be a positive id"))]
        station_id: i64,
    }

    async fn handler(ValidatedJson(body): ValidatedJson<Probe>) -> String {
        body.station_id.to_string()
    }

    async fn post_json(raw: &'static str) -> StatusCode {
        let app = Router::new().route("/probe", post(handler));
        let req = Request::builder()
            .method("POST")
            .uri("/probe")
            .header("content-type", "application/json")
            .body(Body::from(raw))
            .unwrap();
        app.oneshot(req).await.unwrap().status()
    }

    #[tokio::test]
    async fn statuses_by_failure_kind() {
        assert_eq!(post_json(r#"{"station_id": 4}"#).await, StatusCode::OK);
        assert_eq!(post_json("{not json").await, StatusCode::BAD_REQUEST);
        assert_eq!(post_json(r#"{"station_id": 0}"#).await, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
