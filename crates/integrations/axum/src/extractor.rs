//! Request body extractor for OTP handlers.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use otp_mailer_core::ServiceError;
use serde::de::DeserializeOwned;

use crate::ApiError;

/// JSON body extractor whose rejection is a JSON `ApiError`.
///
/// Axum's own `Json` rejects with a plain-text body; API clients expect
/// `{success: false, message}` for every failure.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(JsonBody(body): JsonBody<SendOtpRequest>) -> Response {
///     // ...
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(rejection_to_error(rejection)),
        }
    }
}

fn rejection_to_error(rejection: JsonRejection) -> ApiError {
    tracing::debug!(reason = %rejection.body_text(), "Rejected request body");

    let err = match rejection {
        JsonRejection::MissingJsonContentType(_) => ServiceError::UnsupportedContentType,
        other => ServiceError::invalid_body(other.body_text()),
    };
    err.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{StatusCode, header};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct EmailOnly {
        email: String,
    }

    fn json_request(body: &'static str) -> Request {
        axum::http::Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_body() {
        let JsonBody(parsed) = JsonBody::<EmailOnly>::from_request(json_request(r#"{"email":"a@x.com"}"#), &())
            .await
            .unwrap();
        assert_eq!(parsed.email, "a@x.com");
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let err = JsonBody::<EmailOnly>::from_request(json_request("{not json"), &())
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.message().starts_with("Invalid request body"));
        assert_eq!(err.code(), "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn test_missing_content_type() {
        let req = axum::http::Request::builder()
            .method("POST")
            .body(Body::from(r#"{"email":"a@x.com"}"#))
            .unwrap();
        let err = JsonBody::<EmailOnly>::from_request(req, &()).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(err.message(), "Expected a JSON request body");
    }
}
