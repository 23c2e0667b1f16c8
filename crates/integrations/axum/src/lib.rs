//! # OTP Mailer Axum Integration
//!
//! This crate exposes the OTP manager over HTTP, including:
//! - Route mounting (`/api/otp/*` plus the root endpoints)
//! - A JSON body extractor with JSON rejections
//! - CORS configuration with exact and pattern origins
//! - A request logging layer
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use otp_mailer_axum::{CorsOrigins, OtpState, app};
//!
//! let state = OtpState::new(manager, sender);
//! let router = app(state, CorsOrigins::default().layer());
//! axum::serve(listener, router).await?;
//! ```

mod extractor;
mod layer;
mod routes;

pub use extractor::JsonBody;
pub use layer::{CorsOrigins, REQUEST_ID_HEADER, RequestId, RequestLogLayer, RequestLogService};
pub use routes::{
    CleanupResponse, HealthResponse, OtpState, SendOtpRequest, SendOtpResponse, VerifyOtpRequest,
    VerifyOtpResponse, app, otp_routes,
};

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use otp_mailer_core::ServiceError;
use serde::Serialize;

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

/// An HTTP error response.
///
/// Usually built from a `ServiceError`.
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    /// Creates an error with an explicit status, code and message.
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                success: false,
                message: message.into(),
                code,
                retry_after: None,
            },
        }
    }

    /// Gets the response status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Gets the machine-readable code.
    pub fn code(&self) -> &'static str {
        self.body.code
    }

    /// Gets the user-visible message.
    pub fn message(&self) -> &str {
        &self.body.message
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut api_error = Self::new(status, err.error_code(), err.to_string());

        if let ServiceError::RateLimited {
            retry_after_seconds,
        } = err
        {
            api_error.body.retry_after = Some(retry_after_seconds);
        }

        api_error
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let retry_after = self.body.retry_after;
        let mut response = (self.status, Json(self.body)).into_response();

        if let Some(seconds) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
        }

        response
    }
}
