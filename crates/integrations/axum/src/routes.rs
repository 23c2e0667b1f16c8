//! Route mounting and handlers for the OTP API.

use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use otp_mailer_core::{EmailSender, OtpStats, ServiceError, is_valid_email};
use otp_mailer_otp::{OtpManager, VerificationResult};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;

use crate::extractor::JsonBody;
use crate::layer::RequestLogLayer;
use crate::ApiError;

/// Shared state for OTP routes.
#[derive(Clone)]
pub struct OtpState {
    pub manager: Arc<OtpManager>,
    pub sender: Arc<dyn EmailSender>,
    started_at: Instant,
}

impl OtpState {
    /// Creates route state from a manager and an email sender.
    pub fn new(manager: Arc<OtpManager>, sender: Arc<dyn EmailSender>) -> Self {
        Self {
            manager,
            sender,
            started_at: Instant::now(),
        }
    }

    /// Seconds since the state was created.
    pub fn uptime_seconds(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }
}

impl std::fmt::Debug for OtpState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtpState")
            .field("manager", &self.manager)
            .field("sender", &self.sender.name())
            .finish_non_exhaustive()
    }
}

// ==================== Request / Response Bodies ====================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendOtpRequest {
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpResponse {
    pub success: bool,
    pub message: String,
    pub expires_in: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: Option<String>,
    pub otp: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyOtpResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

impl From<VerificationResult> for VerifyOtpResponse {
    fn from(result: VerificationResult) -> Self {
        Self {
            success: result.is_valid(),
            message: result.message().to_string(),
            code: result.error_code(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub success: bool,
    pub message: String,
    pub email_connection: bool,
    pub otp_stats: OtpStats,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanupResponse {
    pub success: bool,
    pub message: String,
    pub removed: usize,
    pub stats: OtpStats,
}

// ==================== Routers ====================

/// Creates the `/api/otp` router.
///
/// # Example
///
/// ```rust,ignore
/// let app = Router::new().nest("/api/otp", otp_routes(state));
/// ```
pub fn otp_routes<S>(state: OtpState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/send", post(send_otp_handler))
        .route("/verify", post(verify_otp_handler))
        .route("/health", get(otp_health_handler))
        .route("/cleanup", post(cleanup_handler))
        .with_state(state)
}

/// Creates the full application: OTP routes, root endpoints, 404
/// fallback, CORS and request logging.
pub fn app(state: OtpState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/", get(service_info_handler))
        .route("/health", get(liveness_handler))
        .nest("/api/otp", otp_routes(state.clone()))
        .fallback(not_found_handler)
        .with_state(state)
        .layer(cors)
        .layer(RequestLogLayer::new())
}

// ==================== OTP Handlers ====================

async fn send_otp_handler(
    State(state): State<OtpState>,
    JsonBody(body): JsonBody<SendOtpRequest>,
) -> Result<Json<SendOtpResponse>, ApiError> {
    let email = body.email.unwrap_or_default();
    if !is_valid_email(&email) {
        return Err(ServiceError::InvalidEmail.into());
    }

    let issued = match state.manager.try_issue(&email).await {
        Ok(issued) => issued,
        Err(cooldown) => {
            tracing::info!(email = %email, "OTP requested during cooldown");
            return Err(ServiceError::RateLimited {
                retry_after_seconds: cooldown.retry_after_seconds(),
            }
            .into());
        }
    };

    if let Err(err) = state
        .sender
        .send_otp(&email, &issued.code, issued.expires_in)
        .await
    {
        // The user never received this code; don't let it hold the cooldown.
        state.manager.revoke(&email, &issued.code).await;
        tracing::error!(email = %issued.email, sender = state.sender.name(), error = %err, "Failed to send OTP email");
        return Err(ServiceError::from(err).into());
    }

    tracing::info!(email = %issued.email, expires_at = %issued.expires_at, "OTP sent");

    Ok(Json(SendOtpResponse {
        success: true,
        message: "OTP sent successfully to your email".to_string(),
        expires_in: state.manager.policy().ttl_seconds(),
    }))
}

async fn verify_otp_handler(
    State(state): State<OtpState>,
    JsonBody(body): JsonBody<VerifyOtpRequest>,
) -> Result<Response, ApiError> {
    let email = body.email.filter(|e| !e.is_empty());
    let otp = body.otp.filter(|o| !o.is_empty());
    let (Some(email), Some(otp)) = (email, otp) else {
        return Err(ServiceError::missing("Email and OTP are required").into());
    };

    let result = state.manager.verify(&email, &otp).await;
    let status = if result.is_valid() {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };

    Ok((status, Json(VerifyOtpResponse::from(result))).into_response())
}

async fn otp_health_handler(State(state): State<OtpState>) -> Json<HealthResponse> {
    let email_connection = state.sender.test_connection().await;
    let otp_stats = state.manager.stats().await;

    Json(HealthResponse {
        success: true,
        message: "OTP service is healthy".to_string(),
        email_connection,
        otp_stats,
        timestamp: Utc::now(),
    })
}

async fn cleanup_handler(State(state): State<OtpState>) -> Json<CleanupResponse> {
    let removed = state.manager.cleanup_expired().await;
    let stats = state.manager.stats().await;

    Json(CleanupResponse {
        success: true,
        message: "Cleanup completed".to_string(),
        removed,
        stats,
    })
}

// ==================== Root Handlers ====================

const AVAILABLE_ROUTES: [&str; 6] = [
    "POST /api/otp/send",
    "POST /api/otp/verify",
    "GET /api/otp/health",
    "POST /api/otp/cleanup",
    "GET /",
    "GET /health",
];

async fn service_info_handler() -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "name": "OTP Mailer",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "sendOtp": "POST /api/otp/send",
            "verifyOtp": "POST /api/otp/verify",
            "otpHealth": "GET /api/otp/health",
            "cleanup": "POST /api/otp/cleanup",
            "health": "GET /health",
        },
    }))
}

async fn liveness_handler(State(state): State<OtpState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now(),
        "uptime": state.uptime_seconds(),
    }))
}

async fn not_found_handler(method: Method, uri: Uri) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "message": format!("Route not found: {} {}", method, uri.path()),
            "availableRoutes": AVAILABLE_ROUTES,
        })),
    )
}
