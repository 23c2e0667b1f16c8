//! HTTP tests for the OTP routes
//!
//! Tests cover:
//! - Send: validation, cooldown, delivery failure
//! - Verify: success, failures, missing fields
//! - Health, cleanup and root endpoints
//! - CORS and request ids

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use chrono::Duration;
use otp_mailer_axum::*;
use otp_mailer_email::{MemoryEmailSender, UnconfiguredEmailSender};
use otp_mailer_otp::{FixedCodeGenerator, ManualClock, OtpManager, OtpPolicy};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    manager: Arc<OtpManager>,
    clock: Arc<ManualClock>,
    outbox: MemoryEmailSender,
}

fn test_app() -> TestApp {
    let clock = Arc::new(ManualClock::starting_now());
    let manager = Arc::new(OtpManager::with_parts(
        OtpPolicy::default(),
        clock.clone(),
        Arc::new(FixedCodeGenerator::new("123456")),
    ));
    let outbox = MemoryEmailSender::new();
    let origins = CorsOrigins::new(["http://localhost:3000"], [r"^exp://.*"]).unwrap();
    let router = app(
        OtpState::new(manager.clone(), Arc::new(outbox.clone())),
        origins.layer(),
    );

    TestApp {
        router,
        manager,
        clock,
        outbox,
    }
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn call(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

mod send_tests {
    use super::*;

    #[tokio::test]
    async fn test_send_delivers_code() {
        let app = test_app();
        let (status, body) = call(
            &app.router,
            post_json("/api/otp/send", serde_json::json!({ "email": "User@Example.com" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "OTP sent successfully to your email");
        assert_eq!(body["expiresIn"], 180);
        assert_eq!(
            app.outbox.last_code_for("user@example.com").await.as_deref(),
            Some("123456")
        );
        assert_eq!(app.manager.stats().await.emails, vec!["user@example.com"]);
    }

    #[tokio::test]
    async fn test_send_rejects_bad_email() {
        let app = test_app();
        for email in ["not-an-email", "a@b", "a b@c.com", ""] {
            let (status, body) = call(
                &app.router,
                post_json("/api/otp/send", serde_json::json!({ "email": email })),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{email}");
            assert_eq!(body["message"], "Invalid email format");
        }

        let (status, _) = call(&app.router, post_json("/api/otp/send", serde_json::json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(app.outbox.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_send_twice_is_rate_limited() {
        let app = test_app();
        let req = || post_json("/api/otp/send", serde_json::json!({ "email": "a@x.com" }));

        let (status, _) = call(&app.router, req()).await;
        assert_eq!(status, StatusCode::OK);

        app.clock.advance(Duration::seconds(20));
        let response = app.router.clone().oneshot(req()).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "40");

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Please wait before requesting another OTP");
        assert_eq!(body["retryAfter"], 40);
        assert_eq!(app.outbox.sent().await.len(), 1);

        app.clock.advance(Duration::seconds(40));
        let (status, _) = call(&app.router, req()).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_delivery_failure_revokes_code() {
        let app = test_app();
        app.outbox.set_failing(true);

        let (status, body) = call(
            &app.router,
            post_json("/api/otp/send", serde_json::json!({ "email": "a@x.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert_eq!(app.manager.stats().await.total, 0);

        // No cooldown for a code that was never delivered.
        app.outbox.set_failing(false);
        let (status, _) = call(
            &app.router,
            post_json("/api/otp/send", serde_json::json!({ "email": "a@x.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unconfigured_sender_reports_reason() {
        let manager = Arc::new(OtpManager::default());
        let router = app(
            OtpState::new(manager.clone(), Arc::new(UnconfiguredEmailSender)),
            CorsOrigins::default().layer(),
        );

        let (status, body) = call(
            &router,
            post_json("/api/otp/send", serde_json::json!({ "email": "a@x.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "EMAIL_NOT_CONFIGURED");
        assert!(body["message"].as_str().unwrap().contains("not configured"));
        assert_eq!(manager.stats().await.total, 0);
    }

    #[tokio::test]
    async fn test_malformed_json_is_json_error() {
        let app = test_app();
        let req = Request::builder()
            .method("POST")
            .uri("/api/otp/send")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"email\":"))
            .unwrap();

        let (status, body) = call(&app.router, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "INVALID_REQUEST");
    }
}

mod verify_tests {
    use super::*;

    async fn send(app: &TestApp, email: &str) {
        let (status, _) = call(
            &app.router,
            post_json("/api/otp/send", serde_json::json!({ "email": email })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    fn verify(email: &str, otp: &str) -> Request<Body> {
        post_json(
            "/api/otp/verify",
            serde_json::json!({ "email": email, "otp": otp }),
        )
    }

    #[tokio::test]
    async fn test_verify_success_then_not_found() {
        let app = test_app();
        send(&app, "a@x.com").await;

        let (status, body) = call(&app.router, verify("a@x.com", "123456")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "OTP verified successfully");
        assert!(body.get("code").is_none());

        let (status, body) = call(&app.router, verify("a@x.com", "123456")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "OTP not found. Please request a new one.");
        assert_eq!(body["code"], "CODE_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_wrong_code_three_times() {
        let app = test_app();
        send(&app, "b@x.com").await;

        for _ in 0..2 {
            let (status, body) = call(&app.router, verify("b@x.com", "000000")).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["message"], "Invalid OTP. Please try again.");
        }

        let (_, body) = call(&app.router, verify("b@x.com", "000000")).await;
        assert_eq!(body["message"], "Too many attempts. Please request a new OTP.");

        let (_, body) = call(&app.router, verify("b@x.com", "123456")).await;
        assert_eq!(body["code"], "CODE_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_expired_code() {
        let app = test_app();
        send(&app, "c@x.com").await;
        app.clock.advance(Duration::minutes(4));

        let (status, body) = call(&app.router, verify("c@x.com", "123456")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "OTP has expired. Please request a new one.");
    }

    #[tokio::test]
    async fn test_verify_requires_both_fields() {
        let app = test_app();
        let bodies = [
            serde_json::json!({ "email": "a@x.com" }),
            serde_json::json!({ "otp": "123456" }),
            serde_json::json!({ "email": "", "otp": "123456" }),
        ];

        for body in bodies {
            let (status, json) = call(&app.router, post_json("/api/otp/verify", body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json["message"], "Email and OTP are required");
            assert_eq!(json["code"], "MISSING_FIELD");
        }
    }
}

mod maintenance_tests {
    use super::*;

    #[tokio::test]
    async fn test_otp_health_reports_stats() {
        let app = test_app();
        app.manager.issue("a@x.com").await;

        let (status, body) = call(&app.router, get("/api/otp/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "OTP service is healthy");
        assert_eq!(body["emailConnection"], true);
        assert_eq!(body["otpStats"]["total"], 1);
        assert_eq!(body["otpStats"]["emails"][0], "a@x.com");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_cleanup_removes_expired() {
        let app = test_app();
        app.manager.issue("old@x.com").await;
        app.clock.advance(Duration::minutes(5));
        app.manager.issue("new@x.com").await;

        let req = Request::builder()
            .method("POST")
            .uri("/api/otp/cleanup")
            .body(Body::empty())
            .unwrap();
        let (status, body) = call(&app.router, req).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Cleanup completed");
        assert_eq!(body["removed"], 1);
        assert_eq!(body["stats"]["total"], 1);
        assert_eq!(body["stats"]["emails"][0], "new@x.com");
    }

    #[tokio::test]
    async fn test_root_and_liveness() {
        let app = test_app();

        let (status, body) = call(&app.router, get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["endpoints"]["sendOtp"], "POST /api/otp/send");

        let (status, body) = call(&app.router, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert!(body["uptime"].is_number());
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let app = test_app();
        let (status, body) = call(&app.router, get("/api/otp/nope")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Route not found: GET /api/otp/nope");

        let routes = body["availableRoutes"].as_array().unwrap();
        assert_eq!(routes.len(), 6);
        assert!(routes.iter().any(|r| r == "POST /api/otp/verify"));
        assert!(routes.iter().any(|r| r == "GET /health"));
    }
}

mod middleware_tests {
    use super::*;

    #[tokio::test]
    async fn test_response_carries_request_id() {
        let app = test_app();
        let response = app.router.clone().oneshot(get("/health")).await.unwrap();
        let id = response.headers()[REQUEST_ID_HEADER].to_str().unwrap();
        assert!(uuid_like(id));
    }

    #[tokio::test]
    async fn test_cors_allows_configured_origins() {
        let app = test_app();

        for origin in ["http://localhost:3000", "exp://192.168.1.2:8081"] {
            let req = Request::builder()
                .uri("/health")
                .header(header::ORIGIN, origin)
                .body(Body::empty())
                .unwrap();
            let response = app.router.clone().oneshot(req).await.unwrap();
            assert_eq!(
                response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
                origin
            );
            assert_eq!(
                response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
                "true"
            );
        }
    }

    #[tokio::test]
    async fn test_cors_rejects_unknown_origin() {
        let app = test_app();
        let req = Request::builder()
            .uri("/health")
            .header(header::ORIGIN, "https://evil.example.com")
            .body(Body::empty())
            .unwrap();

        let response = app.router.clone().oneshot(req).await.unwrap();
        assert!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .is_none()
        );
    }

    fn uuid_like(value: &str) -> bool {
        value.len() == 36 && value.chars().filter(|c| *c == '-').count() == 4
    }
}
