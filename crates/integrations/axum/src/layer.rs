//! Middleware for the OTP routes: request logging and CORS.

use axum::body::Body;
use http::request::Parts;
use http::{HeaderName, HeaderValue, Method, Request, Response, header};
use regex::Regex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};
use tower_http::cors::{AllowOrigin, CorsLayer};
use uuid::Uuid;

/// Header carrying the request id back to the client.
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Identifier assigned to each request, available as a request extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestId(pub Uuid);

/// Layer that logs every request with a generated id.
///
/// Only method, path, status and latency are logged. Bodies carry
/// one-time codes and are never read.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestLogLayer;

impl RequestLogLayer {
    /// Creates a new logging layer.
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for RequestLogLayer {
    type Service = RequestLogService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestLogService { inner }
    }
}

/// Service produced by `RequestLogLayer`.
#[derive(Debug, Clone)]
pub struct RequestLogService<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for RequestLogService<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let request_id = Uuid::new_v4();
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        req.extensions_mut().insert(RequestId(request_id));

        let mut inner = self.inner.clone();
        let started = Instant::now();

        Box::pin(async move {
            tracing::debug!(request_id = %request_id, method = %method, path = %path, "Request received");

            let mut response = inner.call(req).await?;
            let status = response.status();
            let latency_ms = elapsed_millis(started);

            if status.is_server_error() {
                tracing::warn!(request_id = %request_id, method = %method, path = %path, status = status.as_u16(), latency_ms, "Request failed");
            } else {
                tracing::info!(request_id = %request_id, method = %method, path = %path, status = status.as_u16(), latency_ms, "Request completed");
            }

            if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
                response.headers_mut().insert(REQUEST_ID_HEADER, value);
            }

            Ok(response)
        })
    }
}

fn elapsed_millis(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Origins allowed to call the API from a browser.
#[derive(Debug, Clone, Default)]
pub struct CorsOrigins {
    exact: Vec<String>,
    patterns: Vec<Regex>,
}

impl CorsOrigins {
    /// Creates an origin list from exact origins and regex patterns.
    pub fn new<E, P>(exact: E, patterns: P) -> Result<Self, regex::Error>
    where
        E: IntoIterator,
        E::Item: Into<String>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| Regex::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            exact: exact.into_iter().map(Into::into).collect(),
            patterns,
        })
    }

    /// Checks whether `origin` is allowed.
    pub fn allows(&self, origin: &str) -> bool {
        self.exact.iter().any(|o| o == origin) || self.patterns.iter().any(|p| p.is_match(origin))
    }

    /// Builds the CORS layer.
    pub fn layer(self) -> CorsLayer {
        let origins = Arc::new(self);

        CorsLayer::new()
            .allow_origin(AllowOrigin::predicate(
                move |origin: &HeaderValue, _parts: &Parts| {
                    origin.to_str().is_ok_and(|o| origins.allows(o))
                },
            ))
            .allow_credentials(true)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    }
}
