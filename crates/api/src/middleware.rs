use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::app::errors::{json_error, InternalErrorDetail};

const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Authorization, Accept";

/// Origin allow-list for browser clients.
#[derive(Debug, Clone)]
pub struct CorsState {
    allowed: Arc<Vec<String>>,
    /// Development: any `http://localhost:*` / `http://127.0.0.1:*` origin.
    allow_local: bool,
}

impl CorsState {
    pub fn new(allowed: Vec<String>, allow_local: bool) -> Self {
        Self {
            allowed: Arc::new(allowed),
            allow_local,
        }
    }

    pub fn allows(&self, origin: &str) -> bool {
        if self.allow_local
            && (origin.starts_with("http://localhost:") || origin.starts_with("http://127.0.0.1:"))
        {
            return true;
        }
        self.allowed.iter().any(|o| o == origin)
    }
}

/// Answers preflights, rejects disallowed origins and decorates responses
/// for allowed ones. Requests without an `Origin` header pass through.
pub async fn cors_middleware(State(state): State<CorsState>, req: Request, next: Next) -> Response {
    let Some(origin) = request_origin(req.headers()) else {
        return next.run(req).await;
    };

    if !state.allows(&origin) {
        tracing::warn!(%origin, "origin rejected");
        return json_error(StatusCode::FORBIDDEN, "CORS Error", "Not allowed by CORS");
    }

    let mut response = if req.method() == Method::OPTIONS {
        StatusCode::OK.into_response()
    } else {
        next.run(req).await
    };
    apply_cors_headers(response.headers_mut(), &origin);
    response
}

fn apply_cors_headers(headers: &mut HeaderMap, origin: &str) {
    if let Ok(value) = HeaderValue::from_str(origin) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
    }
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(header::VARY, HeaderValue::from_static("Origin"));
}

fn request_origin(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// One `info` line per request: method, path, origin, status, latency.
pub async fn request_logging(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let origin = request_origin(req.headers());
    let started = Instant::now();

    let response = next.run(req).await;

    tracing::info!(
        %method,
        %path,
        origin = origin.as_deref().unwrap_or("-"),
        status = response.status().as_u16(),
        latency_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    response
}

/// Outside production, replace the generic 500 message with the underlying
/// error text.
pub async fn expose_error_details(req: Request, next: Next) -> Response {
    let response = next.run(req).await;
    match response.extensions().get::<InternalErrorDetail>() {
        Some(detail) => json_error(response.status(), "Server Error", detail.0.clone()),
        None => response,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_origins_only_in_development() {
        let dev = CorsState::new(vec!["https://shop.example.com".into()], true);
        let prod = CorsState::new(vec!["https://shop.example.com".into()], false);

        assert!(dev.allows("http://localhost:4321"));
        assert!(dev.allows("http://127.0.0.1:9000"));
        assert!(!prod.allows("http://localhost:4321"));
        assert!(prod.allows("https://shop.example.com"));
        assert!(!prod.allows("https://evil.example.com"));
    }

    #[test]
    fn cors_headers_echo_the_origin() {
        let mut headers = HeaderMap::new();
        apply_cors_headers(&mut headers, "http://localhost:5173");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "http://localhost:5173");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    }
}
