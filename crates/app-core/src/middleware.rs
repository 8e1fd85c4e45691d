//! Request logging middleware with correlation ids.

use std::time::Instant;

use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation id of the current request, available as a request extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

fn request_id(req: &Request<Body>) -> String {
    req.headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

pub async fn request_response_logger(mut req: Request<Body>, next: Next) -> Response {
    let start_time = Instant::now();
    let method = req.method().clone();
    // Query strings are left out: OAuth callbacks carry authorization codes there.
    let path = req.uri().path().to_string();
    let c_id = request_id(&req);

    req.extensions_mut().insert(RequestId(c_id.clone()));

    tracing::info!(_cID = c_id, method = %method, path = %path, version = ?req.version(), "Incoming request");

    let mut response = next.run(req).await;

    let status = response.status();
    let duration_ms = start_time.elapsed().as_millis();

    if let Ok(value) = HeaderValue::from_str(&c_id) {
        response.headers_mut().insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }

    if status.is_server_error() {
        tracing::error!(_cID = c_id, method = %method, path = %path, status = %status, duration_ms, "Request completed with server error");
    } else if status.is_client_error() {
        tracing::warn!(_cID = c_id, method = %method, path = %path, status = %status, duration_ms, "Request completed with client error");
    } else {
        tracing::info!(_cID = c_id, method = %method, path = %path, status = %status, duration_ms, "Request completed");
    }

    response
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::extract::Extension;
    use axum::http::StatusCode;
    use axum::routing::get;
    use tower::ServiceExt;

    use super::*;

    fn app() -> Router {
        Router::new()
            .route("/", get(|Extension(RequestId(id)): Extension<RequestId>| async move { id }))
            .route("/boom", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
            .layer(axum::middleware::from_fn(request_response_logger))
    }

    #[tokio::test]
    async fn test_propagates_incoming_request_id() {
        let request = Request::builder().uri("/").header(REQUEST_ID_HEADER, "abc-123").body(Body::empty()).unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[REQUEST_ID_HEADER], "abc-123");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"abc-123");
    }

    #[tokio::test]
    async fn test_generates_request_id() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        let response = app().oneshot(request).await.unwrap();

        let id = response.headers()[REQUEST_ID_HEADER].to_str().unwrap().to_string();
        assert!(uuid::Uuid::parse_str(&id).is_ok());
    }

    #[tokio::test]
    async fn test_passes_error_status_through() {
        let request = Request::builder().uri("/boom").body(Body::empty()).unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }
}
