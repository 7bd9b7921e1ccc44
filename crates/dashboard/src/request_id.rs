//! Request ID middleware for correlating seed runs with their log lines.
//!
//! Reuses the caller's `x-request-id` when it is a valid header value, otherwise
//! generates a UUID. The ID is recorded on a tracing span and echoed back.

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

/// Header name for request ID.
pub static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

fn request_id_from(headers: &HeaderMap) -> HeaderValue {
    headers
        .get(&REQUEST_ID_HEADER)
        .filter(|v| !v.is_empty() && v.to_str().is_ok())
        .cloned()
        .unwrap_or_else(|| {
            // A hyphenated UUID is always a valid header value.
            HeaderValue::from_str(&Uuid::new_v4().to_string())
                .unwrap_or_else(|_| HeaderValue::from_static("unknown"))
        })
}

pub async fn request_id_middleware(request: Request, next: Next) -> Response<Body> {
    let request_id = request_id_from(request.headers());

    let span = tracing::info_span!(
        "request",
        request_id = request_id.to_str().unwrap_or_default(),
        method = %request.method(),
        uri = %request.uri(),
    );

    async move {
        let mut response = next.run(request).await;

        tracing::info!(status = response.status().as_u16(), "Request completed");

        response
            .headers_mut()
            .insert(REQUEST_ID_HEADER.clone(), request_id);
        response
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reuses_client_request_id() {
        let mut headers = HeaderMap::new();
        headers.insert(
            REQUEST_ID_HEADER.clone(),
            HeaderValue::from_static("seed-run-42"),
        );

        assert_eq!(request_id_from(&headers), "seed-run-42");
    }

    #[test]
    fn test_generates_uuid_when_missing() {
        let id = request_id_from(&HeaderMap::new());
        assert!(Uuid::parse_str(id.to_str().unwrap()).is_ok());
    }

    #[test]
    fn test_replaces_empty_request_id() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER.clone(), HeaderValue::from_static(""));

        let id = request_id_from(&headers);
        assert!(Uuid::parse_str(id.to_str().unwrap()).is_ok());
    }
}
