//! Correlation id middleware.

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;

use courier_shared::CorrelationId;

pub const CORRELATION_HEADER: &str = "x-correlation-id";

/// Attach a correlation id to the request extensions and echo it on the
/// response. Caller-supplied ids pass through; otherwise an 8-byte hex id
/// is generated.
pub async fn correlation_id(mut request: Request, next: Next) -> Response {
    let id = request
        .headers()
        .get(CORRELATION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(CorrelationId::from_value)
        .unwrap_or_else(CorrelationId::generate);

    request.extensions_mut().insert(id.clone());
    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(id.as_str()) {
        response.headers_mut().insert(CORRELATION_HEADER, value);
    }
    response
}
