//! Instance identity endpoint.
//!
//! `GET /whoami` fetches the instance identity record and echoes it back to
//! the caller together with the correlation headers the request arrived with.
//! Useful behind a load balancer to see which instance actually served you.
//!
//! ## Response shape
//!
//! Success (200):
//!
//! ```json
//! {
//!   "ok": true,
//!   "region": "us-east-1",
//!   "instanceId": "i-0123456789abcdef0",
//!   "requestId": "Root=1-abc...",
//!   "via": "1.1 proxy.example.com"
//! }
//! ```
//!
//! Identity fields are provider-defined and merged flat into the object.
//! `requestId` is taken from `x-amzn-trace-id`, falling back to
//! `x-request-id`, else `null`. `via` echoes the `via` header, else `null`.
//!
//! Failure (500): `{"ok": false, "error": "<message>"}`.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};
use tracing::warn;

use crate::AppState;

/// `GET /whoami` — fetch and echo instance identity metadata.
///
/// # Errors
///
/// `500 Internal Server Error` with `{"ok":false,"error":...}` when the
/// metadata fetch fails. That is the only failure mode — a single awaited
/// fetch with no retries.
pub async fn whoami(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match state.identity.fetch_instance_identity().await {
        Ok(identity) => {
            let mut body = serde_json::Map::with_capacity(identity.len() + 3);
            body.insert("ok".to_string(), Value::Bool(true));
            body.extend(identity);
            body.insert("requestId".to_string(), nullable(request_id(&headers)));
            body.insert("via".to_string(), nullable(header_value(&headers, "via")));
            Ok(Json(Value::Object(body)))
        }
        Err(e) => {
            warn!("Instance identity fetch failed: {e}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "ok": false, "error": e.to_string() })),
            ))
        }
    }
}

/// Correlation ID from inbound headers: `x-amzn-trace-id` first, then
/// `x-request-id`. Empty values count as absent.
fn request_id(headers: &HeaderMap) -> Option<String> {
    header_value(headers, "x-amzn-trace-id").or_else(|| header_value(headers, "x-request-id"))
}

/// Read a header as a non-empty UTF-8 string.
fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn nullable(value: Option<String>) -> Value {
    value.map_or(Value::Null, Value::String)
}
