//! Liveness probe endpoint.

use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};

/// `GET /health` — liveness probe.
///
/// Returns `{"status": "ok", "timestamp": <ISO-8601 UTC now>}`. Pure, no
/// dependencies, no failure path — suitable for load-balancer health checks.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}
