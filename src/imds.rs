//! Instance identity metadata client.
//!
//! [`IdentitySource`] is the seam the `/whoami` handler depends on: a
//! zero-argument async fetch returning a flat key/value identity record.
//! [`ImdsClient`] is the production implementation, speaking to the EC2
//! Instance Metadata Service on its link-local address.
//!
//! ## Protocol
//!
//! IMDSv2 is attempted first: `PUT /latest/api/token` obtains a session
//! token, which is then presented on
//! `GET /latest/dynamic/instance-identity/document`. When the token request
//! is refused (older hypervisors, some non-AWS clones of the API), the
//! client falls back to a tokenless IMDSv1 read of the same path.
//!
//! No retries and no caching — each call is a single fetch attempt, and the
//! caller sees whatever the endpoint said this time.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::ImdsConfig;

const TOKEN_PATH: &str = "/latest/api/token";
const IDENTITY_DOCUMENT_PATH: &str = "/latest/dynamic/instance-identity/document";
const TOKEN_TTL_HEADER: &str = "x-aws-ec2-metadata-token-ttl-seconds";
const TOKEN_HEADER: &str = "x-aws-ec2-metadata-token";

/// Flat key/value identity record, e.g. `{"region": "...", "instanceId": "..."}`.
///
/// The set of keys is provider-defined and passed through untouched.
pub type IdentityDocument = serde_json::Map<String, Value>;

/// Source of instance identity metadata.
///
/// Handlers hold this as a trait object so tests can substitute a canned or
/// failing implementation.
#[async_trait]
pub trait IdentitySource: Send + Sync {
    /// Fetch the identity record for the instance this process runs on.
    async fn fetch_instance_identity(&self) -> Result<IdentityDocument, IdentityError>;
}

/// HTTP client for the EC2 Instance Metadata Service.
pub struct ImdsClient {
    http: reqwest::Client,
    base_url: String,
    token_ttl_secs: u64,
}

impl ImdsClient {
    /// Build a client from the `[imds]` config section.
    pub fn new(config: &ImdsConfig) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(config.timeout_ms))
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .expect("Failed to build HTTP client");
        // Strip trailing slash for consistent URL construction
        let base_url = config.base_url.trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            token_ttl_secs: config.token_ttl_secs,
        }
    }

    /// `PUT /latest/api/token` — obtain an IMDSv2 session token.
    ///
    /// Returns `None` when the endpoint refuses the token request, which
    /// signals the caller to fall back to IMDSv1. Transport errors still
    /// fail hard — if the endpoint is unreachable, v1 won't fare better.
    async fn fetch_token(&self) -> Result<Option<String>, IdentityError> {
        let resp = self
            .http
            .put(format!("{}{}", self.base_url, TOKEN_PATH))
            .header(TOKEN_TTL_HEADER, self.token_ttl_secs)
            .send()
            .await
            .map_err(IdentityError::Request)?;

        if !resp.status().is_success() {
            return Ok(None);
        }
        let token = resp.text().await.map_err(IdentityError::Request)?;
        Ok(Some(token))
    }
}

#[async_trait]
impl IdentitySource for ImdsClient {
    async fn fetch_instance_identity(&self) -> Result<IdentityDocument, IdentityError> {
        let token = self.fetch_token().await?;

        let mut req = self
            .http
            .get(format!("{}{}", self.base_url, IDENTITY_DOCUMENT_PATH));
        if let Some(ref token) = token {
            req = req.header(TOKEN_HEADER, token);
        }

        let resp = req.send().await.map_err(IdentityError::Request)?;
        let status = resp.status();
        let body = resp.text().await.map_err(IdentityError::Request)?;

        if !status.is_success() {
            return Err(IdentityError::Service {
                status: status.as_u16(),
                message: body,
            });
        }

        match serde_json::from_str::<Value>(&body) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(IdentityError::Decode(format!(
                "expected JSON object, got {other}"
            ))),
            Err(e) => Err(IdentityError::Decode(format!(
                "invalid JSON from metadata endpoint: {e}"
            ))),
        }
    }
}

/// Errors returned by [`IdentitySource`] implementations.
#[derive(Debug)]
pub enum IdentityError {
    /// HTTP transport error (connection refused, timeout, DNS failure, etc.).
    Request(reqwest::Error),
    /// The metadata endpoint returned a non-2xx HTTP status.
    Service { status: u16, message: String },
    /// The response body was not a JSON object.
    Decode(String),
}

impl std::fmt::Display for IdentityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentityError::Request(e) => write!(f, "metadata request failed: {}", e),
            IdentityError::Service { status, message } => {
                write!(f, "metadata endpoint error (HTTP {}): {}", status, message)
            }
            IdentityError::Decode(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for IdentityError {}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::{get, put};
    use axum::{Json, Router};
    use serde_json::json;
    use tokio::net::TcpListener;

    /// Serve `router` on an ephemeral port, returning its base URL.
    async fn spawn_metadata_endpoint(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client_for(base_url: String) -> ImdsClient {
        ImdsClient::new(&ImdsConfig {
            base_url,
            timeout_ms: 1000,
            token_ttl_secs: 60,
        })
    }

    fn session_token(headers: &HeaderMap) -> Option<&str> {
        headers.get(TOKEN_HEADER).and_then(|v| v.to_str().ok())
    }

    #[tokio::test]
    async fn test_fetch_presents_session_token() {
        // Document endpoint only answers when the token from the PUT
        // handshake comes back on the GET.
        let router = Router::new()
            .route("/latest/api/token", put(|| async { "tok-123" }))
            .route(
                "/latest/dynamic/instance-identity/document",
                get(|headers: HeaderMap| async move {
                    if session_token(&headers) == Some("tok-123") {
                        Json(json!({"region": "us-east-1", "instanceId": "i-123"}))
                            .into_response()
                    } else {
                        StatusCode::UNAUTHORIZED.into_response()
                    }
                }),
            );
        let client = client_for(spawn_metadata_endpoint(router).await);

        let doc = client.fetch_instance_identity().await.unwrap();
        assert_eq!(doc["region"], "us-east-1");
        assert_eq!(doc["instanceId"], "i-123");
    }

    #[tokio::test]
    async fn test_refused_token_falls_back_to_tokenless_fetch() {
        // v1-style endpoint: refuses the token PUT, rejects any request that
        // presents a token anyway.
        let router = Router::new()
            .route(
                "/latest/api/token",
                put(|| async { StatusCode::FORBIDDEN }),
            )
            .route(
                "/latest/dynamic/instance-identity/document",
                get(|headers: HeaderMap| async move {
                    if session_token(&headers).is_some() {
                        StatusCode::BAD_REQUEST.into_response()
                    } else {
                        Json(json!({"region": "eu-west-1"})).into_response()
                    }
                }),
            );
        let client = client_for(spawn_metadata_endpoint(router).await);

        let doc = client.fetch_instance_identity().await.unwrap();
        assert_eq!(doc["region"], "eu-west-1");
    }

    #[tokio::test]
    async fn test_document_error_status_maps_to_service_error() {
        let router = Router::new()
            .route("/latest/api/token", put(|| async { "tok" }))
            .route(
                "/latest/dynamic/instance-identity/document",
                get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "not ready") }),
            );
        let client = client_for(spawn_metadata_endpoint(router).await);

        let err = client.fetch_instance_identity().await.unwrap_err();
        match err {
            IdentityError::Service { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "not ready");
            }
            other => panic!("expected Service error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_object_document_maps_to_decode_error() {
        let router = Router::new()
            .route("/latest/api/token", put(|| async { "tok" }))
            .route(
                "/latest/dynamic/instance-identity/document",
                get(|| async { Json(json!([1, 2])) }),
            );
        let client = client_for(spawn_metadata_endpoint(router).await);

        let err = client.fetch_instance_identity().await.unwrap_err();
        assert!(matches!(err, IdentityError::Decode(_)), "got {err:?}");
    }

    #[test]
    fn test_identity_error_display_is_message_only() {
        let err = IdentityError::Service {
            status: 503,
            message: "not ready".to_string(),
        };
        assert_eq!(err.to_string(), "metadata endpoint error (HTTP 503): not ready");

        let err = IdentityError::Decode("timeout".to_string());
        assert_eq!(err.to_string(), "timeout");
    }

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let client = ImdsClient::new(&ImdsConfig {
            base_url: "http://127.0.0.1:8111/".to_string(),
            timeout_ms: 100,
            token_ttl_secs: 60,
        });
        assert_eq!(client.base_url, "http://127.0.0.1:8111");
    }
}
