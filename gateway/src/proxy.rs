//! Proxy engine: relays classified requests to the backend.
//!
//! Two relay modes share one routing surface. Buffered relays wait for
//! the whole backend response; streaming relays hand the caller a lazy,
//! single-pass chunk sequence whose backend connection is released the
//! moment the caller stops consuming.

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use futures_util::TryStreamExt;
use reqwest::Client;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::config::BackendConfig;
use crate::error::{Error, Result};

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Result of one relayed request.
///
/// The shape is fixed by the route's `stream` flag before dispatch and
/// never changes mid-flight.
pub enum ProxyResult {
    /// Fully buffered status/body pair.
    Buffered { status_code: u16, body: Value },
    /// Status fixed before the first chunk, plus a lazy chunk sequence.
    /// Dropping the body drops the backend connection.
    Stream {
        status_code: u16,
        content_type: String,
        body: Body,
    },
}

/// Relays requests to a single backend. No retries, no queueing: a
/// backend-side failure surfaces as an error result, and backpressure is
/// whatever the backend itself exerts.
pub struct ProxyEngine {
    http_client: Client,
    base_url: String,
    request_timeout: Duration,
}

impl ProxyEngine {
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            // No whole-request timeout on the client itself: streaming
            // responses stay open for the duration of a generation. The
            // buffered path applies its timeout per request.
            http_client: Client::builder()
                .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
                .build()
                .expect("Failed to create HTTP client"),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    /// Relay a request and buffer the backend's response.
    ///
    /// A response body that fails to parse as JSON is relayed as raw
    /// text, so the caller still receives something usable.
    pub async fn forward_sync(
        &self,
        method: &Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<ProxyResult> {
        let Some(request) = self.build_request(method, path, body) else {
            return Ok(Self::method_not_allowed(method));
        };

        let request_id = Uuid::new_v4();
        tracing::debug!(%request_id, %method, path, "forwarding request");

        let response = request
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| Error::BackendUnreachable(e.to_string()))?;

        let status_code = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| Error::BackendUnreachable(e.to_string()))?;
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));

        tracing::debug!(%request_id, status_code, "backend responded");

        Ok(ProxyResult::Buffered { status_code, body })
    }

    /// Relay a request as a live chunk stream.
    ///
    /// The status code and content type are captured before the first
    /// chunk is forwarded. Chunks arrive in backend order, unbuffered.
    pub async fn forward_stream(
        &self,
        method: &Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<ProxyResult> {
        let Some(request) = self.build_request(method, path, body) else {
            return Ok(Self::method_not_allowed(method));
        };

        let request_id = Uuid::new_v4();
        tracing::debug!(%request_id, %method, path, "forwarding streaming request");

        let response = request
            .send()
            .await
            .map_err(|e| Error::BackendUnreachable(e.to_string()))?;

        let status_code = response.status().as_u16();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/x-ndjson")
            .to_string();

        let stream = response.bytes_stream().map_err(std::io::Error::other);

        Ok(ProxyResult::Stream {
            status_code,
            content_type,
            body: Body::from_stream(stream),
        })
    }

    /// Build the outgoing request, or `None` for methods the proxy never
    /// relays.
    fn build_request(
        &self,
        method: &Method,
        path: &str,
        body: Option<&Value>,
    ) -> Option<reqwest::RequestBuilder> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));

        let mut builder = match *method {
            Method::GET => self.http_client.get(&url),
            Method::POST => self.http_client.post(&url),
            Method::DELETE => self.http_client.delete(&url),
            _ => return None,
        };

        if let Some(body) = body {
            builder = builder.json(body);
        }

        Some(builder)
    }

    fn method_not_allowed(method: &Method) -> ProxyResult {
        ProxyResult::Buffered {
            status_code: 405,
            body: json!({ "error": format!("Method {} not allowed", method) }),
        }
    }
}

impl IntoResponse for ProxyResult {
    fn into_response(self) -> Response {
        match self {
            ProxyResult::Buffered { status_code, body } => {
                let status = StatusCode::from_u16(status_code)
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (status, Json(body)).into_response()
            }
            ProxyResult::Stream {
                status_code,
                content_type,
                body,
            } => {
                let status = StatusCode::from_u16(status_code)
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                match Response::builder()
                    .status(status)
                    .header(header::CONTENT_TYPE, content_type)
                    .body(body)
                {
                    Ok(response) => response,
                    Err(e) => Error::Internal(format!("Failed to build streaming response: {}", e))
                        .into_response(),
                }
            }
        }
    }
}
