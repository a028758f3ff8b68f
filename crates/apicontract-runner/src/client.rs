//! HTTP client seam
//!
//! The executor only needs "send a request, get a status and a body back".
//! [`ReqwestClient`] is the production implementation; tests substitute
//! their own [`HttpClient`].

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use apicontract_core::HttpMethod;
use apicontract_core::verdict::RequestSnapshot;

/// Outgoing request, fully resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    /// Absolute URL
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<serde_json::Value>,
}

impl HttpRequest {
    #[must_use]
    pub fn snapshot(&self) -> RequestSnapshot {
        RequestSnapshot {
            method: self.method.to_string(),
            url: self.url.clone(),
            headers: self.headers.clone(),
            body: self.body.as_ref().map(ToString::to_string),
        }
    }
}

/// What came back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Raw body text
    pub body: String,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("{0}")]
    Other(String),
}

/// Capability to perform one HTTP exchange.
pub trait HttpClient: Send + Sync {
    /// # Errors
    ///
    /// Returns [`TransportError`] when no response was received.
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Blocking `reqwest` client.
pub struct ReqwestClient {
    inner: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// # Errors
    ///
    /// Returns error if the underlying client cannot be built (TLS backend).
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let inner = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;
        Ok(Self { inner })
    }
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

impl HttpClient for ReqwestClient {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut req = self
            .inner
            .request(to_reqwest_method(request.method), &request.url);
        for (k, v) in &request.headers {
            if reqwest::header::HeaderValue::from_str(v).is_ok() {
                req = req.header(k, v);
            } else {
                tracing::warn!(header = %k, "dropping header with invalid value");
            }
        }
        if let Some(body) = &request.body {
            req = req.json(body);
        }

        let start = Instant::now();
        let resp = req.send().map_err(classify)?;
        let status = resp.status().as_u16();
        let body = resp.text().map_err(classify)?;

        Ok(HttpResponse {
            status,
            body,
            elapsed: start.elapsed(),
        })
    }
}

fn classify(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(e.to_string())
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else {
        TransportError::Other(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_renders_body_as_json_text() {
        let request = HttpRequest {
            method: HttpMethod::Post,
            url: "http://localhost:8080/widgets".into(),
            headers: BTreeMap::from([("Content-Type".into(), "application/json".into())]),
            body: Some(serde_json::json!({"name": "w"})),
        };
        let snap = request.snapshot();
        assert_eq!(snap.method, "POST");
        assert_eq!(snap.body.as_deref(), Some(r#"{"name":"w"}"#));
        assert_eq!(snap.headers.len(), 1);
    }

    #[test]
    fn method_mapping() {
        assert_eq!(to_reqwest_method(HttpMethod::Patch), reqwest::Method::PATCH);
        assert_eq!(to_reqwest_method(HttpMethod::Delete), reqwest::Method::DELETE);
    }

    #[test]
    fn unreachable_host_is_transport_error() {
        let client = ReqwestClient::new(Duration::from_millis(500)).unwrap();
        let request = HttpRequest {
            method: HttpMethod::Get,
            // Port 9 (discard) on localhost is closed in test environments.
            url: "http://127.0.0.1:9/health".into(),
            headers: BTreeMap::new(),
            body: None,
        };
        assert!(client.send(&request).is_err());
    }
}
