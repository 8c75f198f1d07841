//! HTTP transport seam
//!
//! ```text
//! Transport (trait)
//!     |
//!     +-- HttpTransport  reqwest client with a per-call timeout
//!     |
//!     +-- MockTransport  scripted replies, records calls (for testing)
//! ```
//!
//! A transport only moves bytes: it never interprets status codes. Auth
//! headers are attached by the caller.

use crate::error::CoreError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::time::Duration;

/// HTTP verb used by the backend API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Outbound request
#[derive(Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Absolute URL
    pub url: String,
    pub body: Option<serde_json::Value>,
    pub bearer: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
            bearer: None,
        }
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// `GET https://...` for logs and error messages
    pub fn describe(&self) -> String {
        format!("{} {}", self.method, self.url)
    }
}

impl fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("body", &self.body)
            .field("bearer", &self.bearer.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Raw response: status plus body text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self::new(status, body.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}

/// Sends requests to the backend
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request; transport-level failures (connect, timeout) are errors,
    /// any HTTP status is a response.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, CoreError>;
}

/// reqwest-backed transport
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("bookkeep/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CoreError::Transport {
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client, timeout })
    }

    fn map_error(&self, request: &ApiRequest, error: reqwest::Error) -> CoreError {
        if error.is_timeout() {
            CoreError::Timeout {
                operation: request.describe(),
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            CoreError::Transport {
                message: format!("{}: {error}", request.describe()),
            }
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, CoreError> {
        tracing::debug!(method = %request.method, url = %request.url, "Sending request");

        let mut builder = self
            .client
            .request(request.method.into(), &request.url)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| self.map_error(&request, e))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| self.map_error(&request, e))?;

        tracing::debug!(status, url = %request.url, bytes = body.len(), "Received response");
        Ok(ApiResponse { status, body })
    }
}

/// Scripted reply for [`MockTransport`]
#[derive(Debug, Clone)]
pub enum MockReply {
    Response(ApiResponse),
    TransportError(String),
    Timeout,
}

impl MockReply {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        MockReply::Response(ApiResponse::json(status, &body))
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        MockReply::Response(ApiResponse::new(status, body))
    }
}

/// In-memory transport for tests
///
/// Replies are queued per `(method, path)`; the path matches when the request
/// URL ends with it. The last queued reply for a route repeats forever. Every
/// request is recorded.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<MockReply>>>,
    calls: Mutex<Vec<ApiRequest>>,
    latency: Option<Duration>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every reply, so concurrent callers overlap
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn on(&self, method: Method, path: &str, reply: MockReply) -> &Self {
        self.routes
            .lock()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
        self
    }

    /// All requests sent so far
    pub fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().clone()
    }

    /// Number of requests whose URL ends with `path`
    pub fn call_count(&self, method: Method, path: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|r| r.method == method && r.url.ends_with(path))
            .count()
    }

    fn next_reply(&self, request: &ApiRequest) -> Option<MockReply> {
        let mut routes = self.routes.lock();
        // Longest matching path wins so `/high/projects` does not shadow `/high/projects/7`
        let key = routes
            .keys()
            .filter(|(method, path)| *method == request.method && request.url.ends_with(path))
            .max_by_key(|(_, path)| path.len())
            .cloned()?;
        let queue = routes.get_mut(&key)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, CoreError> {
        self.calls.lock().push(request.clone());
        let reply = self.next_reply(&request);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match reply {
            Some(MockReply::Response(response)) => Ok(response),
            Some(MockReply::TransportError(message)) => Err(CoreError::Transport { message }),
            Some(MockReply::Timeout) => Err(CoreError::Timeout {
                operation: request.describe(),
                timeout_secs: 30,
            }),
            None => Ok(ApiResponse::new(404, format!("no route for {}", request.describe()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_debug_redacts_bearer() {
        let request = ApiRequest::new(Method::Get, "http://x/high/categ/").with_bearer("secret");
        let rendered = format!("{:?}", request);
        assert!(!rendered.contains("secret"));
        assert_eq!(request.describe(), "GET http://x/high/categ/");
    }

    #[test]
    fn test_response_classification() {
        assert!(ApiResponse::new(204, "").is_success());
        assert!(ApiResponse::new(401, "").is_unauthorized());
        assert!(!ApiResponse::new(500, "").is_success());
    }

    #[tokio::test]
    async fn test_mock_queue_then_sticky() {
        let mock = MockTransport::new();
        mock.on(Method::Get, "/high/categ/", MockReply::status(500, "first"))
            .on(Method::Get, "/high/categ/", MockReply::status(200, "[]"));

        let req = || ApiRequest::new(Method::Get, "http://api/high/categ/");
        assert_eq!(mock.send(req()).await.unwrap().status, 500);
        assert_eq!(mock.send(req()).await.unwrap().status, 200);
        assert_eq!(mock.send(req()).await.unwrap().status, 200);
        assert_eq!(mock.call_count(Method::Get, "/high/categ/"), 3);
    }

    #[tokio::test]
    async fn test_mock_longest_route_wins() {
        let mock = MockTransport::new();
        mock.on(Method::Get, "/high/projects", MockReply::status(200, "list"))
            .on(Method::Get, "/high/projects/7", MockReply::status(200, "detail"));

        let detail = mock
            .send(ApiRequest::new(Method::Get, "http://api/high/projects/7"))
            .await
            .unwrap();
        assert_eq!(detail.body, "detail");

        let missing = mock
            .send(ApiRequest::new(Method::Post, "http://api/high/projects/7"))
            .await
            .unwrap();
        assert_eq!(missing.status, 404);
    }

    #[tokio::test]
    async fn test_mock_errors() {
        let mock = MockTransport::new();
        mock.on(Method::Get, "/a", MockReply::Timeout)
            .on(Method::Get, "/b", MockReply::TransportError("reset".to_string()));

        let timeout = mock.send(ApiRequest::new(Method::Get, "http://x/a")).await;
        assert!(matches!(timeout, Err(CoreError::Timeout { .. })));

        let reset = mock.send(ApiRequest::new(Method::Get, "http://x/b")).await;
        assert!(matches!(reset, Err(CoreError::Transport { .. })));
    }
}
