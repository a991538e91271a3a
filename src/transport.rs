//! HTTP transport seam
//!
//! Everything above this module talks to the service through [`Transport`], so the
//! poller and materializer can be driven by a scripted transport in tests.

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// HTTP method used by the crate
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
}

/// Outgoing request
#[derive(Clone, Debug)]
pub struct Request {
    /// HTTP method
    pub method: Method,
    /// Absolute URL
    pub url: String,
    /// JSON body, sent with `Content-Type: application/json`
    pub body: Option<serde_json::Value>,
    /// Attach the bearer token (false for asset transfers from a CDN)
    pub authenticated: bool,
}

impl Request {
    /// Authenticated GET
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            body: None,
            authenticated: true,
        }
    }

    /// Authenticated POST with a JSON body
    pub fn post_json(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            body: Some(body),
            authenticated: true,
        }
    }

    /// Drop the bearer token from this request
    #[must_use]
    pub fn unauthenticated(mut self) -> Self {
        self.authenticated = false;
        self
    }
}

/// Response status and raw body
#[derive(Clone, Debug)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// Raw body bytes
    pub body: Vec<u8>,
}

impl Response {
    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as text, lossily decoded
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Turn a non-2xx response into [`Error::Transport`] with the body attached
    pub fn error_for_status(self, url: &str) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        Err(Error::Transport {
            url: url.to_string(),
            status: Some(self.status),
            body: self.text(),
            message: format!("request returned status {}", self.status),
        })
    }

    /// Parse the body as JSON; a malformed body is [`Error::Transport`]
    pub fn json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| Error::Transport {
            url: url.to_string(),
            status: Some(self.status),
            body: self.text(),
            message: format!("malformed response body: {e}"),
        })
    }
}

/// Capability to send a request and receive a response
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request
    ///
    /// Implementations return `Ok` for every response received, whatever its
    /// status; callers decide what a non-2xx status means.
    ///
    /// # Errors
    ///
    /// Returns an error if no response was received (connection failure, timeout).
    async fn send(&self, request: Request) -> Result<Response>;
}

/// [`Transport`] backed by `reqwest`
pub struct HttpTransport {
    client: reqwest::Client,
    token: String,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("token", &"<redacted>")
            .finish()
    }
}

impl HttpTransport {
    /// Create a transport that authenticates with `token`
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new(token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("imagegen-dl/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            token: token.into(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: Request) -> Result<Response> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };

        if request.authenticated {
            builder = builder.bearer_auth(&self.token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        tracing::debug!(url = %request.url, method = ?request.method, "sending request");

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        tracing::debug!(url = %request.url, status, bytes = body.len(), "received response");

        Ok(Response { status, body })
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport() -> HttpTransport {
        HttpTransport::new("sess-test-token", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn post_sends_bearer_and_json_content_type() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/tasks"))
            .and(header("authorization", "Bearer sess-test-token"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({ "hello": "world" })))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"id":"task-1"}"#))
            .expect(1)
            .mount(&mock_server)
            .await;

        let url = format!("{}/tasks", mock_server.uri());
        let response = transport()
            .send(Request::post_json(&url, serde_json::json!({ "hello": "world" })))
            .await
            .unwrap();

        assert!(response.is_success());
        assert_eq!(response.text(), r#"{"id":"task-1"}"#);
    }

    #[tokio::test]
    async fn unauthenticated_request_has_no_authorization_header() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/img.webp"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/img.webp"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1, 2, 3]))
            .mount(&mock_server)
            .await;

        let url = format!("{}/img.webp", mock_server.uri());
        let response = transport()
            .send(Request::get(&url).unauthenticated())
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, vec![1, 2, 3]);
    }

    #[test]
    fn non_success_keeps_body() {
        let response = Response {
            status: 401,
            body: br#"{"error":"invalid token"}"#.to_vec(),
        };
        match response.error_for_status("https://example.com/tasks") {
            Err(Error::Transport { status, body, url, .. }) => {
                assert_eq!(status, Some(401));
                assert!(body.contains("invalid token"));
                assert_eq!(url, "https://example.com/tasks");
            }
            other => panic!("expected Transport error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_json_is_transport_error() {
        let response = Response {
            status: 200,
            body: b"<html>oops</html>".to_vec(),
        };
        let parsed: Result<serde_json::Value> = response.json("https://example.com");
        match parsed {
            Err(Error::Transport { body, message, .. }) => {
                assert_eq!(body, "<html>oops</html>");
                assert!(message.contains("malformed"));
            }
            other => panic!("expected Transport error, got {other:?}"),
        }
    }
}
