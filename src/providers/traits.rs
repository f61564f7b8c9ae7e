//! Transport seam between the executor and the network.
//!
//! The executor never talks to HTTP directly. It hands a fully-formed
//! [`HttpRequest`] to a [`Transport`] and classifies what comes back:
//!
//! - `Err(_)`: the request never produced a response (connection refused,
//!   DNS, TLS, ...). Reported as `Transport`.
//! - `Ok(response)` with a non-2xx status: reported as `Http`.
//! - `Ok(response)` with a 2xx status: handed to the wire decoder.
//!
//! Cancellation is by drop: when an attempt times out or the caller
//! cancels, the executor drops the `send` future.
//!
//! # Example
//!
//! ```ignore
//! struct AlwaysDown;
//!
//! #[async_trait]
//! impl Transport for AlwaysDown {
//!     async fn send(&self, _request: HttpRequest) -> Result<HttpResponse> {
//!         Err(SwitchyardError::Transport("connection refused".into()))
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::Result;

/// A fully-formed JSON `POST`, ready to put on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: serde_json::Value,
}

impl HttpRequest {
    /// A JSON `POST` to `url`.
    pub fn post(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            url: url.into(),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Value of the first header named `name` (case-insensitive).
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status and raw body of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs one network exchange.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Transport name for logging/debugging.
    fn name(&self) -> &str {
        "transport"
    }

    /// Send `request` and return whatever status/body came back.
    ///
    /// Non-2xx statuses are `Ok`; only failures to get any response are `Err`.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}
