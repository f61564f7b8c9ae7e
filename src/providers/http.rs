//! `reqwest`-backed [`Transport`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::traits::{HttpRequest, HttpResponse, Transport};
use crate::{Result, SwitchyardError};

/// Upper bound on any single exchange. Per-attempt deadlines are enforced by
/// the executor and are normally much shorter.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(300);

/// Production transport over a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    /// Create a transport with its own connection pool.
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .timeout(CLIENT_TIMEOUT)
            .build()
            .map_err(|e| SwitchyardError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http })
    }

    /// Reuse an existing client (and its connection pool).
    pub fn with_client(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    fn name(&self) -> &str {
        "reqwest"
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = self.http.post(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = builder.json(&request.body);

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}
