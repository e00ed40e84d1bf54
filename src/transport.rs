//! HTTP transport seam
//!
//! The evaluator hands a fully built [`HttpCall`] to a [`Transport`] and gets
//! back the status and body text. [`ReqwestTransport`] is the production
//! implementation; tests point it at a mock server.

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use std::time::Duration;

use crate::error::LlmError;

/// One outbound POST
#[derive(Clone, Debug)]
pub struct HttpCall {
    /// Provider name, for logging only
    pub provider: String,
    pub url: String,
    /// Credential-bearing values are marked sensitive
    pub headers: HeaderMap,
    pub body: serde_json::Value,
}

/// Status and raw body of a reply, whatever the status.
#[derive(Clone, Debug)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs exactly one request per call; never retries.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn call(&self, call: &HttpCall) -> Result<HttpReply, LlmError>;
}

pub const DEFAULT_USER_AGENT: &str = concat!("redguard/", env!("CARGO_PKG_VERSION"));

/// `reqwest`-backed transport
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Option<Duration>, user_agent: Option<&str>) -> Result<Self, LlmError> {
        let mut builder = reqwest::Client::builder().user_agent(user_agent.unwrap_or(DEFAULT_USER_AGENT));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| LlmError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn call(&self, call: &HttpCall) -> Result<HttpReply, LlmError> {
        tracing::debug!(target: "redguard::http", provider=%call.provider, url=%call.url, "sending request");

        let mut headers = call.headers.clone();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let response = self
            .client
            .post(&call.url)
            .headers(headers)
            .json(&call.body)
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                tracing::debug!(target: "redguard::http", provider=%call.provider, url=%call.url, err=%e, "request error");
                LlmError::provider_call(None, e.to_string())
            })?;

        let status = response.status().as_u16();
        tracing::debug!(target: "redguard::http", provider=%call.provider, url=%call.url, status, "response received");

        let body = response.text().await.map_err(|e| {
            let e = e.without_url();
            tracing::debug!(target: "redguard::http", provider=%call.provider, url=%call.url, status, err=%e, "body read error");
            LlmError::provider_call(Some(status), e.to_string())
        })?;
        Ok(HttpReply { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range() {
        let reply = |status| HttpReply {
            status,
            body: String::new(),
        };
        assert!(reply(200).is_success());
        assert!(reply(204).is_success());
        assert!(!reply(301).is_success());
        assert!(!reply(500).is_success());
    }

    #[test]
    fn client_builds_with_timeout() {
        assert!(ReqwestTransport::new(Some(Duration::from_secs(5)), None).is_ok());
    }
}
