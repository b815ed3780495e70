// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Network client with timeout, retry and error-as-value semantics.
//!
//! Every ordinary failure (timeout, refused connection, non-2xx status,
//! malformed body) comes back as a [`NetworkError`] carrying a status code:
//! `0` for transport-level failures, the HTTP status otherwise, and `408`
//! for a client-side timeout (tagged [`ErrorKind::Timeout`] so it can be
//! told apart from a server 408).
//!
//! Retries happen only for 408, 429 and 5xx. Attempt `n` (0-based) waits
//! `2^n * base + random(0..max_jitter)` before the next one.

use std::time::Duration;

use bytes::Bytes;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Classification of a [`NetworkError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connection refused, DNS failure, reset, ... (status 0).
    Transport,
    /// The attempt exceeded its timeout (status 408).
    Timeout,
    /// The caller cancelled the request (status 0).
    Cancelled,
    /// The server answered with a non-2xx status.
    Status,
    /// The response body could not be decoded.
    Decode,
}

/// A failed request, returned as a value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (status {status})")]
pub struct NetworkError {
    pub status: u16,
    pub message: String,
    pub kind: ErrorKind,
}

impl NetworkError {
    pub fn transport(message: impl Into<String>) -> Self {
        NetworkError {
            status: 0,
            message: message.into(),
            kind: ErrorKind::Transport,
        }
    }

    pub fn timeout(after: Duration) -> Self {
        NetworkError {
            status: 408,
            message: format!("request timed out after {}ms", after.as_millis()),
            kind: ErrorKind::Timeout,
        }
    }

    pub fn cancelled() -> Self {
        NetworkError {
            status: 0,
            message: "request cancelled".into(),
            kind: ErrorKind::Cancelled,
        }
    }

    /// Builds an error from a non-2xx response, pulling a message out of
    /// the body when it is JSON with an `error` or `message` member.
    pub fn from_status(status: u16, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<Value>(body)
            .ok()
            .and_then(|v| message_from_json(&v))
            .unwrap_or_else(|| format!("request failed with status {status}"));
        NetworkError {
            status,
            message,
            kind: ErrorKind::Status,
        }
    }

    pub fn decode(status: u16, message: impl Into<String>) -> Self {
        NetworkError {
            status,
            message: message.into(),
            kind: ErrorKind::Decode,
        }
    }

    /// True for 408, 429 and 5xx. Cancellation is never retried.
    pub fn is_retryable(&self) -> bool {
        match self.kind {
            ErrorKind::Cancelled | ErrorKind::Decode => false,
            _ => matches!(self.status, 408 | 429) || self.status >= 500,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::Status && self.status == 404
    }
}

fn message_from_json(value: &Value) -> Option<String> {
    let from_error = match value.get("error") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(obj) => obj.get("message").and_then(Value::as_str).map(str::to_string),
        None => None,
    };
    from_error
        .or_else(|| value.get("message").and_then(Value::as_str).map(str::to_string))
        .filter(|m| !m.trim().is_empty())
}

/// Exponential backoff with bounded jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub base: Duration,
    pub max_jitter: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Backoff {
            base: Duration::from_millis(1000),
            max_jitter: Duration::from_millis(500),
        }
    }
}

impl Backoff {
    /// Deterministic part of the delay: `2^attempt * base`.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        self.base.saturating_mul(2u32.saturating_pow(attempt.min(16)))
    }

    /// Delay before the retry following `attempt`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let jitter_ms = self.max_jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 { 0 } else { rand::thread_rng().gen_range(0..jitter_ms) };
        self.base_delay(attempt).saturating_add(Duration::from_millis(jitter))
    }
}

/// HTTP method subset used by the sync engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
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

/// Request payload.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    /// Serialized as JSON with `content-type: application/json`.
    Json(Value),
    /// Sent as-is; no content type is forced.
    Raw(Bytes),
}

/// Per-request options.
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
    /// Overrides the client's default timeout for each attempt.
    pub timeout: Option<Duration>,
    pub max_retries: u32,
    pub cancel: Option<CancellationToken>,
}

impl Default for RequestConfig {
    fn default() -> Self {
        RequestConfig {
            method: Method::Get,
            headers: Vec::new(),
            body: RequestBody::Empty,
            timeout: None,
            max_retries: 0,
            cancel: None,
        }
    }
}

impl RequestConfig {
    pub fn new(method: Method) -> Self {
        RequestConfig {
            method,
            ..Default::default()
        }
    }

    pub fn get() -> Self {
        Self::new(Method::Get)
    }

    pub fn post() -> Self {
        Self::new(Method::Post)
    }

    pub fn put() -> Self {
        Self::new(Method::Put)
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn raw(mut self, body: impl Into<Bytes>) -> Self {
        self.body = RequestBody::Raw(body.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn cancel_with(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// A successful (2xx) response with its body fully read.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub body: Bytes,
}

impl Response {
    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, NetworkError> {
        serde_json::from_slice(&self.body).map_err(|e| {
            NetworkError::decode(self.status, format!("malformed response body: {e}"))
        })
    }
}

/// Client-wide defaults.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub backoff: Backoff,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            timeout: DEFAULT_TIMEOUT,
            backoff: Backoff::default(),
        }
    }
}

/// HTTP client shared by every component that talks to the remote store.
#[derive(Debug, Clone)]
pub struct NetworkClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl NetworkClient {
    pub fn new(config: ClientConfig) -> Result<Self, NetworkError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| NetworkError::transport(format!("failed to build http client: {e}")))?;
        Ok(NetworkClient { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Sends a request, retrying retryable failures up to `max_retries` times.
    ///
    /// After the last permitted attempt the last error is returned as-is.
    pub async fn request(
        &self,
        url: &str,
        config: RequestConfig,
    ) -> Result<Response, NetworkError> {
        let cancel = config.cancel.clone().unwrap_or_default();
        let timeout = config.timeout.unwrap_or(self.config.timeout);
        let mut attempt = 0u32;

        loop {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(NetworkError::cancelled()),
                _ = tokio::time::sleep(timeout) => Err(NetworkError::timeout(timeout)),
                result = self.send_once(url, &config) => result,
            };

            match result {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < config.max_retries => {
                    let delay = self.config.backoff.delay(attempt);
                    tracing::debug!(
                        url,
                        status = e.status,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "retrying request: {}",
                        e.message
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(NetworkError::cancelled()),
                        _ = tokio::time::sleep(delay) => {}
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Sends a raw binary payload (file/blob upload).
    pub async fn upload(
        &self,
        url: &str,
        bytes: impl Into<Bytes>,
        config: RequestConfig,
    ) -> Result<Response, NetworkError> {
        self.request(url, config.raw(bytes)).await
    }

    async fn send_once(&self, url: &str, config: &RequestConfig) -> Result<Response, NetworkError> {
        let mut builder = self.client.request(config.method.into(), url);
        for (name, value) in &config.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match &config.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Raw(bytes) => builder.body(bytes.clone()),
        };

        let resp = builder.send().await.map_err(map_reqwest_error)?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await.map_err(map_reqwest_error)?;

        if !(200..300).contains(&status) {
            return Err(NetworkError::from_status(status, &body));
        }
        Ok(Response { status, body })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> NetworkError {
    if e.is_connect() {
        NetworkError::transport(format!("connection failed: {e}"))
    } else {
        NetworkError::transport(format!("request failed: {e}"))
    }
}

#[cfg(test)]
#[path = "network_tests.rs"]
mod tests;
