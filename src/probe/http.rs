//! Request/response probe.
//!
//! Issues one GET per check. Transport failures and 4xx/5xx statuses are
//! mapped to a fixed descriptor; the state machine never sees the raw error.

use std::error::Error as StdError;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use thiserror::Error;

use crate::directory::Target;
use crate::probe::CheckResult;

/// Classified HTTP probe failure. `Display` is the descriptor sent to alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HttpProbeError {
    #[error("web server host could not be resolved")]
    UnknownHost,

    #[error("web server refused the connection")]
    ConnectionRefused,

    #[error("web server network error")]
    Network,

    #[error("web server request timed out")]
    Timeout,

    #[error("web server SSL/TLS connection error")]
    Tls,

    #[error("web server authentication failed (401)")]
    Unauthorized,

    #[error("web server access denied (403)")]
    Forbidden,

    #[error("requested resource was not found (404)")]
    NotFound,

    #[error("web server rejected the request")]
    ClientError,

    #[error("web server failed to process the request")]
    ServerError,

    #[error("web server returned an invalid response")]
    InvalidResponse,

    #[error("web server request retries were exhausted")]
    RetryExhausted,

    #[error("invalid URI")]
    InvalidUri,

    #[error("invalid request argument")]
    InvalidArgument,

    #[error("I/O error while contacting web server")]
    Io,

    #[error("unexpected web server error")]
    Unexpected,
}

impl HttpProbeError {
    /// Classify a client error.
    pub fn classify(err: &reqwest::Error) -> Self {
        if err.is_builder() {
            return if err.url().is_some() || has_source::<url::ParseError>(err) {
                HttpProbeError::InvalidUri
            } else {
                HttpProbeError::InvalidArgument
            };
        }
        if let Some(status) = err.status() {
            return Self::from_status(status);
        }
        if err.is_timeout() {
            return HttpProbeError::Timeout;
        }
        if err.is_redirect() {
            return HttpProbeError::RetryExhausted;
        }
        if err.is_connect() {
            return classify_connect(err);
        }
        if err.is_decode() || err.is_body() {
            return HttpProbeError::InvalidResponse;
        }
        if err.is_request() {
            return if find_io_error(err).is_some() {
                HttpProbeError::Io
            } else {
                HttpProbeError::Network
            };
        }
        HttpProbeError::Unexpected
    }

    /// Classify an error status.
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => HttpProbeError::Unauthorized,
            StatusCode::FORBIDDEN => HttpProbeError::Forbidden,
            StatusCode::NOT_FOUND => HttpProbeError::NotFound,
            s if s.is_client_error() => HttpProbeError::ClientError,
            s if s.is_server_error() => HttpProbeError::ServerError,
            _ => HttpProbeError::Unexpected,
        }
    }
}

fn classify_connect(err: &reqwest::Error) -> HttpProbeError {
    let chain = error_chain(err).to_lowercase();
    if chain.contains("dns error") || chain.contains("failed to lookup address") {
        return HttpProbeError::UnknownHost;
    }
    if chain.contains("certificate") || chain.contains("tls") || chain.contains("ssl") {
        return HttpProbeError::Tls;
    }
    match find_io_error(err).map(|e| e.kind()) {
        Some(std::io::ErrorKind::ConnectionRefused) => HttpProbeError::ConnectionRefused,
        Some(std::io::ErrorKind::TimedOut) => HttpProbeError::Timeout,
        _ if chain.contains("connection refused") => HttpProbeError::ConnectionRefused,
        _ => HttpProbeError::Network,
    }
}

fn has_source<E: StdError + 'static>(err: &(dyn StdError + 'static)) -> bool {
    let mut source = err.source();
    while let Some(inner) = source {
        if inner.is::<E>() {
            return true;
        }
        source = inner.source();
    }
    false
}

fn find_io_error<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a std::io::Error> {
    let mut source = err.source();
    while let Some(inner) = source {
        if let Some(io) = inner.downcast_ref::<std::io::Error>() {
            return Some(io);
        }
        source = inner.source();
    }
    None
}

fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        out.push_str(": ");
        out.push_str(&inner.to_string());
        source = inner.source();
    }
    out
}

/// Probe for plain request/response endpoints.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    /// Create a probe whose connect and request timeouts equal `timeout`.
    ///
    /// Inside the monitor this is longer than the check deadline; see `ProbeSet::new`.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    pub async fn check(&self, target: &Target) -> CheckResult {
        tracing::debug!(target_name = %target.name, endpoint = %target.endpoint, "Probing web endpoint");

        match self.request(&target.endpoint).await {
            Ok(status) => {
                tracing::debug!(target_name = %target.name, status = %status, "Web endpoint reachable");
                CheckResult::healthy()
            }
            Err(e) => {
                let failure = HttpProbeError::classify(&e);
                tracing::warn!(
                    target_name = %target.name,
                    endpoint = %target.endpoint,
                    error = %e,
                    failure = %failure,
                    "Web health check failed"
                );
                CheckResult::unhealthy(failure.to_string())
            }
        }
    }

    async fn request(&self, endpoint: &str) -> Result<StatusCode, reqwest::Error> {
        let response = self.client.get(endpoint).send().await?.error_for_status()?;
        Ok(response.status())
    }
}
