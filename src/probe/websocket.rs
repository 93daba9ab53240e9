//! Persistent-connection (WebSocket) probe.
//!
//! # Responsibilities
//! - Derive the `ws://`/`wss://` URL from the target endpoint and hub path
//! - Attempt one handshake within the check timeout
//! - Close the session on every exit path
//!
//! # Design Decisions
//! - Connected means the handshake finished with 101 Switching Protocols
//! - The session guard sends a close frame when possible; dropping it
//!   (including on cancellation) releases the socket

use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::error::UrlError;
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::directory::{Target, TargetKind};
use crate::probe::CheckResult;

/// Classified WebSocket probe failure. `Display` is the descriptor sent to alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WebSocketProbeError {
    #[error("WebSocket connection failed")]
    ConnectionFailed,

    #[error("WebSocket connection timed out")]
    Timeout,

    #[error("WebSocket SSL/TLS connection error")]
    Tls,

    #[error("WebSocket handshake failed")]
    HandshakeFailed,

    #[error("invalid WebSocket URL")]
    InvalidUrl,

    #[error("WebSocket connection rejected by security policy")]
    Security,

    #[error("WebSocket authentication failed (401)")]
    Unauthorized,

    #[error("WebSocket access denied (403)")]
    Forbidden,

    #[error("WebSocket endpoint not found (404)")]
    EndpointNotFound,

    #[error("upgrade from HTTP to WebSocket failed")]
    UpgradeFailed,

    #[error("WebSocket endpoint deployment error")]
    Deployment,

    #[error("unexpected WebSocket error")]
    Unexpected,
}

impl WebSocketProbeError {
    pub fn classify(err: &WsError) -> Self {
        match err {
            WsError::Io(e) if e.kind() == std::io::ErrorKind::TimedOut => WebSocketProbeError::Timeout,
            WsError::Io(_) => WebSocketProbeError::ConnectionFailed,
            WsError::ConnectionClosed | WsError::AlreadyClosed => WebSocketProbeError::ConnectionFailed,
            WsError::Tls(_) => WebSocketProbeError::Tls,
            WsError::Url(UrlError::TlsFeatureNotEnabled) => WebSocketProbeError::Security,
            WsError::Url(_) => WebSocketProbeError::InvalidUrl,
            WsError::Http(response) => Self::from_status(response.status()),
            WsError::HttpFormat(_) | WsError::Protocol(_) => WebSocketProbeError::HandshakeFailed,
            _ => WebSocketProbeError::Unexpected,
        }
    }

    /// Classify the status of a refused upgrade.
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => WebSocketProbeError::Unauthorized,
            StatusCode::FORBIDDEN => WebSocketProbeError::Forbidden,
            StatusCode::NOT_FOUND => WebSocketProbeError::EndpointNotFound,
            s if s.is_client_error() => WebSocketProbeError::HandshakeFailed,
            s if s.is_server_error() => WebSocketProbeError::Deployment,
            _ => WebSocketProbeError::UpgradeFailed,
        }
    }
}

/// Build the WebSocket URL for a target.
///
/// `https://` maps to `wss://`; anything else connects insecurely.
pub fn websocket_url(endpoint: &str, kind: TargetKind) -> String {
    let (scheme, rest) = if let Some(rest) = endpoint.strip_prefix("https://") {
        ("wss://", rest)
    } else if let Some(rest) = endpoint.strip_prefix("http://") {
        ("ws://", rest)
    } else {
        ("ws://", endpoint)
    };

    format!(
        "{}{}{}",
        scheme,
        rest.trim_end_matches('/'),
        kind.hub_path().unwrap_or("")
    )
}

/// An open probe session; closed explicitly or on drop.
struct Session {
    stream: Option<WebSocketStream<MaybeTlsStream<TcpStream>>>,
    connected: bool,
}

impl Session {
    fn new(stream: WebSocketStream<MaybeTlsStream<TcpStream>>, status: StatusCode) -> Self {
        Self {
            stream: Some(stream),
            connected: status == StatusCode::SWITCHING_PROTOCOLS,
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn close(mut self, grace: Duration) {
        if let Some(mut stream) = self.stream.take() {
            self.connected = false;
            match timeout(grace, stream.close(None)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::debug!(error = %e, "WebSocket close frame not delivered"),
                Err(_) => tracing::debug!("WebSocket close timed out"),
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.stream.is_some() {
            tracing::debug!("Dropping WebSocket probe session without close handshake");
        }
    }
}

/// Probe for persistent-connection endpoints.
#[derive(Debug, Clone)]
pub struct WebSocketProbe {
    connect_timeout: Duration,
}

impl WebSocketProbe {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub async fn check(&self, target: &Target) -> CheckResult {
        let url = websocket_url(&target.endpoint, target.kind);
        tracing::debug!(target_name = %target.name, url = %url, "Probing WebSocket endpoint");

        match self.connect(&url).await {
            Ok(()) => {
                tracing::debug!(target_name = %target.name, "WebSocket endpoint reachable");
                CheckResult::healthy()
            }
            Err(failure) => {
                tracing::warn!(
                    target_name = %target.name,
                    url = %url,
                    failure = %failure,
                    "WebSocket health check failed"
                );
                CheckResult::unhealthy(failure.to_string())
            }
        }
    }

    async fn connect(&self, url: &str) -> Result<(), WebSocketProbeError> {
        let (stream, response) = timeout(self.connect_timeout, connect_async(url))
            .await
            .map_err(|_| WebSocketProbeError::Timeout)?
            .map_err(|e| {
                tracing::debug!(url = %url, error = %e, "WebSocket connect error");
                WebSocketProbeError::classify(&e)
            })?;

        let session = Session::new(stream, response.status());
        let connected = session.is_connected();
        session.close(self.connect_timeout).await;

        if connected {
            Ok(())
        } else {
            Err(WebSocketProbeError::ConnectionFailed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_websocket_url_derivation() {
        assert_eq!(
            websocket_url("https://chat.example.com", TargetKind::Chat),
            "wss://chat.example.com/hub/chat"
        );
        assert_eq!(
            websocket_url("http://10.0.0.5:8080/", TargetKind::Edit),
            "ws://10.0.0.5:8080/hub/edit"
        );
        assert_eq!(
            websocket_url("game.example.com", TargetKind::Game),
            "ws://game.example.com/hub/game"
        );
        assert_eq!(websocket_url("https://plain.example.com", TargetKind::Http), "wss://plain.example.com");
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(WebSocketProbeError::from_status(StatusCode::UNAUTHORIZED), WebSocketProbeError::Unauthorized);
        assert_eq!(WebSocketProbeError::from_status(StatusCode::FORBIDDEN), WebSocketProbeError::Forbidden);
        assert_eq!(WebSocketProbeError::from_status(StatusCode::NOT_FOUND), WebSocketProbeError::EndpointNotFound);
        assert_eq!(WebSocketProbeError::from_status(StatusCode::OK), WebSocketProbeError::UpgradeFailed);
        assert_eq!(WebSocketProbeError::from_status(StatusCode::SERVICE_UNAVAILABLE), WebSocketProbeError::Deployment);
    }

    #[test]
    fn test_io_classification() {
        let refused = WsError::Io(std::io::Error::from(std::io::ErrorKind::ConnectionRefused));
        assert_eq!(WebSocketProbeError::classify(&refused), WebSocketProbeError::ConnectionFailed);

        let timed_out = WsError::Io(std::io::Error::from(std::io::ErrorKind::TimedOut));
        assert_eq!(WebSocketProbeError::classify(&timed_out), WebSocketProbeError::Timeout);

        let bad_url = WsError::Url(UrlError::NoHostName);
        assert_eq!(WebSocketProbeError::classify(&bad_url), WebSocketProbeError::InvalidUrl);
    }
}
