//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{http::StatusCode, routing::post, Json, Router};
use futures_util::StreamExt;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

async fn bind() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

fn serve(listener: TcpListener, router: Router) {
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
}

/// Start an HTTP backend whose every response comes from `f`.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let f = Arc::new(f);
    let router = Router::new().fallback(move || {
        let f = f.clone();
        async move {
            let (status, body) = f().await;
            (StatusCode::from_u16(status).unwrap(), body)
        }
    });

    let (listener, addr) = bind().await;
    serve(listener, router);
    addr
}

/// Start an HTTP backend that always answers `status`.
pub async fn start_mock_backend(status: u16) -> SocketAddr {
    start_programmable_backend(move || async move { (status, "ok".to_string()) }).await
}

/// Start an HTTP backend that answers only after `delay`.
pub async fn start_slow_backend(delay: Duration) -> SocketAddr {
    start_programmable_backend(move || async move {
        tokio::time::sleep(delay).await;
        (200, "late".to_string())
    })
    .await
}

/// An address nothing is listening on.
pub async fn closed_port() -> SocketAddr {
    let (listener, addr) = bind().await;
    drop(listener);
    addr
}

/// Accept TCP connections and never write a byte.
pub async fn start_silent_backend() -> SocketAddr {
    let (listener, addr) = bind().await;
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });
    addr
}

/// Start a WebSocket server; returns its address and the paths it accepted.
pub async fn start_websocket_backend() -> (SocketAddr, Arc<Mutex<Vec<String>>>) {
    let (listener, addr) = bind().await;
    let paths = Arc::new(Mutex::new(Vec::new()));
    let seen = paths.clone();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let seen = seen.clone();
            tokio::spawn(async move {
                let record = |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                    seen.lock().unwrap().push(req.uri().path().to_string());
                    Ok(resp)
                };
                if let Ok(mut ws) = tokio_tungstenite::accept_hdr_async(stream, record).await {
                    while let Some(Ok(msg)) = ws.next().await {
                        if msg.is_close() {
                            break;
                        }
                    }
                }
            });
        }
    });

    (addr, paths)
}

/// Start a fake Slack Web API that records posted messages.
pub async fn start_slack_backend() -> (SocketAddr, Arc<Mutex<Vec<Value>>>) {
    let messages = Arc::new(Mutex::new(Vec::new()));
    let seen = messages.clone();

    let router = Router::new().route(
        "/api/chat.postMessage",
        post(move |Json(body): Json<Value>| {
            let seen = seen.clone();
            async move {
                let ok = body["channel"] != "C-BROKEN";
                seen.lock().unwrap().push(body);
                if ok {
                    Json(json!({ "ok": true }))
                } else {
                    Json(json!({ "ok": false, "error": "channel_not_found" }))
                }
            }
        }),
    );

    let (listener, addr) = bind().await;
    serve(listener, router);
    (addr, messages)
}

/// Poll `check` until it holds or `timeout` passes.
pub async fn eventually<F: Fn() -> bool>(timeout: Duration, check: F) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}
