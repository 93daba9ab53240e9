//! Read-only status API.
//!
//! # Routes
//! - `GET /admin/status`: version and tracked target count
//! - `GET /admin/targets`: per-target summary, unhealthy first
//! - `GET /admin/targets/{id}`: raw status record
//!
//! All routes require `Authorization: Bearer <api_key>`.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::directory::Directory;
use crate::health::HealthStore;

use self::auth::admin_auth_middleware;
use self::handlers::*;

/// Shared state of the admin router.
#[derive(Clone)]
pub struct AdminState {
    pub store: Arc<HealthStore>,
    pub directory: Arc<dyn Directory>,
    pub api_key: Arc<str>,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/targets", get(get_targets))
        .route("/admin/targets/{id}", get(get_target))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the admin API until shutdown.
pub async fn serve(
    listener: TcpListener,
    state: AdminState,
    mut shutdown: broadcast::Receiver<()>,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(address = %addr, "Admin API listening");
    }

    axum::serve(listener, setup_admin_router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await
}
