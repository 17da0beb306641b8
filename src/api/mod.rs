//! HTTP API
//!
//! axum router over a shared [`Copilot`].

pub mod dto;
pub mod error;
pub mod routes;

pub use error::ApiError;

use crate::copilot::Copilot;
use crate::error::Result;
use axum::body::Body;
use axum::http::Request;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub type AppState = Arc<Copilot>;

pub fn router(copilot: AppState) -> Router {
    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        let request_id = Uuid::new_v4();
        tracing::info_span!(
            "request",
            %request_id,
            method = %request.method(),
            uri = %request.uri(),
        )
    });

    Router::new()
        .route("/draft", post(routes::draft))
        .route("/validate", post(routes::validate))
        .route("/run", post(routes::run))
        .route("/explain", post(routes::explain))
        .route("/health", get(routes::health))
        .with_state(copilot)
        .layer(trace)
}

/// Serve on `0.0.0.0:port` until Ctrl-C.
pub async fn serve(copilot: AppState, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "ES Query Copilot listening");

    axum::serve(listener, router(copilot).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("Shutting down");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(err) => tracing::error!(?err, "failed to listen for shutdown signal"),
    }
}
