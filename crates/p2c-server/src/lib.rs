//! p2c compilation gateway HTTP server.
//!
//! Exposes the external compiler over HTTP.
//!
//! # Architecture
//!
//! The server consists of:
//! - **Routes**: `POST /compile`, `GET /health`, CORS handling
//! - **Protocol**: JSON request and response bodies
//! - **Lifecycle**: listener startup and bounded graceful shutdown

pub mod error;
pub mod protocol;
pub mod routes;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::IntoResponse;
use p2c_core::{GatewayConfig, ProcessBridge};
use tokio::net::TcpListener;
use tokio::sync::watch;

pub use error::{ServerError, ServerResult};
pub use protocol::{CompileRequest, CompileResponse, ErrorResponse};
pub use routes::{AppState, create_router};

/// Start the gateway and run until Ctrl+C.
pub async fn serve(config: &GatewayConfig, bridge: ProcessBridge) -> ServerResult<()> {
    serve_until(config, bridge, interrupt()).await
}

/// Start the gateway and run until `shutdown` resolves.
///
/// Failing to bind the listener is reported before anything is served.
pub async fn serve_until<F>(
    config: &GatewayConfig,
    bridge: ProcessBridge,
    shutdown: F,
) -> ServerResult<()>
where
    F: Future<Output = ()> + Send,
{
    let state = Arc::new(AppState { bridge });
    let app = create_router(state, &config.allowed_origin)?;

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    serve_listener(listener, app, shutdown, config.shutdown_timeout).await
}

/// Serve `app` on an already bound listener.
///
/// The listener runs on a background task. Once `shutdown` resolves, new
/// connections are refused and in-flight requests get `grace` to finish.
/// Requests still running after that are cancelled with `503`, which drops
/// (and so kills) their compiler children.
pub async fn serve_listener<F>(
    listener: TcpListener,
    app: Router,
    shutdown: F,
    grace: Duration,
) -> ServerResult<()>
where
    F: Future<Output = ()> + Send,
{
    tracing::info!("Starting server at http://{}", listener.local_addr()?);

    // Connections live on their own tasks, so aborting the server task alone
    // would leave their handlers running.
    let (cancel_tx, cancel_rx) = watch::channel(());
    let app = app.layer(middleware::from_fn(move |request: Request, next: Next| {
        let mut cancelled = cancel_rx.clone();
        async move {
            tokio::select! {
                response = next.run(request) => response,
                _ = cancelled.changed() => StatusCode::SERVICE_UNAVAILABLE.into_response(),
            }
        }
    }));

    let (drain_tx, drain_rx) = tokio::sync::oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = drain_rx.await;
            })
            .await
    });

    tokio::select! {
        result = &mut server => {
            // Stopped without being asked to.
            result??;
            return Ok(());
        }
        _ = shutdown => {}
    }

    tracing::info!("Shutting down server...");
    let _ = drain_tx.send(());

    match tokio::time::timeout(grace, &mut server).await {
        Ok(result) => result??,
        Err(_) => {
            tracing::warn!("Server forced to shutdown after {:?}", grace);
            let _ = cancel_tx.send(());
            server.abort();
        }
    }

    tracing::info!("Server exiting");
    Ok(())
}

/// Resolves on the first Ctrl+C.
async fn interrupt() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for interrupt signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Received shutdown signal");
}
