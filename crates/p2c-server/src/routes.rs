//! HTTP routes for the p2c server.

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, Bytes},
    extract::State,
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use p2c_core::{CompilationOutcome, CompilationRequest, ProcessBridge};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::error::{ServerError, ServerResult};
use crate::protocol::{CompileRequest, CompileResponse, ErrorResponse};

/// Application state shared across handlers.
pub struct AppState {
    /// Bridge to the external compiler.
    pub bridge: ProcessBridge,
}

/// Create the router with all routes.
///
/// `allowed_origin` is the only origin browsers may call the API from. The
/// CORS layer answers every `OPTIONS` request itself, so a preflight never
/// reaches the compiler.
pub fn create_router(state: Arc<AppState>, allowed_origin: &str) -> ServerResult<Router> {
    let origin = HeaderValue::from_str(allowed_origin)
        .map_err(|_| ServerError::InvalidOrigin(allowed_origin.to_string()))?;

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::exact(origin))
        .allow_methods([Method::POST, Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let router = Router::new()
        .route("/compile", post(compile_handler))
        .route("/health", get(health_handler))
        .fallback(|| async { StatusCode::NOT_FOUND })
        .layer(cors)
        .with_state(state);

    Ok(router)
}

/// Health check handler.
async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Compile handler.
///
/// The body is decoded by hand so every malformed body maps to `400`,
/// whatever its content type. JSON strings must be UTF-8, so compiler bytes
/// that are not get replacement characters here and nowhere else.
async fn compile_handler(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let data: CompileRequest = match serde_json::from_slice(&body) {
        Ok(data) => data,
        Err(e) => {
            tracing::warn!("Rejected compile request: {}", e);
            return bad_request(format!("Bad request: {}", e));
        }
    };

    tracing::info!(
        "Received code:\n{}\n{}\n{}",
        "-".repeat(80),
        data.code,
        "-".repeat(80)
    );

    let request = CompilationRequest::new(data.mode, false, data.code.into_bytes());
    let outcome = state.bridge.run(request).await;

    match outcome {
        CompilationOutcome::Success { output } => {
            let result = String::from_utf8_lossy(&output).into_owned();
            (StatusCode::OK, Json(CompileResponse { result })).into_response()
        }
        failure => {
            match &failure {
                CompilationOutcome::LaunchError { message } => {
                    tracing::error!("Compiler could not be launched: {}", message);
                }
                CompilationOutcome::TimedOut { after } => {
                    tracing::warn!("Compiler timed out after {:?}", after);
                }
                _ => tracing::debug!("Compiler reported errors"),
            }
            let (_, payload) = failure.into_parts();
            let message = String::from_utf8_lossy(&payload).into_owned();
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorResponse { message }),
            )
                .into_response()
        }
    }
}

fn bad_request(message: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from(message),
    )
        .into_response()
}
