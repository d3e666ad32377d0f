//! HTTP JSON-RPC endpoint
//!
//! Ethereum clients POST single JSON-RPC requests to `/`. Every reply is a
//! JSON-RPC envelope, including malformed requests.

use crate::error::RpcError;
use crate::proxy::ProxyRegistry;
use crate::shutdown::wait_for_shutdown;
use crate::types::{JsonRpcRequest, JsonRpcResponse};
use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

pub fn router(registry: Arc<ProxyRegistry>) -> Router {
    Router::new()
        .route("/", post(handle_http))
        .with_state(registry)
}

async fn handle_http(State(registry): State<Arc<ProxyRegistry>>, body: Bytes) -> Json<JsonRpcResponse> {
    let value: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(err) => {
            let err = RpcError::ParseError(err.to_string());
            return Json(JsonRpcResponse::failure(Value::Null, &err));
        }
    };

    // Keep the id when the rest of the envelope is unusable
    let id = value.get("id").cloned().unwrap_or(Value::Null);
    let request: JsonRpcRequest = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(err) => {
            let err = RpcError::InvalidRequest(err.to_string());
            return Json(JsonRpcResponse::failure(id, &err));
        }
    };

    Json(handle_request(&registry, request).await)
}

/// Dispatch one decoded request and wrap the outcome in an envelope.
pub async fn handle_request(registry: &ProxyRegistry, request: JsonRpcRequest) -> JsonRpcResponse {
    if request.method.is_empty() {
        let err = RpcError::InvalidRequest("method is empty".into());
        return JsonRpcResponse::failure(request.id, &err);
    }

    match registry.dispatch(&request.method, &request.params).await {
        Ok(result) => JsonRpcResponse::success(request.id, result),
        Err(err) => JsonRpcResponse::failure(request.id, &err),
    }
}

/// Serve until `shutdown` fires, then let in-flight requests finish.
pub async fn serve(
    addr: SocketAddr,
    registry: Arc<ProxyRegistry>,
    shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, router(registry))
        .with_graceful_shutdown(wait_for_shutdown(shutdown))
        .await
        .context("HTTP server error")?;

    info!("HTTP server stopped");
    Ok(())
}
