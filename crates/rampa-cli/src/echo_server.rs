//! Echo login server used as a local load-test target.
//!
//! `POST /login` decodes `{"username", "password"}` and sends the same JSON
//! back with 200. A body that does not decode, or a request without a JSON
//! content type, gets 400 and a plain-text error.

use crate::error::{CliError, CliResult};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use rampa::Credentials;
use std::future::Future;
use std::net::SocketAddr;

/// Body of a 400 response
pub const BAD_BODY_MESSAGE: &str = "Error reading request body";

/// Router serving `POST /login`
pub fn router() -> Router {
    Router::new().route("/login", post(login))
}

async fn login(payload: Result<Json<Credentials>, JsonRejection>) -> Response {
    match payload {
        Ok(credentials) => credentials.into_response(),
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "rejecting login body");
            (StatusCode::BAD_REQUEST, BAD_BODY_MESSAGE).into_response()
        }
    }
}

/// Bind `addr` and serve until `shutdown` resolves
pub async fn serve<F>(addr: SocketAddr, shutdown: F) -> CliResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| CliError::server(format!("failed to bind {addr}: {e}")))?;
    let local = listener.local_addr()?;
    tracing::info!(addr = %local, "echo login server listening");

    axum::serve(listener, router())
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| CliError::server(e.to_string()))
}
