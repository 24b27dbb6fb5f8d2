//! HTTP client seam for issuing login requests.
//!
//! The controller only sees [`LoginClient`]; [`HttpLoginClient`] is the
//! `reqwest` implementation, and tests substitute in-process stubs.

use crate::outcome::{RequestErrorKind, RequestOutcome};
use crate::request::LoginRequest;
use crate::result::RampaResult;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// Sends one login request and reports what happened
///
/// Implementations never fail: transport errors become a
/// [`RequestOutcome::failed`] with the sentinel status.
#[async_trait]
pub trait LoginClient: Send + Sync + std::fmt::Debug {
    /// Send `request` and wait for the full response
    async fn send(&self, request: &LoginRequest) -> RequestOutcome;
}

#[async_trait]
impl<T: LoginClient + ?Sized> LoginClient for Arc<T> {
    async fn send(&self, request: &LoginRequest) -> RequestOutcome {
        (**self).send(request).await
    }
}

/// `reqwest`-backed login client sharing one connection pool
#[derive(Debug, Clone)]
pub struct HttpLoginClient {
    client: reqwest::Client,
}

impl HttpLoginClient {
    /// Create a client with a default connection pool
    pub fn new() -> RampaResult<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client })
    }

    /// Create a client around an existing `reqwest` client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LoginClient for HttpLoginClient {
    async fn send(&self, request: &LoginRequest) -> RequestOutcome {
        let start = Instant::now();
        let response = self
            .client
            .post(request.url.clone())
            .headers(request.headers.clone())
            .timeout(request.timeout)
            .body(request.body.clone())
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                let kind = classify(&e);
                tracing::debug!(error = %e, %kind, "login request failed");
                return RequestOutcome::failed(kind, start.elapsed());
            }
        };

        let status = response.status().as_u16();
        match response.bytes().await {
            Ok(body) => RequestOutcome::completed(status, body.to_vec(), start.elapsed()),
            Err(e) => {
                let kind = classify(&e);
                tracing::debug!(error = %e, %kind, status, "reading login response failed");
                RequestOutcome::failed(kind, start.elapsed())
            }
        }
    }
}

fn classify(e: &reqwest::Error) -> RequestErrorKind {
    if e.is_timeout() {
        RequestErrorKind::Timeout
    } else if e.is_connect() {
        RequestErrorKind::Connection
    } else if e.is_body() || e.is_decode() {
        RequestErrorKind::Body
    } else {
        RequestErrorKind::Other
    }
}
