//! API key enforcement for the action endpoints

use super::request_id::RequestId;
use crate::error::ServerError;
use axum::{
    http::{header::AUTHORIZATION, Request},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::warn;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Layer that rejects requests not carrying the configured key.
///
/// Without a key every request passes (development mode).
#[derive(Clone)]
pub struct ApiKeyLayer {
    expected: Option<Arc<str>>,
}

impl ApiKeyLayer {
    pub fn new(expected: Option<&str>) -> Self {
        Self { expected: expected.filter(|k| !k.is_empty()).map(Arc::from) }
    }
}

impl<S> Layer<S> for ApiKeyLayer {
    type Service = ApiKeyService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ApiKeyService { inner, expected: self.expected.clone() }
    }
}

#[derive(Clone)]
pub struct ApiKeyService<S> {
    inner: S,
    expected: Option<Arc<str>>,
}

/// Key from `X-API-Key`, else from `Authorization: Bearer`
fn presented_key<B>(req: &Request<B>) -> Option<&str> {
    let headers = req.headers();
    if let Some(key) = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) {
        return Some(key);
    }
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

impl<S, B> Service<Request<B>> for ApiKeyService<S>
where
    S: Service<Request<B>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        if let Some(expected) = &self.expected {
            let rejection = match presented_key(&req) {
                None => Some("missing API key"),
                Some(key) if key != expected.as_ref() => Some("invalid API key"),
                Some(_) => None,
            };
            if let Some(reason) = rejection {
                warn!(path = %req.uri().path(), reason, "rejected request");
                let request_id = req
                    .extensions()
                    .get::<RequestId>()
                    .map(|r| r.0.clone())
                    .unwrap_or_default();
                let resp = ServerError::Unauthorized(reason.to_string())
                    .to_http_response(request_id)
                    .into_response();
                return Box::pin(async move { Ok(resp) });
            }
        }

        let mut inner = self.inner.clone();
        Box::pin(async move { inner.call(req).await })
    }
}
