//! The HTTP seam underneath the request pipeline.
//!
//! The pipeline only ever talks to a `Transport`, which keeps refresh-and-retry logic
//! testable without a network; `ReqwestTransport` is the real implementation.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Method;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Message(String),
}

/// A fully-resolved outbound HTTP call (absolute URL, final headers).
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        HttpResponse {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http_client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, TransportError> {
        let http_client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(ReqwestTransport { http_client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut req = self
            .http_client
            .request(request.method, &request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            req = req.body(body);
        }
        let res = req.send().await?;
        let status = res.status().as_u16();
        let body = res.bytes().await?.to_vec();
        Ok(HttpResponse { status, body })
    }
}

#[test]
fn test_response_success_range() {
    assert!(HttpResponse::new(200, "{}").is_success());
    assert!(HttpResponse::new(204, "").is_success());
    assert!(!HttpResponse::new(199, "").is_success());
    assert!(!HttpResponse::new(301, "").is_success());
    assert!(!HttpResponse::new(401, "").is_success());
}
