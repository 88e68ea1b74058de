//! Minimal HTTP GET abstraction over `reqwest`.

use crate::error::{AppError, Result};
use async_trait::async_trait;
use log::debug;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Status and body of a completed request.
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait(?Send)]
pub trait HttpClient {
    /// Performs a GET request. Only transport failures are errors; any status
    /// code is returned as a response.
    async fn get(&self, url: &str) -> Result<HttpResponse>;
}

/// Performs a GET and fails on any non-success status.
pub async fn get_ok(client: &dyn HttpClient, url: &str) -> Result<Vec<u8>> {
    let response = client.get(url).await?;
    if !response.is_success() {
        return Err(AppError::Network(format!(
            "GET {} returned status {}",
            url, response.status
        )));
    }
    Ok(response.body)
}

/// `reqwest` implementation. Must be polled inside a tokio context, which the
/// UI provides by wrapping tasks in `async_compat::Compat`.
pub struct ReqwestClient {
    http: reqwest::Client,
}

impl ReqwestClient {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http })
    }
}

#[async_trait(?Send)]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        debug!("GET {}", url);
        let response = self.http.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        debug!("GET {} -> {} ({} bytes)", url, status, body.len());
        Ok(HttpResponse { status, body })
    }
}
