//! HTTP access for OIDC discovery.

use crate::MaybeSendSync;
use crate::error::FlowResult;
use crate::logging::{FlowLogger, MAX_LOGGED_URL_CHARS, truncate};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

/// Status and body of a discovery response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs the single GET request an OIDC flow needs
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait DiscoveryFetcher: MaybeSendSync {
    async fn get(&self, url: &str) -> FlowResult<HttpResponse>;
}

/// reqwest-backed fetcher; uses the browser's `fetch` on wasm32
#[derive(Debug, Clone, Default)]
pub struct ReqwestFetcher {
    http_client: Client,
}

impl ReqwestFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(http_client: Client) -> Self {
        Self { http_client }
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl DiscoveryFetcher for ReqwestFetcher {
    async fn get(&self, url: &str) -> FlowResult<HttpResponse> {
        let response = self
            .http_client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        FlowLogger::OIDC.debug(
            "Discovery response received",
            json!({ "url": truncate(url, MAX_LOGGED_URL_CHARS), "status": status }),
        );

        Ok(HttpResponse { status, body })
    }
}
