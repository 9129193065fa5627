//! Read API client.

use reqwest::Client;
use url::Url;

use super::{ClientError, parse_response};
use crate::objects::{
    SyncStatusResponse, TransactionsPage, TransactionsQuery, UserPositionResponse,
    VaultStatsResponse,
};

/// Typed HTTP client for the public read endpoints.
#[derive(Debug, Clone)]
pub struct LedgerClient {
    http: Client,
    base_url: Url,
}

impl LedgerClient {
    pub fn new(base_url: Url) -> Self {
        Self {
            http: Client::new(),
            base_url,
        }
    }

    /// Replace the default `reqwest::Client` with a custom one.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// `GET /api/v1/vault/stats`
    pub async fn vault_stats(&self) -> Result<VaultStatsResponse, ClientError> {
        let url = self.base_url.join("/api/v1/vault/stats")?;
        parse_response(self.http.get(url).send().await?).await
    }

    /// `GET /api/v1/users/{address}/position`
    pub async fn user_position(&self, address: &str) -> Result<UserPositionResponse, ClientError> {
        let url = self
            .base_url
            .join(&format!("/api/v1/users/{address}/position"))?;
        parse_response(self.http.get(url).send().await?).await
    }

    /// `GET /api/v1/transactions/{address}`
    pub async fn transactions(
        &self,
        address: &str,
        query: &TransactionsQuery,
    ) -> Result<TransactionsPage, ClientError> {
        let url = self
            .base_url
            .join(&format!("/api/v1/transactions/{address}"))?;
        let resp = self
            .http
            .get(url)
            .query(&[
                ("page", query.page.to_string()),
                ("limit", query.limit.to_string()),
                ("confirmed", query.confirmed.to_string()),
            ])
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `GET /api/v1/sync`
    pub async fn sync_status(&self) -> Result<SyncStatusResponse, ClientError> {
        let url = self.base_url.join("/api/v1/sync")?;
        parse_response(self.http.get(url).send().await?).await
    }
}
