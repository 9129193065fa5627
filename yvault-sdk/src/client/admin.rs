//! Admin API client.
//!
//! All requests carry the plaintext admin secret in the
//! `Yvault-Admin-Authorization` header.

use reqwest::Client;
use url::Url;

use super::{ClientError, parse_response};
use crate::ADMIN_AUTH_HEADER;
use crate::objects::{AdminTxResponse, SimulateYieldRequest, UpdateCapRequest};

/// Typed HTTP client for the admin endpoints.
///
/// Every call blocks until the vault transaction is mined, so callers
/// should configure a generous request timeout on the inner client.
#[derive(Debug, Clone)]
pub struct AdminClient {
    http: Client,
    base_url: Url,
    admin_secret: String,
}

impl AdminClient {
    pub fn new(base_url: Url, admin_secret: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url,
            admin_secret: admin_secret.into(),
        }
    }

    /// Replace the default `reqwest::Client` with a custom one.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// `POST /api/v1/admin/pause`
    pub async fn pause(&self) -> Result<AdminTxResponse, ClientError> {
        self.post_empty("/api/v1/admin/pause").await
    }

    /// `POST /api/v1/admin/unpause`
    pub async fn unpause(&self) -> Result<AdminTxResponse, ClientError> {
        self.post_empty("/api/v1/admin/unpause").await
    }

    /// `POST /api/v1/admin/cap-update`
    pub async fn update_cap(&self, new_cap: impl Into<String>) -> Result<AdminTxResponse, ClientError> {
        let url = self.base_url.join("/api/v1/admin/cap-update")?;
        let resp = self
            .http
            .post(url)
            .header(ADMIN_AUTH_HEADER, &self.admin_secret)
            .json(&UpdateCapRequest {
                new_cap: new_cap.into(),
            })
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `POST /api/v1/admin/yield-update`
    pub async fn simulate_yield(&self, amount: impl Into<String>) -> Result<AdminTxResponse, ClientError> {
        let url = self.base_url.join("/api/v1/admin/yield-update")?;
        let resp = self
            .http
            .post(url)
            .header(ADMIN_AUTH_HEADER, &self.admin_secret)
            .json(&SimulateYieldRequest {
                amount: amount.into(),
            })
            .send()
            .await?;
        parse_response(resp).await
    }

    async fn post_empty(&self, path: &str) -> Result<AdminTxResponse, ClientError> {
        let url = self.base_url.join(path)?;
        let resp = self
            .http
            .post(url)
            .header(ADMIN_AUTH_HEADER, &self.admin_secret)
            .send()
            .await?;
        parse_response(resp).await
    }
}
