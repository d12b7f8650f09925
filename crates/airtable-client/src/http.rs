//! `reqwest` implementation of [`AirtableApi`].

use crate::api::{AirtableApi, PageQuery};
use crate::error::ApiError;
use crate::models::{
    BaseSchema, CreateRecords, MutationResponse, Record, RecordPage, UpdateRecords,
};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Public Airtable API root.
pub const DEFAULT_API_URL: &str = "https://api.airtable.com/v0";

/// Timeout applied to every request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Airtable client over HTTPS with bearer-token authentication.
#[derive(Debug, Clone)]
pub struct HttpAirtable {
    client: reqwest::Client,
    api_url: Url,
}

impl HttpAirtable {
    /// Client for the public API with the default timeout.
    pub fn new(token: &str) -> Result<Self, ApiError> {
        Self::with_options(token, DEFAULT_API_URL, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Client for an arbitrary API root (used by tests and proxies).
    pub fn with_options(token: &str, api_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| ApiError::InvalidToken)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(ApiError::Client)?;

        let api_url = Url::parse(api_url).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        if api_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(api_url.to_string()));
        }

        Ok(Self { client, api_url })
    }

    /// Append percent-encoded path segments to the API root.
    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.api_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: &Url,
    ) -> Result<T, ApiError> {
        let response = request.send().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.to_string(),
                source,
            })?;

        tracing::trace!("Fetched {} bytes from: {}", bytes.len(), url);

        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl AirtableApi for HttpAirtable {
    async fn base_schema(&self, base: &str) -> Result<BaseSchema, ApiError> {
        let url = self.url(&["meta", "bases", base, "tables"])?;
        let request = self
            .client
            .get(url.clone())
            .query(&[("include", "visibleFieldIds")]);
        self.send(request, &url).await
    }

    async fn list_records(
        &self,
        base: &str,
        table: &str,
        query: &PageQuery,
    ) -> Result<RecordPage, ApiError> {
        let url = self.url(&[base, table])?;
        let request = self.client.get(url.clone()).query(query);
        self.send(request, &url).await
    }

    async fn create_records(
        &self,
        base: &str,
        table: &str,
        body: &CreateRecords,
    ) -> Result<Vec<Record>, ApiError> {
        let url = self.url(&[base, table])?;
        let request = self.client.post(url.clone()).json(body);
        let response: MutationResponse = self.send(request, &url).await?;
        Ok(response.records)
    }

    async fn update_records(
        &self,
        base: &str,
        table: &str,
        body: &UpdateRecords,
    ) -> Result<Vec<Record>, ApiError> {
        let url = self.url(&[base, table])?;
        let request = self.client.patch(url.clone()).json(body);
        let response: MutationResponse = self.send(request, &url).await?;
        Ok(response.records)
    }
}
