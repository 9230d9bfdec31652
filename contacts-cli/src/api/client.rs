//! HTTP record store client

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;

use super::models::{Record, RecordUpdate, RecordsEnvelope};
use super::store::{FetchOptions, RecordStore};
use crate::config::StoreConfig;

/// Record store backed by the platform's REST API
#[derive(Debug, Clone)]
pub struct HttpRecordStore {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpRecordStore {
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn records_url(&self, container_id: &str) -> String {
        format!(
            "{}/sheets/{}/records",
            self.base_url,
            urlencoding::encode(container_id)
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

/// Turn a non-success response into an error carrying the response body
pub(crate) async fn ensure_success(response: Response, action: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    anyhow::bail!("{} failed with HTTP {}: {}", action, status, body.trim())
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn fetch(&self, container_id: &str, options: &FetchOptions) -> Result<Vec<Record>> {
        let url = self.records_url(container_id);
        log::debug!("GET {}", url);

        let request = self
            .http
            .get(&url)
            .query(&[("includeMessages", options.include_annotations)]);
        let response = self
            .authorize(request)
            .send()
            .await
            .with_context(|| format!("Failed to reach record store at {}", url))?;

        let response = ensure_success(response, "Record fetch").await?;
        let envelope: RecordsEnvelope = response
            .json()
            .await
            .context("Failed to parse record list response")?;

        Ok(envelope.into_records())
    }

    async fn batch_update(&self, container_id: &str, updates: &[RecordUpdate]) -> Result<()> {
        let url = self.records_url(container_id);
        log::debug!("PUT {} ({} records)", url, updates.len());

        let response = self
            .authorize(self.http.put(&url).json(updates))
            .send()
            .await
            .with_context(|| format!("Failed to reach record store at {}", url))?;

        ensure_success(response, "Batch update").await?;
        Ok(())
    }
}
