//! Job lifecycle reporting
//!
//! A formatting job is acknowledged, run, then marked complete with a summary
//! or failed with the underlying error text. The pipeline itself never talks
//! to the reporter; [`run_job`] is the orchestration layer that does.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

use super::client::ensure_success;
use crate::config::StoreConfig;
use crate::formatting::{FormattingPipeline, RunReport};

#[async_trait]
pub trait JobReporter: Send + Sync {
    async fn acknowledge(&self, job_id: &str, info: &str, progress: u8) -> Result<()>;
    async fn complete(&self, job_id: &str, message: &str) -> Result<()>;
    async fn fail(&self, job_id: &str, message: &str) -> Result<()>;
}

/// Reports job state to the platform's jobs API
#[derive(Debug, Clone)]
pub struct HttpJobReporter {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpJobReporter {
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

    async fn post(&self, job_id: &str, action: &str, body: serde_json::Value) -> Result<()> {
        let url = format!(
            "{}/jobs/{}/{}",
            self.base_url,
            urlencoding::encode(job_id),
            action
        );
        log::debug!("POST {}", url);

        let mut request = self.http.post(&url).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to reach jobs API at {}", url))?;
        ensure_success(response, &format!("Job {}", action)).await?;
        Ok(())
    }
}

#[async_trait]
impl JobReporter for HttpJobReporter {
    async fn acknowledge(&self, job_id: &str, info: &str, progress: u8) -> Result<()> {
        self.post(job_id, "ack", json!({"info": info, "progress": progress}))
            .await
    }

    async fn complete(&self, job_id: &str, message: &str) -> Result<()> {
        self.post(job_id, "complete", json!({"outcome": {"message": message}}))
            .await
    }

    async fn fail(&self, job_id: &str, message: &str) -> Result<()> {
        self.post(job_id, "fail", json!({"outcome": {"message": message}}))
            .await
    }
}

/// Writes job transitions to the log, for offline runs
#[derive(Debug, Clone, Default)]
pub struct LogJobReporter;

#[async_trait]
impl JobReporter for LogJobReporter {
    async fn acknowledge(&self, job_id: &str, info: &str, progress: u8) -> Result<()> {
        log::info!("Job {} acknowledged ({}%): {}", job_id, progress, info);
        Ok(())
    }

    async fn complete(&self, job_id: &str, message: &str) -> Result<()> {
        log::info!("Job {} complete: {}", job_id, message);
        Ok(())
    }

    async fn fail(&self, job_id: &str, message: &str) -> Result<()> {
        log::error!("Job {} failed: {}", job_id, message);
        Ok(())
    }
}

/// Run the formatting pipeline as a reported job
///
/// A pipeline error is reported through `fail` with its full context chain
/// and then returned to the caller.
pub async fn run_job(
    reporter: &dyn JobReporter,
    pipeline: &FormattingPipeline,
    job_id: &str,
    container_id: &str,
) -> Result<RunReport> {
    reporter
        .acknowledge(job_id, "Formatting contact records", 10)
        .await
        .with_context(|| format!("Failed to acknowledge job {}", job_id))?;

    match pipeline.run_formatting(container_id).await {
        Ok(report) => {
            reporter
                .complete(job_id, &report.summary())
                .await
                .with_context(|| format!("Failed to complete job {}", job_id))?;
            Ok(report)
        }
        Err(err) => {
            let message = format!("{:#}", err);
            if let Err(report_err) = reporter.fail(job_id, &message).await {
                log::error!("Failed to report failure of job {}: {:#}", job_id, report_err);
            }
            Err(err)
        }
    }
}
