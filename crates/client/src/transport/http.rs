//! HTTP transport.
//!
//! Posts JSON to `{endpoint}/retrieveAndGenerate`. Authentication is a bearer
//! token handed in from configuration; nothing here manages credentials.

use std::time::Duration;

use chrono::{DateTime, Utc};
use kbrag_core::{AppError, AppResult};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use serde::Deserialize;

use super::RagTransport;
use crate::request::RetrieveAndGenerateRequest;
use crate::response::RetrieveAndGenerateResponse;

const MAX_BACKOFF: Duration = Duration::from_secs(30);
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Settings owned by an [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Base URL, without the operation path
    pub endpoint: String,

    /// Bearer token for the `Authorization` header
    pub token: Option<String>,

    pub connect_timeout: Duration,

    pub timeout: Duration,

    /// Extra attempts for throttling-class failures
    pub max_retries: u32,

    /// First backoff delay; doubles on each retry up to 30s
    pub backoff_base: Duration,
}

impl HttpTransportConfig {
    /// Defaults for the regional public endpoint.
    pub fn for_region(region: &str) -> Self {
        Self::with_endpoint(default_endpoint(region))
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: None,
            connect_timeout: Duration::from_secs(10),
            timeout: Duration::from_secs(60),
            max_retries: 0,
            backoff_base: Duration::from_secs(1),
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.backoff_base.saturating_mul(factor).min(MAX_BACKOFF)
    }
}

/// Regional endpoint of the agent runtime service.
pub fn default_endpoint(region: &str) -> String {
    let suffix = if region.starts_with("cn-") {
        "amazonaws.com.cn"
    } else {
        "amazonaws.com"
    };
    format!("https://bedrock-agent-runtime.{}.{}", region, suffix)
}

/// Error document returned by the service on failure.
///
/// Services send `message`, `Message`, or both.
#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    message: Option<String>,
    #[serde(rename = "Message")]
    message_upper: Option<String>,
    #[serde(rename = "__type")]
    error_type: Option<String>,
}

/// A failed attempt plus the server's requested wait, if any.
struct Failure {
    error: AppError,
    retry_after: Option<Duration>,
}

impl From<AppError> for Failure {
    fn from(error: AppError) -> Self {
        Self {
            error,
            retry_after: None,
        }
    }
}

/// reqwest-backed transport.
pub struct HttpTransport {
    config: HttpTransportConfig,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: HttpTransportConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &HttpTransportConfig {
        &self.config
    }

    fn url(&self) -> String {
        format!(
            "{}/retrieveAndGenerate",
            self.config.endpoint.trim_end_matches('/')
        )
    }

    async fn send_once(
        &self,
        request: &RetrieveAndGenerateRequest,
    ) -> Result<RetrieveAndGenerateResponse, Failure> {
        let url = self.url();

        let mut builder = self.client.post(&url).json(request);
        if let Some(ref token) = self.config.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|e| {
            AppError::remote(None, format!("Failed to send request to {}: {}", url, e))
        })?;

        let status = response.status();
        if status.is_success() {
            return response.json().await.map_err(|e| {
                Failure::from(AppError::Serialization(format!(
                    "Failed to parse retrieveAndGenerate response: {}",
                    e
                )))
            });
        }

        let retry_after = retry_after(response.headers(), Utc::now());
        let header_type = error_type_header(response.headers());
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        Err(Failure {
            error: classify_error(status, header_type.as_deref(), &body),
            retry_after,
        })
    }
}

#[async_trait::async_trait]
impl RagTransport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    async fn retrieve_and_generate(
        &self,
        request: &RetrieveAndGenerateRequest,
    ) -> AppResult<RetrieveAndGenerateResponse> {
        tracing::debug!("Request: {:?}", request);

        let mut attempt = 0;
        loop {
            match self.send_once(request).await {
                Ok(response) => {
                    tracing::debug!("Response: {:?}", response);
                    return Ok(response);
                }
                Err(failure)
                    if failure.error.is_retryable() && attempt < self.config.max_retries =>
                {
                    attempt += 1;
                    let wait = failure
                        .retry_after
                        .map(|d| d.min(MAX_RETRY_AFTER))
                        .unwrap_or_else(|| self.config.backoff(attempt));
                    tracing::warn!(
                        attempt,
                        wait_ms = wait.as_millis() as u64,
                        error = %failure.error,
                        "retrying retrieveAndGenerate after backoff"
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(failure) => return Err(failure.error),
            }
        }
    }
}

/// `Retry-After` is either delta-seconds or an HTTP-date; a date in the past means now.
fn retry_after(headers: &HeaderMap, now: DateTime<Utc>) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();

    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }

    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    Some((at - now).to_std().unwrap_or(Duration::ZERO))
}

/// `x-amzn-ErrorType` looks like `ValidationException:http://internal.amazon.com/...`.
fn error_type_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-amzn-errortype")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(':').next())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Map a non-2xx response onto the error taxonomy, keeping the service's message.
fn classify_error(status: StatusCode, header_type: Option<&str>, body: &str) -> AppError {
    let parsed: Option<ServiceErrorBody> = serde_json::from_str(body).ok();

    let error_type = header_type.map(str::to_string).or_else(|| {
        parsed
            .as_ref()
            .and_then(|p| p.error_type.as_deref())
            .map(|t| t.rsplit('#').next().unwrap_or(t).to_string())
    });

    let message = parsed
        .and_then(|p| p.message.or(p.message_upper))
        .unwrap_or_else(|| body.to_string());

    let message = match error_type {
        Some(ref kind) => format!("{}: {}", kind, message),
        None => message,
    };

    let is_validation = error_type
        .as_deref()
        .is_some_and(|kind| kind.contains("ValidationException"));

    if status == StatusCode::BAD_REQUEST && is_validation {
        AppError::InvalidArgument(message)
    } else {
        AppError::remote(Some(status.as_u16()), message)
    }
}
