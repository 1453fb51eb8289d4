//! HTTP client wrapper for the AI microservices backend.

use crate::backend::types::{
    BackendError, DocumentFile, DocumentKind, HealthStatus, LearningPathRequest,
    LearningPathResponse, QaAnswer, QaRequest, SummarizeRequest, SummarizeResponse, UploadReceipt,
};
use crate::config::Config;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Operations the panel needs from the backend.
///
/// [`BackendClient`] is the production implementation; tests substitute their own.
#[async_trait]
pub trait BackendApi: Send + Sync {
    /// Upload a document for chunking and indexing.
    async fn upload_document(&self, document: DocumentFile) -> Result<UploadReceipt, BackendError>;

    /// Ask a question answered from the indexed documents.
    async fn ask(&self, request: QaRequest) -> Result<QaAnswer, BackendError>;

    /// Summarize free-form text.
    async fn summarize(&self, request: SummarizeRequest) -> Result<String, BackendError>;

    /// Generate an ordered learning path for a topic.
    async fn learning_path(&self, request: LearningPathRequest)
    -> Result<Vec<String>, BackendError>;

    /// Probe the backend root endpoint.
    async fn health(&self) -> Result<HealthStatus, BackendError>;
}

/// Lightweight reqwest client bound to one backend base URL.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    /// Construct a client for `base_url`, optionally bounding every request by `timeout`.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, BackendError> {
        let mut builder =
            Client::builder().user_agent(concat!("ragpanel/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        let base_url = normalize_base_url(base_url).map_err(BackendError::InvalidUrl)?;
        tracing::debug!(url = %base_url, timeout = ?timeout, "Initialized backend HTTP client");
        Ok(Self { client, base_url })
    }

    /// Construct a client from loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, BackendError> {
        Self::new(&config.api_url, config.request_timeout)
    }

    /// Normalized base URL every endpoint is resolved against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format_endpoint(&self.base_url, path))
    }
}

#[async_trait]
impl BackendApi for BackendClient {
    async fn upload_document(&self, document: DocumentFile) -> Result<UploadReceipt, BackendError> {
        let DocumentFile { file_name, bytes } = document;
        let size = bytes.len();
        let mut part = Part::bytes(bytes).file_name(file_name.clone());
        if let Some(kind) = DocumentKind::from_file_name(&file_name) {
            part = part.mime_str(kind.mime_type())?;
        }
        let form = Form::new().part("file", part);

        tracing::debug!(file = %file_name, bytes = size, "Uploading document");
        let response = self
            .request(Method::POST, "docs/upload")
            .multipart(form)
            .send()
            .await?;
        let receipt: UploadReceipt = decode(response, "docs/upload").await?;
        tracing::info!(
            file = %file_name,
            chunks_indexed = receipt.chunks_indexed,
            "Document indexed"
        );
        Ok(receipt)
    }

    async fn ask(&self, request: QaRequest) -> Result<QaAnswer, BackendError> {
        tracing::debug!(top_k = request.top_k, "Submitting question");
        let response = self
            .request(Method::POST, "qa/")
            .json(&request)
            .send()
            .await?;
        let answer: QaAnswer = decode(response, "qa/").await?;
        tracing::debug!(sources = answer.sources.len(), "Answer received");
        Ok(answer)
    }

    async fn summarize(&self, request: SummarizeRequest) -> Result<String, BackendError> {
        tracing::debug!(chars = request.text.chars().count(), "Submitting text for summary");
        let response = self
            .request(Method::POST, "summarize/")
            .json(&request)
            .send()
            .await?;
        let body: SummarizeResponse = decode(response, "summarize/").await?;
        Ok(body.summary)
    }

    async fn learning_path(
        &self,
        request: LearningPathRequest,
    ) -> Result<Vec<String>, BackendError> {
        tracing::debug!(topic = %request.topic, level = %request.level, "Requesting learning path");
        let response = self
            .request(Method::POST, "learning-path/")
            .json(&request)
            .send()
            .await?;
        let body: LearningPathResponse = decode(response, "learning-path/").await?;
        Ok(body.path)
    }

    async fn health(&self) -> Result<HealthStatus, BackendError> {
        let response = self.request(Method::GET, "").send().await?;
        decode(response, "/").await
    }
}

/// Reject non-success statuses, then parse the JSON body into `T`.
async fn decode<T: DeserializeOwned>(response: Response, endpoint: &str) -> Result<T, BackendError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(BackendError::UnexpectedStatus { status, body });
    }
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes)
        .map_err(|error| BackendError::InvalidResponse(format!("{endpoint}: {error}")))
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url.trim()).map_err(|err| err.to_string())?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", parsed.scheme()));
    }
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}
