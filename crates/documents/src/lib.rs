//! Client for the third-party document-generation API.
//!
//! One request per quotation: `POST {base_url}/documents` with the payload as JSON and
//! `Authorization: API-Key <key>`. Failures are reported, never retried.

use std::time::Duration;

use async_trait::async_trait;
use quoter_core::config::DocumentsConfig;
use quoter_core::QuotationPayload;
use reqwest::{header, Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("documents.api_key is not configured")]
    MissingApiKey,
    #[error("document request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("document API returned status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("could not decode document API response: {0}")]
    Decode(String),
}

impl SubmissionError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            Self::Transport(error) => error.status().map(|status| status.as_u16()),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SubmittedDocument {
    pub id: String,
    pub status: Option<String>,
    pub view_url: String,
}

#[derive(Debug, Deserialize)]
struct CreatedDocument {
    id: String,
    #[serde(default)]
    status: Option<String>,
}

#[async_trait]
pub trait DocumentSubmitter: Send + Sync {
    async fn submit(&self, payload: &QuotationPayload) -> Result<SubmittedDocument, SubmissionError>;
}

pub struct DocumentClient {
    client: Client,
    base_url: String,
    app_url: String,
    api_key: SecretString,
}

impl DocumentClient {
    pub fn new(config: &DocumentsConfig) -> Result<Self, SubmissionError> {
        let api_key = config.api_key.clone().ok_or(SubmissionError::MissingApiKey)?;
        if api_key.expose_secret().trim().is_empty() {
            return Err(SubmissionError::MissingApiKey);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(SubmissionError::Transport)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            app_url: config.app_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn documents_url(&self) -> String {
        format!("{}/documents", self.base_url)
    }

    pub fn view_url(&self, document_id: &str) -> String {
        format!("{}/{document_id}", self.app_url)
    }
}

#[async_trait]
impl DocumentSubmitter for DocumentClient {
    async fn submit(&self, payload: &QuotationPayload) -> Result<SubmittedDocument, SubmissionError> {
        info!(
            event_name = "documents.submit.start",
            template_uuid = %payload.template_uuid,
            document_name = %payload.name,
            "submitting quotation document"
        );

        let response = self
            .client
            .post(self.documents_url())
            .header(header::AUTHORIZATION, format!("API-Key {}", self.api_key.expose_secret()))
            .json(payload)
            .send()
            .await
            .map_err(|error| {
                error!(event_name = "documents.submit.transport_failed", error = %error, "document request failed");
                SubmissionError::Transport(error)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(SubmissionError::Transport)?;

        if !matches!(status, StatusCode::OK | StatusCode::CREATED) {
            error!(
                event_name = "documents.submit.rejected",
                status = status.as_u16(),
                "document API rejected quotation"
            );
            return Err(SubmissionError::Rejected { status: status.as_u16(), body });
        }

        let created: CreatedDocument =
            serde_json::from_str(&body).map_err(|error| SubmissionError::Decode(error.to_string()))?;
        if created.id.trim().is_empty() {
            return Err(SubmissionError::Decode("response did not include a document id".to_string()));
        }

        info!(
            event_name = "documents.submit.created",
            document_id = %created.id,
            status = status.as_u16(),
            "quotation document created"
        );

        Ok(SubmittedDocument {
            view_url: self.view_url(&created.id),
            id: created.id,
            status: created.status,
        })
    }
}
