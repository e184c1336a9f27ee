//! Redmine ticket client implementation.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{header, Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::RedmineConfig;

use super::{
    Attachment, Note, Ticket, TicketClient, TicketClientError, TicketId, TicketStatus,
    TicketUpdate, UploadToken,
};

/// Header carrying the REST API key.
const API_KEY_HEADER: &str = "X-Redmine-API-Key";

/// Redmine REST client.
pub struct RedmineClient {
    client: Client,
    config: RedmineConfig,
}

impl RedmineClient {
    /// Create a new Redmine client.
    pub fn new(config: RedmineConfig) -> Result<Self, TicketClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| {
                TicketClientError::ConnectionFailed(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client, config })
    }

    /// Get the base URL without trailing slash.
    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    /// Numeric status id for a ticket state.
    fn status_id(&self, status: TicketStatus) -> u32 {
        let ids = &self.config.statuses;
        match status {
            TicketStatus::Open => ids.open,
            TicketStatus::InProgress => ids.in_progress,
            TicketStatus::Resolved => ids.resolved,
            TicketStatus::Error => ids.error,
        }
    }

    /// Ticket state for a numeric status id. When several states share an
    /// id, the earlier state in lifecycle order wins.
    fn status_from_id(&self, id: u32) -> Option<TicketStatus> {
        [
            TicketStatus::Open,
            TicketStatus::InProgress,
            TicketStatus::Resolved,
            TicketStatus::Error,
        ]
        .into_iter()
        .find(|status| self.status_id(*status) == id)
    }

    fn map_send_error(e: reqwest::Error) -> TicketClientError {
        if e.is_timeout() {
            TicketClientError::Timeout
        } else if e.is_connect() {
            TicketClientError::ConnectionFailed(e.to_string())
        } else {
            TicketClientError::InvalidResponse(e.to_string())
        }
    }

    /// Turn a non-success response into an API error.
    async fn check_status(response: Response) -> Result<Response, TicketClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(TicketClientError::Api {
            status: status.as_u16(),
            body: body.chars().take(500).collect(),
        })
    }

    fn ticket_from_issue(&self, issue: IssueDto) -> Ticket {
        Ticket {
            id: issue.id,
            subject: issue.subject,
            status_id: issue.status.id,
            status: self.status_from_id(issue.status.id),
            notes: issue
                .journals
                .into_iter()
                .filter_map(|j| {
                    let text = j.notes.filter(|n| !n.is_empty())?;
                    Some(Note {
                        id: j.id,
                        author: j.user.map(|u| u.name),
                        text,
                        created_on: j.created_on,
                    })
                })
                .collect(),
            attachments: issue
                .attachments
                .into_iter()
                .map(|a| Attachment {
                    id: a.id,
                    filename: a.filename,
                    filesize: a.filesize,
                    content_type: a.content_type,
                    content_url: a.content_url,
                    created_on: a.created_on,
                })
                .collect(),
        }
    }
}

/// Content type announced for an uploaded file.
fn content_type_for(filename: &str) -> &'static str {
    let lower = filename.to_ascii_lowercase();
    if lower.ends_with(".zip") {
        "application/zip"
    } else if lower.ends_with(".xlsx") {
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    } else if lower.ends_with(".txt") {
        "text/plain"
    } else {
        "application/octet-stream"
    }
}

#[async_trait]
impl TicketClient for RedmineClient {
    fn name(&self) -> &str {
        "redmine"
    }

    async fn get_ticket(&self, id: TicketId) -> Result<Ticket, TicketClientError> {
        let url = format!("{}/issues/{}.json", self.base_url(), id);
        let response = self
            .client
            .get(&url)
            .query(&[("include", "attachments,journals")])
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(TicketClientError::TicketNotFound(id));
        }
        let response = Self::check_status(response).await?;

        let envelope: IssueEnvelope = response
            .json()
            .await
            .map_err(|e| TicketClientError::InvalidResponse(e.to_string()))?;

        debug!(
            ticket_id = id,
            attachments = envelope.issue.attachments.len(),
            "Fetched Redmine issue"
        );
        Ok(self.ticket_from_issue(envelope.issue))
    }

    async fn download_attachment(
        &self,
        attachment: &Attachment,
    ) -> Result<Vec<u8>, TicketClientError> {
        let response = self
            .client
            .get(&attachment.content_url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await
            .map_err(Self::map_send_error)?;
        let response = Self::check_status(response).await?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TicketClientError::InvalidResponse(e.to_string()))?;

        if attachment.filesize > 0 && bytes.len() as u64 != attachment.filesize {
            warn!(
                attachment_id = attachment.id,
                expected = attachment.filesize,
                actual = bytes.len(),
                "Attachment size differs from metadata"
            );
        }
        Ok(bytes.to_vec())
    }

    async fn upload_file(
        &self,
        path: &Path,
        filename: &str,
    ) -> Result<UploadToken, TicketClientError> {
        let body = tokio::fs::read(path).await?;
        let url = format!(
            "{}/uploads.json?filename={}",
            self.base_url(),
            urlencoding::encode(filename)
        );

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(body)
            .send()
            .await
            .map_err(Self::map_send_error)?;
        let response = Self::check_status(response).await?;

        let envelope: UploadEnvelope = response
            .json()
            .await
            .map_err(|e| TicketClientError::InvalidResponse(e.to_string()))?;

        Ok(UploadToken {
            token: envelope.upload.token,
            filename: filename.to_string(),
            content_type: content_type_for(filename).to_string(),
        })
    }

    async fn update_ticket(
        &self,
        id: TicketId,
        update: TicketUpdate,
    ) -> Result<(), TicketClientError> {
        let url = format!("{}/issues/{}.json", self.base_url(), id);
        let body = IssueUpdateEnvelope {
            issue: IssueUpdateBody {
                notes: update.notes.as_deref(),
                status_id: update.status.map(|s| self.status_id(s)),
                uploads: &update.uploads,
            },
        };

        let response = self
            .client
            .put(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(TicketClientError::TicketNotFound(id));
        }
        Self::check_status(response).await?;
        Ok(())
    }
}

// Redmine wire types

#[derive(Debug, Deserialize)]
struct IssueEnvelope {
    issue: IssueDto,
}

#[derive(Debug, Deserialize)]
struct IssueDto {
    id: u64,
    #[serde(default)]
    subject: String,
    status: NamedRef,
    #[serde(default)]
    attachments: Vec<AttachmentDto>,
    #[serde(default)]
    journals: Vec<JournalDto>,
}

#[derive(Debug, Deserialize)]
struct NamedRef {
    id: u32,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct AttachmentDto {
    id: u64,
    filename: String,
    #[serde(default)]
    filesize: u64,
    #[serde(default)]
    content_type: Option<String>,
    content_url: String,
    #[serde(default)]
    created_on: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct JournalDto {
    id: u64,
    #[serde(default)]
    user: Option<NamedRef>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    created_on: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct UploadEnvelope {
    upload: UploadDto,
}

#[derive(Debug, Deserialize)]
struct UploadDto {
    token: String,
}

#[derive(Debug, Serialize)]
struct IssueUpdateEnvelope<'a> {
    issue: IssueUpdateBody<'a>,
}

#[derive(Debug, Serialize)]
struct IssueUpdateBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status_id: Option<u32>,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    uploads: &'a [UploadToken],
}
