//! Types for ticketing operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Numeric ticket identifier.
pub type TicketId = u64;

/// Errors that can occur during ticketing operations.
#[derive(Debug, Error)]
pub enum TicketClientError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Ticket not found: {0}")]
    TicketNotFound(TicketId),

    #[error("Ticket {0} has no attachments")]
    NoAttachment(TicketId),

    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timeout")]
    Timeout,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Lifecycle state of a ticket, as far as this tool is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
    Error,
}

impl TicketStatus {
    /// Returns the string representation for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Error => "error",
        }
    }

    /// Whether no further work happens on the ticket after this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TicketStatus::Resolved | TicketStatus::Error)
    }
}

/// A file attached to a ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: u64,
    pub filename: String,
    #[serde(default)]
    pub filesize: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Absolute download URL.
    pub content_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<DateTime<Utc>>,
}

/// A note (journal entry) on a ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<DateTime<Utc>>,
}

/// Ticket metadata, including notes and attachments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub subject: String,
    /// Raw status id reported by the backend.
    pub status_id: u32,
    /// Status id mapped back to a known state, if it matches one.
    pub status: Option<TicketStatus>,
    pub notes: Vec<Note>,
    pub attachments: Vec<Attachment>,
}

impl Ticket {
    /// The attachment with the highest id.
    ///
    /// Equal ids resolve to the one listed last.
    pub fn latest_attachment(&self) -> Option<&Attachment> {
        self.attachments.iter().max_by_key(|a| a.id)
    }
}

/// Token returned by the backend for an uploaded file, referenced by a
/// subsequent ticket update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadToken {
    pub token: String,
    pub filename: String,
    pub content_type: String,
}

/// A single update applied to a ticket.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketUpdate {
    pub notes: Option<String>,
    pub status: Option<TicketStatus>,
    pub uploads: Vec<UploadToken>,
}

impl TicketUpdate {
    /// An update that appends a note.
    pub fn note(text: impl Into<String>) -> Self {
        Self {
            notes: Some(text.into()),
            ..Default::default()
        }
    }

    /// Transition the ticket to `status`.
    pub fn with_status(mut self, status: TicketStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Attach a previously uploaded file.
    pub fn with_upload(mut self, upload: UploadToken) -> Self {
        self.uploads.push(upload);
        self
    }
}

/// An attachment together with its downloaded content.
#[derive(Debug, Clone)]
pub struct FetchedAttachment {
    pub attachment: Attachment,
    pub bytes: Vec<u8>,
}
