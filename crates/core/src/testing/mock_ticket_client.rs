//! Mock ticket client for testing.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::ticket::{
    Attachment, Note, Ticket, TicketClient, TicketClientError, TicketId, TicketStatus,
    TicketUpdate, UploadToken,
};

/// A recorded ticket update.
#[derive(Debug, Clone)]
pub struct RecordedUpdate {
    pub ticket_id: TicketId,
    pub update: TicketUpdate,
}

/// A recorded file upload, with the content as it was at upload time.
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub path: PathBuf,
    pub filename: String,
    pub bytes: Vec<u8>,
    pub token: String,
}

/// Mock implementation of the TicketClient trait.
///
/// Provides controllable behavior for testing:
/// - Seed tickets and attachment content
/// - Track updates and uploads for assertions
/// - Inject failures on the next call or on every update
///
/// Updates are also applied to the stored ticket (notes appended, status
/// changed), so `get_ticket` reflects what a real backend would show.
#[derive(Debug, Clone)]
pub struct MockTicketClient {
    tickets: Arc<RwLock<HashMap<TicketId, Ticket>>>,
    /// Attachment content by attachment id.
    contents: Arc<RwLock<HashMap<u64, Vec<u8>>>>,
    updates: Arc<RwLock<Vec<RecordedUpdate>>>,
    uploads: Arc<RwLock<Vec<RecordedUpload>>>,
    /// If set, the next call fails with this error.
    next_error: Arc<RwLock<Option<TicketClientError>>>,
    /// If set, every update fails.
    fail_updates: Arc<RwLock<bool>>,
}

impl Default for MockTicketClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTicketClient {
    /// Create a new mock client with no tickets.
    pub fn new() -> Self {
        Self {
            tickets: Arc::new(RwLock::new(HashMap::new())),
            contents: Arc::new(RwLock::new(HashMap::new())),
            updates: Arc::new(RwLock::new(Vec::new())),
            uploads: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            fail_updates: Arc::new(RwLock::new(false)),
        }
    }

    /// Add or replace a ticket.
    pub async fn add_ticket(&self, ticket: Ticket) {
        self.tickets.write().await.insert(ticket.id, ticket);
    }

    /// Add an open ticket without attachments.
    pub async fn add_empty_ticket(&self, id: TicketId, subject: &str) {
        self.add_ticket(Ticket {
            id,
            subject: subject.to_string(),
            status_id: 1,
            status: Some(TicketStatus::Open),
            notes: Vec::new(),
            attachments: Vec::new(),
        })
        .await;
    }

    /// Attach a file to an existing ticket and register its content.
    pub async fn add_attachment(
        &self,
        ticket_id: TicketId,
        attachment_id: u64,
        filename: &str,
        bytes: Vec<u8>,
    ) {
        let attachment = Attachment {
            id: attachment_id,
            filename: filename.to_string(),
            filesize: bytes.len() as u64,
            content_type: None,
            content_url: format!(
                "mock://attachments/download/{}/{}",
                attachment_id, filename
            ),
            created_on: Some(Utc::now()),
        };

        if let Some(ticket) = self.tickets.write().await.get_mut(&ticket_id) {
            ticket.attachments.push(attachment);
        }
        self.contents.write().await.insert(attachment_id, bytes);
    }

    /// Get a stored ticket.
    pub async fn ticket(&self, id: TicketId) -> Option<Ticket> {
        self.tickets.read().await.get(&id).cloned()
    }

    /// Get all recorded updates.
    pub async fn recorded_updates(&self) -> Vec<RecordedUpdate> {
        self.updates.read().await.clone()
    }

    /// Note texts posted to a ticket, in order.
    pub async fn notes(&self, id: TicketId) -> Vec<String> {
        self.updates
            .read()
            .await
            .iter()
            .filter(|r| r.ticket_id == id)
            .filter_map(|r| r.update.notes.clone())
            .collect()
    }

    /// The most recent status change applied to a ticket.
    pub async fn last_status(&self, id: TicketId) -> Option<TicketStatus> {
        self.updates
            .read()
            .await
            .iter()
            .rev()
            .filter(|r| r.ticket_id == id)
            .find_map(|r| r.update.status)
    }

    /// Get all recorded uploads.
    pub async fn recorded_uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.read().await.clone()
    }

    /// Configure the next call to fail with the given error.
    pub async fn set_next_error(&self, error: TicketClientError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make every subsequent update fail.
    pub async fn set_fail_updates(&self, fail: bool) {
        *self.fail_updates.write().await = fail;
    }

    /// Take the next error if set.
    async fn take_error(&self) -> Option<TicketClientError> {
        self.next_error.write().await.take()
    }
}

#[async_trait]
impl TicketClient for MockTicketClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn get_ticket(&self, id: TicketId) -> Result<Ticket, TicketClientError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        self.tickets
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(TicketClientError::TicketNotFound(id))
    }

    async fn download_attachment(
        &self,
        attachment: &Attachment,
    ) -> Result<Vec<u8>, TicketClientError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        self.contents
            .read()
            .await
            .get(&attachment.id)
            .cloned()
            .ok_or_else(|| TicketClientError::Api {
                status: 404,
                body: format!("attachment {} has no content", attachment.id),
            })
    }

    async fn upload_file(
        &self,
        path: &Path,
        filename: &str,
    ) -> Result<UploadToken, TicketClientError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        let bytes = tokio::fs::read(path).await?;
        let mut uploads = self.uploads.write().await;
        let token = format!("{}.mock", uploads.len() + 1);
        uploads.push(RecordedUpload {
            path: path.to_path_buf(),
            filename: filename.to_string(),
            bytes,
            token: token.clone(),
        });

        Ok(UploadToken {
            token,
            filename: filename.to_string(),
            content_type: "application/octet-stream".to_string(),
        })
    }

    async fn update_ticket(
        &self,
        id: TicketId,
        update: TicketUpdate,
    ) -> Result<(), TicketClientError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        if *self.fail_updates.read().await {
            return Err(TicketClientError::ConnectionFailed(
                "mock update failure".to_string(),
            ));
        }

        let mut tickets = self.tickets.write().await;
        let ticket = tickets
            .get_mut(&id)
            .ok_or(TicketClientError::TicketNotFound(id))?;

        if let Some(text) = &update.notes {
            ticket.notes.push(Note {
                id: ticket.notes.len() as u64 + 1,
                author: Some("mock".to_string()),
                text: text.clone(),
                created_on: Some(Utc::now()),
            });
        }
        if let Some(status) = update.status {
            ticket.status = Some(status);
        }

        self.updates.write().await.push(RecordedUpdate {
            ticket_id: id,
            update,
        });
        Ok(())
    }
}
