//! Ticket client trait.

use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, info};

use super::types::{
    Attachment, FetchedAttachment, Ticket, TicketClientError, TicketId, TicketStatus,
    TicketUpdate, UploadToken,
};

/// Access to the external ticketing system.
///
/// Implementations provide the four primitives; the workflow operations
/// (`fetch_attachment`, `post_note`, `upload_artifact`) are built on them.
#[async_trait]
pub trait TicketClient: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Get a ticket including its attachments and notes.
    async fn get_ticket(&self, id: TicketId) -> Result<Ticket, TicketClientError>;

    /// Download the content of an attachment.
    async fn download_attachment(
        &self,
        attachment: &Attachment,
    ) -> Result<Vec<u8>, TicketClientError>;

    /// Upload a file so a later update can attach it under `filename`.
    async fn upload_file(
        &self,
        path: &Path,
        filename: &str,
    ) -> Result<UploadToken, TicketClientError>;

    /// Apply an update (note, status change, uploads) to a ticket.
    async fn update_ticket(
        &self,
        id: TicketId,
        update: TicketUpdate,
    ) -> Result<(), TicketClientError>;

    /// Download the most recent attachment of a ticket.
    ///
    /// Fails with [`TicketClientError::NoAttachment`] when the ticket has none.
    async fn fetch_attachment(
        &self,
        id: TicketId,
    ) -> Result<FetchedAttachment, TicketClientError> {
        let ticket = self.get_ticket(id).await?;
        let attachment = ticket
            .latest_attachment()
            .cloned()
            .ok_or(TicketClientError::NoAttachment(id))?;

        debug!(
            ticket_id = id,
            attachment_id = attachment.id,
            filename = %attachment.filename,
            "Downloading attachment"
        );
        let bytes = self.download_attachment(&attachment).await?;

        Ok(FetchedAttachment { attachment, bytes })
    }

    /// Append a note, optionally changing the status.
    async fn post_note(
        &self,
        id: TicketId,
        text: &str,
        status: Option<TicketStatus>,
    ) -> Result<(), TicketClientError> {
        let mut update = TicketUpdate::note(text);
        update.status = status;
        self.update_ticket(id, update).await
    }

    /// Upload a file, attach it under `display_name` and move the ticket to
    /// `final_status` with `note`.
    async fn upload_artifact(
        &self,
        id: TicketId,
        path: &Path,
        display_name: &str,
        final_status: TicketStatus,
        note: &str,
    ) -> Result<(), TicketClientError> {
        let token = self.upload_file(path, display_name).await?;
        self.update_ticket(
            id,
            TicketUpdate::note(note)
                .with_status(final_status)
                .with_upload(token),
        )
        .await?;

        info!(
            ticket_id = id,
            artifact = display_name,
            status = final_status.as_str(),
            "Uploaded artifact"
        );
        Ok(())
    }
}
