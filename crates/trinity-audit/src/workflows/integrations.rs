//! Outbound collaborators shared by the audit and registration workflows:
//! the document store, file storage, and e-mail delivery.

use serde::{Deserialize, Serialize};

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Durable handle returned by the file storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub url: String,
    pub storage_id: String,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: usize,
}

/// Blob storage (Cloudinary in the hosted portal).
pub trait DocumentStorage: Send + Sync {
    fn store(
        &self,
        folder: &str,
        file_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<StoredFile, StorageError>;

    /// Best-effort removal; callers log failures and continue.
    fn delete(&self, storage_id: &str) -> Result<(), StorageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage upload failed: {0}")]
    Upload(String),
    #[error("stored file '{0}' not found")]
    Missing(String),
}

/// Outbound e-mail payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Fire-and-forget e-mail delivery.
pub trait Notifier: Send + Sync {
    fn send(&self, message: EmailMessage) -> Result<(), NotificationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("mail transport unavailable: {0}")]
    Transport(String),
}

/// Sends a message and logs, rather than returns, any delivery failure.
pub fn notify_best_effort(notifier: &dyn Notifier, message: EmailMessage) {
    let recipient = message.to.clone();
    let subject = message.subject.clone();
    if let Err(err) = notifier.send(message) {
        tracing::warn!(%recipient, %subject, error = %err, "notification delivery failed");
    }
}

/// Releases a stored file, logging failures.
pub fn release_best_effort(storage: &dyn DocumentStorage, storage_id: &str) {
    if let Err(err) = storage.delete(storage_id) {
        tracing::warn!(%storage_id, error = %err, "stored file cleanup failed");
    }
}
