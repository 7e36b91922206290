//! Single-document upload workflow.

use crate::backend::BackendClient;
use crate::mutation::{Mutation, MutationController, MutationState};
use crate::workflows::mappers;
use crate::workflows::types::{ClientError, DocumentFile, DocumentKind, UploadOutcome};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

const UPLOAD_FAILED: &str = "Upload failed";

struct UploadOperation {
    backend: Arc<BackendClient>,
}

#[async_trait]
impl Mutation<(DocumentFile, DocumentKind), UploadOutcome> for UploadOperation {
    async fn execute(
        &self,
        input: (DocumentFile, DocumentKind),
    ) -> Result<UploadOutcome, ClientError> {
        let (file, kind) = input;
        tracing::info!(file = %file.name, bytes = file.bytes.len(), "Uploading document");
        let response = self
            .backend
            .upload(&file.name, kind.mime_type(), file.bytes)
            .await
            .map_err(|err| ClientError::from_backend(err, UPLOAD_FAILED))?;
        let outcome = mappers::upload_outcome(response)?;
        tracing::info!(
            doc_id = %outcome.doc_id,
            pages = outcome.page_count,
            chunks = outcome.chunk_count,
            "Document ingested"
        );
        Ok(outcome)
    }
}

/// Validates and uploads one PDF or Markdown document at a time.
pub struct UploadClient {
    controller: MutationController<(DocumentFile, DocumentKind), UploadOutcome>,
}

impl UploadClient {
    /// Build an upload client sending to `backend`.
    pub fn new(backend: Arc<BackendClient>) -> Self {
        Self {
            controller: MutationController::new("upload", Arc::new(UploadOperation { backend })),
        }
    }

    /// Check that `file_name` is a PDF or Markdown file. Performs no I/O.
    pub fn validate(file_name: &str) -> Result<DocumentKind, ClientError> {
        DocumentKind::from_file_name(file_name)
    }

    /// Validate and upload in the background; see [`MutationController::submit`].
    pub fn submit(&self, file: DocumentFile) -> Result<JoinHandle<()>, ClientError> {
        let kind = Self::validate(&file.name)?;
        self.controller.submit((file, kind))
    }

    /// Validate and upload, waiting for the outcome.
    pub async fn upload(&self, file: DocumentFile) -> Result<UploadOutcome, ClientError> {
        let kind = Self::validate(&file.name)?;
        self.controller.run((file, kind)).await
    }

    /// Validate the file name, then read and upload the file at `path`.
    ///
    /// Files with an unsupported extension are never read.
    pub async fn upload_path(&self, path: &Path) -> Result<UploadOutcome, ClientError> {
        Self::validate(&DocumentFile::name_of(path)?)?;
        let file = DocumentFile::read(path).await?;
        self.upload(file).await
    }

    /// Latest upload state.
    pub fn state(&self) -> MutationState<UploadOutcome> {
        self.controller.current_state()
    }

    /// Receiver notified on every upload state transition.
    pub fn subscribe(&self) -> watch::Receiver<MutationState<UploadOutcome>> {
        self.controller.subscribe()
    }
}
