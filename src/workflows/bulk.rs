//! Directory-wide ingestion workflow.

use crate::backend::BackendClient;
use crate::mutation::{Mutation, MutationController, MutationState};
use crate::workflows::aggregate::aggregate;
use crate::workflows::mappers;
use crate::workflows::types::{BulkIngestionSummary, ClientError};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

const BULK_UPLOAD_FAILED: &str = "Bulk upload failed";

struct BulkIngestOperation {
    backend: Arc<BackendClient>,
}

#[async_trait]
impl Mutation<String, BulkIngestionSummary> for BulkIngestOperation {
    async fn execute(&self, directory_path: String) -> Result<BulkIngestionSummary, ClientError> {
        tracing::info!(directory = %directory_path, "Starting bulk ingestion");
        let response = self
            .backend
            .bulk_upload(&directory_path)
            .await
            .map_err(|err| ClientError::from_backend(err, BULK_UPLOAD_FAILED))?;

        let (items, reported) = mappers::bulk_response(response);
        let summary = aggregate(items, &reported);

        for mismatch in &summary.mismatches {
            tracing::warn!(
                field = %mismatch.field,
                reported = mismatch.reported,
                derived = mismatch.derived,
                "Backend count disagrees with per-file outcomes"
            );
        }
        tracing::info!(
            directory = %directory_path,
            total = summary.total_files,
            processed = summary.processed_files,
            succeeded = summary.success_count,
            failed = summary.error_count,
            skipped = summary.skipped_count,
            "Bulk ingestion completed"
        );
        Ok(summary)
    }
}

/// Triggers backend-side ingestion of a whole directory and summarizes the per-file results.
pub struct BulkIngestClient {
    controller: MutationController<String, BulkIngestionSummary>,
}

impl BulkIngestClient {
    /// Build a bulk ingestion client sending to `backend`.
    pub fn new(backend: Arc<BackendClient>) -> Self {
        Self {
            controller: MutationController::new(
                "bulk-upload",
                Arc::new(BulkIngestOperation { backend }),
            ),
        }
    }

    /// Trim `directory_path`, rejecting blank input.
    pub fn validate(directory_path: &str) -> Result<String, ClientError> {
        let trimmed = directory_path.trim();
        if trimmed.is_empty() {
            return Err(ClientError::InvalidInput(
                "Please enter a directory path".into(),
            ));
        }
        Ok(trimmed.to_string())
    }

    /// Validate and ingest in the background; see [`MutationController::submit`].
    pub fn submit(&self, directory_path: &str) -> Result<JoinHandle<()>, ClientError> {
        let directory = Self::validate(directory_path)?;
        self.controller.submit(directory)
    }

    /// Validate and ingest, waiting for the summary.
    pub async fn ingest(&self, directory_path: &str) -> Result<BulkIngestionSummary, ClientError> {
        let directory = Self::validate(directory_path)?;
        self.controller.run(directory).await
    }

    /// Latest bulk ingestion state.
    pub fn state(&self) -> MutationState<BulkIngestionSummary> {
        self.controller.current_state()
    }

    /// Receiver notified on every bulk ingestion state transition.
    pub fn subscribe(&self) -> watch::Receiver<MutationState<BulkIngestionSummary>> {
        self.controller.subscribe()
    }
}
