//! Conversion of backend wire types into validated view-models.

use crate::backend::{BulkUploadResponse, BulkUploadResult, QueryResponse, UploadResponse};
use crate::workflows::types::{
    ClientError, FileOutcome, FileStatus, QueryResult, ReportedCounts, SourceCitation,
    UploadOutcome,
};
use std::num::NonZeroU32;

/// Message used for an `error` item that arrived without an explanation.
const MISSING_ERROR_MESSAGE: &str = "Backend reported an error without a message";

/// Message attached to a `success` item that lacks its ingestion details.
const INCOMPLETE_SUCCESS_MESSAGE: &str = "Reported success without doc_id, pages, or chunks";

pub(crate) fn upload_outcome(response: UploadResponse) -> Result<UploadOutcome, ClientError> {
    let UploadResponse {
        doc_id,
        file_name,
        pages,
        chunks,
        status,
    } = response;

    if doc_id.trim().is_empty() {
        return Err(ClientError::MalformedResponse(format!(
            "upload of {file_name} returned an empty docId"
        )));
    }

    Ok(UploadOutcome {
        doc_id,
        file_name,
        page_count: pages,
        chunk_count: chunks,
        status,
    })
}

/// Classify one bulk item.
///
/// A `success` entry missing `doc_id`, `pages`, or `chunks` cannot be trusted as ingested and is
/// kept as [`FileStatus::Unknown`] so the other outcomes in the batch still surface.
pub(crate) fn file_outcome(result: BulkUploadResult) -> FileOutcome {
    let BulkUploadResult {
        file_name,
        doc_id,
        status,
        error_message,
        pages,
        chunks,
    } = result;

    let normalized = status.trim().to_lowercase();
    let status = match normalized.as_str() {
        "success" => {
            let doc_id = doc_id.filter(|id| !id.trim().is_empty());
            match (doc_id, pages, chunks) {
                (Some(doc_id), Some(page_count), Some(chunk_count)) => FileStatus::Success {
                    doc_id,
                    page_count,
                    chunk_count,
                },
                _ => {
                    tracing::warn!(file = %file_name, "Success entry lacks ingestion details");
                    FileStatus::Unknown {
                        reported: normalized.clone(),
                        message: Some(INCOMPLETE_SUCCESS_MESSAGE.to_string()),
                    }
                }
            }
        }
        other => {
            if doc_id.is_some() || pages.is_some() || chunks.is_some() {
                tracing::warn!(
                    file = %file_name,
                    status = other,
                    "Ignoring ingestion details attached to a non-success entry"
                );
            }
            match other {
                "error" => FileStatus::Error {
                    error_message: error_message
                        .unwrap_or_else(|| MISSING_ERROR_MESSAGE.to_string()),
                },
                "skipped" => FileStatus::Skipped {
                    reason: error_message,
                },
                _ => {
                    tracing::warn!(file = %file_name, status = %status, "Unrecognized file status");
                    FileStatus::Unknown {
                        reported: status,
                        message: error_message,
                    }
                }
            }
        }
    };

    FileOutcome { file_name, status }
}

/// Split a bulk response into classified items (input order kept) and the backend's claims.
pub(crate) fn bulk_response(response: BulkUploadResponse) -> (Vec<FileOutcome>, ReportedCounts) {
    let reported = ReportedCounts {
        total_files: response.total_files,
        processed_files: response.processed_files,
        success_count: response.successful_uploads,
        error_count: response.failed_uploads,
        skipped_count: response.skipped_files,
    };
    let items = response.results.into_iter().map(file_outcome).collect();
    (items, reported)
}

pub(crate) fn query_result(response: QueryResponse) -> Result<QueryResult, ClientError> {
    let QueryResponse {
        answer,
        sources,
        usage,
    } = response;

    if usage.retrieved == 0 && !sources.is_empty() {
        return Err(ClientError::MalformedResponse(format!(
            "query reported 0 retrieved passages but cited {}",
            sources.len()
        )));
    }

    let sources = sources
        .into_iter()
        .map(|source| SourceCitation {
            doc_id: source.doc_id,
            page: NonZeroU32::MIN.saturating_add(source.page),
            score: source.score,
            snippet: source.snippet,
        })
        .collect();

    Ok(QueryResult {
        answer,
        sources,
        retrieved_count: usage.retrieved,
    })
}
