//! Wire types and errors for the backend HTTP API.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors returned while talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before a complete response was received.
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// Backend responded with a non-success status code.
    #[error(
        "Backend responded with {status}: {}",
        .detail.as_deref().unwrap_or("no detail provided")
    )]
    Status {
        /// HTTP status returned by the backend.
        status: StatusCode,
        /// `detail` field of the error body, when present.
        detail: Option<String>,
    },
    /// Backend responded successfully but the body did not match the expected shape.
    #[error("Unexpected response body: {0}")]
    Malformed(String),
}

/// Body of `POST /upload` on success.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Identifier assigned to the new document.
    pub doc_id: String,
    /// Stored file name.
    pub file_name: String,
    /// Pages parsed.
    pub pages: u32,
    /// Chunks indexed.
    pub chunks: u32,
    /// Document status.
    pub status: String,
}

/// Body of `POST /bulk-upload`.
#[derive(Debug, Clone, Serialize)]
pub struct BulkUploadRequest<'a> {
    /// Directory on the backend host to scan.
    pub directory_path: &'a str,
}

/// Body of `POST /bulk-upload` on success.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkUploadResponse {
    /// Supported files found by the scan.
    #[serde(default)]
    pub total_files: Option<usize>,
    /// Files processed.
    #[serde(default)]
    pub processed_files: Option<usize>,
    /// Files ingested.
    #[serde(default)]
    pub successful_uploads: Option<usize>,
    /// Files that failed.
    #[serde(default)]
    pub failed_uploads: Option<usize>,
    /// Files skipped.
    #[serde(default)]
    pub skipped_files: Option<usize>,
    /// One entry per processed file.
    pub results: Vec<BulkUploadResult>,
}

/// One entry of [`BulkUploadResponse::results`].
#[derive(Debug, Clone, Deserialize)]
pub struct BulkUploadResult {
    /// File name without directory.
    pub file_name: String,
    /// Assigned document id on success.
    #[serde(default)]
    pub doc_id: Option<String>,
    /// Free-form status (`success`, `error`, `skipped`).
    pub status: String,
    /// Failure or skip explanation.
    #[serde(default)]
    pub error_message: Option<String>,
    /// Pages parsed on success.
    #[serde(default)]
    pub pages: Option<u32>,
    /// Chunks indexed on success.
    #[serde(default)]
    pub chunks: Option<u32>,
}

/// Body of `POST /query`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest<'a> {
    /// Question text.
    pub query: &'a str,
    /// Restrict retrieval to these documents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_ids: Option<Vec<&'a str>>,
    /// Maximum number of citations requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    /// Incremental delivery flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

/// Body of `POST /query` on success.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponse {
    /// Generated answer.
    pub answer: String,
    /// Ranked citations.
    pub sources: Vec<SourceChunk>,
    /// Retrieval statistics.
    pub usage: QueryUsage,
}

/// One citation in [`QueryResponse::sources`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceChunk {
    /// Source document.
    pub doc_id: String,
    /// Zero-based page index; Markdown chunks always report `0`.
    pub page: u32,
    /// Similarity score.
    pub score: f64,
    /// Cited text.
    pub snippet: String,
}

/// `usage` object of [`QueryResponse`].
#[derive(Debug, Clone, Deserialize)]
pub struct QueryUsage {
    /// Number of candidate passages retrieved.
    pub retrieved: usize,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendHealth {
    /// Overall status, `ok` when healthy.
    pub status: String,
    /// Models the backend is configured with.
    #[serde(default)]
    pub models: HealthModels,
    /// Storage locations used by the backend.
    #[serde(default)]
    pub storage: BTreeMap<String, String>,
}

impl BackendHealth {
    /// Whether the backend reported itself healthy.
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

/// `models` object of [`BackendHealth`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthModels {
    /// Embedding model identifier.
    #[serde(default)]
    pub embedding: Option<String>,
    /// Answer-generation model identifier.
    #[serde(default)]
    pub llm: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub(crate) detail: Option<Value>,
}

/// Pull a human-readable message out of an error body.
///
/// Handles plain `{"detail": "..."}` as well as validation errors where `detail` is a list of
/// objects carrying `msg`.
pub(crate) fn extract_detail(body: &str) -> Option<String> {
    let ErrorBody { detail } = serde_json::from_str(body).ok()?;
    match detail? {
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Array(entries) => {
            let messages: Vec<&str> = entries
                .iter()
                .filter_map(|entry| entry.get("msg").and_then(Value::as_str))
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        _ => None,
    }
}
