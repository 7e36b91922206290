//! View-models and error definitions shared by the workflow clients.

use crate::backend::BackendError;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::num::NonZeroU32;
use std::path::Path;
use thiserror::Error;

/// Errors surfaced to callers of the workflow clients.
///
/// Cloneable so that a failed request can be held inside [`crate::mutation::MutationState`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// A local precondition failed; nothing was sent to the backend.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// The selected file is neither PDF nor Markdown.
    #[error(
        "Unsupported file type {}: only PDF and Markdown files are accepted",
        describe_extension(.extension)
    )]
    UnsupportedFileType {
        /// Lowercase extension of the rejected file including the dot, empty when absent.
        extension: String,
    },
    /// The backend answered with a non-2xx status or could not be reached at all.
    #[error("{message}")]
    RequestFailed {
        /// HTTP status when a response was received.
        status: Option<u16>,
        /// Server-provided detail, or a generic message when none was available.
        message: String,
    },
    /// The backend answered 2xx with a body that does not match the expected shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    /// A request from the same client is still in flight.
    #[error("A request is already in progress")]
    Busy,
    /// A local file could not be read.
    #[error("Failed to read {path}: {message}")]
    Io {
        /// Path that failed to load.
        path: String,
        /// Underlying I/O error text.
        message: String,
    },
}

/// Discriminant of [`ClientError`], convenient for matching without payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`ClientError::InvalidInput`].
    InvalidInput,
    /// See [`ClientError::UnsupportedFileType`].
    UnsupportedFileType,
    /// See [`ClientError::RequestFailed`].
    RequestFailed,
    /// See [`ClientError::MalformedResponse`].
    MalformedResponse,
    /// See [`ClientError::Busy`].
    Busy,
    /// See [`ClientError::Io`].
    Io,
}

impl ClientError {
    /// Payload-free discriminant of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::UnsupportedFileType { .. } => ErrorKind::UnsupportedFileType,
            Self::RequestFailed { .. } => ErrorKind::RequestFailed,
            Self::MalformedResponse(_) => ErrorKind::MalformedResponse,
            Self::Busy => ErrorKind::Busy,
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    /// Map a boundary error into the caller-facing taxonomy.
    ///
    /// `fallback` is the generic message used when the backend supplied no `detail`.
    pub(crate) fn from_backend(error: BackendError, fallback: &str) -> Self {
        match error {
            BackendError::Status { status, detail } => Self::RequestFailed {
                status: Some(status.as_u16()),
                message: detail.unwrap_or_else(|| fallback.to_string()),
            },
            BackendError::Transport(err) if err.is_timeout() => Self::RequestFailed {
                status: None,
                message: format!("{fallback}: request timed out"),
            },
            BackendError::Transport(err) => Self::RequestFailed {
                status: err.status().map(|status| status.as_u16()),
                message: format!("{fallback}: {err}"),
            },
            BackendError::InvalidUrl(url) => Self::RequestFailed {
                status: None,
                message: format!("{fallback}: invalid backend URL ({url})"),
            },
            BackendError::Malformed(reason) => Self::MalformedResponse(reason),
        }
    }
}

fn describe_extension(extension: &str) -> String {
    if extension.is_empty() {
        "(no extension)".to_string()
    } else {
        format!("'{extension}'")
    }
}

/// Document formats accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// `.pdf`
    Pdf,
    /// `.md` or `.markdown`
    Markdown,
}

impl DocumentKind {
    /// Classify a file name by its extension, case-insensitively.
    pub fn from_file_name(file_name: &str) -> Result<Self, ClientError> {
        let lower = file_name.trim().to_lowercase();
        if lower.ends_with(".pdf") {
            Ok(Self::Pdf)
        } else if lower.ends_with(".md") || lower.ends_with(".markdown") {
            Ok(Self::Markdown)
        } else {
            let extension = lower
                .rsplit_once('.')
                .map(|(_, ext)| format!(".{ext}"))
                .unwrap_or_default();
            Err(ClientError::UnsupportedFileType { extension })
        }
    }

    /// MIME type sent with the multipart file part.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Markdown => "text/markdown",
        }
    }
}

/// A local document held in memory, ready to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFile {
    /// File name as presented to the backend.
    pub name: String,
    /// Full file content.
    pub bytes: Vec<u8>,
}

impl DocumentFile {
    /// Wrap already-loaded content.
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// File name component of `path`, used for validation before the file is read.
    pub fn name_of(path: &Path) -> Result<String, ClientError> {
        path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                ClientError::InvalidInput(format!("{} does not name a file", path.display()))
            })
    }

    /// Read a document from disk.
    pub async fn read(path: &Path) -> Result<Self, ClientError> {
        let name = Self::name_of(path)?;
        let bytes = tokio::fs::read(path).await.map_err(|err| ClientError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        Ok(Self { name, bytes })
    }
}

/// Result of ingesting a single uploaded document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutcome {
    /// Opaque identifier of the ingested document; never empty.
    pub doc_id: String,
    /// File name recorded by the backend.
    pub file_name: String,
    /// Number of pages parsed.
    pub page_count: u32,
    /// Number of chunks indexed.
    pub chunk_count: u32,
    /// Backend-reported document status (for example `ready`).
    pub status: String,
}

/// Per-file result of a bulk ingestion, with the data each status carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum FileStatus {
    /// The document was ingested.
    Success {
        /// Identifier assigned to the new document.
        doc_id: String,
        /// Number of pages parsed.
        page_count: u32,
        /// Number of chunks indexed.
        chunk_count: u32,
    },
    /// Ingestion of this file failed.
    Error {
        /// Backend explanation of the failure.
        error_message: String,
    },
    /// The backend chose not to ingest this file.
    Skipped {
        /// Why it was skipped, when the backend said so.
        reason: Option<String>,
    },
    /// A status value this client does not recognize.
    Unknown {
        /// The raw status string as reported.
        reported: String,
        /// Accompanying message, if any.
        message: Option<String>,
    },
}

/// One entry of a bulk ingestion result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileOutcome {
    /// Name of the processed file.
    pub file_name: String,
    /// Classified outcome.
    #[serde(flatten)]
    pub status: FileStatus,
}

impl FileOutcome {
    /// Document identifier, present only for successful files.
    pub fn doc_id(&self) -> Option<&str> {
        match &self.status {
            FileStatus::Success { doc_id, .. } => Some(doc_id),
            _ => None,
        }
    }

    /// Page count, present only for successful files.
    pub fn page_count(&self) -> Option<u32> {
        match self.status {
            FileStatus::Success { page_count, .. } => Some(page_count),
            _ => None,
        }
    }

    /// Chunk count, present only for successful files.
    pub fn chunk_count(&self) -> Option<u32> {
        match self.status {
            FileStatus::Success { chunk_count, .. } => Some(chunk_count),
            _ => None,
        }
    }

    /// Error message, present only for failed files.
    pub fn error_message(&self) -> Option<&str> {
        match &self.status {
            FileStatus::Error { error_message } => Some(error_message),
            _ => None,
        }
    }

    /// Status label as the backend spells it.
    pub fn label(&self) -> &str {
        match &self.status {
            FileStatus::Success { .. } => "success",
            FileStatus::Error { .. } => "error",
            FileStatus::Skipped { .. } => "skipped",
            FileStatus::Unknown { reported, .. } => reported,
        }
    }
}

/// Counts the backend claims for a bulk ingestion; any of them may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportedCounts {
    /// Number of supported files found by the directory scan.
    pub total_files: Option<usize>,
    /// Number of files the backend says it processed.
    pub processed_files: Option<usize>,
    /// Reported successful uploads.
    pub success_count: Option<usize>,
    /// Reported failed uploads.
    pub error_count: Option<usize>,
    /// Reported skipped files.
    pub skipped_count: Option<usize>,
}

/// Summary field that a backend-reported count is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CountField {
    /// `total_files`
    TotalFiles,
    /// `processed_files`
    ProcessedFiles,
    /// `successful_uploads`
    SuccessCount,
    /// `failed_uploads`
    ErrorCount,
    /// `skipped_files`
    SkippedCount,
}

impl fmt::Display for CountField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TotalFiles => "total_files",
            Self::ProcessedFiles => "processed_files",
            Self::SuccessCount => "successful_uploads",
            Self::ErrorCount => "failed_uploads",
            Self::SkippedCount => "skipped_files",
        };
        f.write_str(name)
    }
}

/// A backend-reported count that disagrees with the per-file outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountMismatch {
    /// Which count disagrees.
    pub field: CountField,
    /// Value the backend reported.
    pub reported: usize,
    /// Value derived from the items.
    pub derived: usize,
}

/// Aggregated view of a bulk ingestion.
///
/// `success_count + error_count + skipped_count + unknown_count == processed_files ==
/// items.len()` and `processed_files <= total_files` always hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkIngestionSummary {
    /// Files found by the scan; may exceed `processed_files` if the backend stopped early.
    pub total_files: usize,
    /// Files with an outcome in `items`.
    pub processed_files: usize,
    /// Items with status `success`.
    pub success_count: usize,
    /// Items with status `error`.
    pub error_count: usize,
    /// Items with status `skipped`.
    pub skipped_count: usize,
    /// Items with an unrecognized status.
    pub unknown_count: usize,
    /// Per-file outcomes in the order the backend returned them.
    pub items: Vec<FileOutcome>,
    /// Backend counts that disagree with `items`.
    pub mismatches: Vec<CountMismatch>,
}

impl BulkIngestionSummary {
    /// Whether every scanned file has an outcome.
    pub fn is_complete(&self) -> bool {
        self.processed_files == self.total_files
    }

    /// Whether the backend counts agreed with the per-file outcomes.
    pub fn is_consistent(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// A passage cited as evidence for an answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceCitation {
    /// Document the passage came from.
    pub doc_id: String,
    /// One-based page number. The backend counts pages from zero; Markdown documents are a
    /// single page 1.
    pub page: NonZeroU32,
    /// Similarity score reported by the backend.
    pub score: f64,
    /// Excerpt of the cited text.
    pub snippet: String,
}

/// Answer to a question plus its citations, in backend rank order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    /// Generated answer text.
    pub answer: String,
    /// Citations exactly as returned, never re-sorted or truncated.
    pub sources: Vec<SourceCitation>,
    /// Number of candidate passages retrieved; may exceed `sources.len()`.
    pub retrieved_count: usize,
}

/// Optional parameters for a query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Restrict retrieval to these documents.
    pub doc_ids: Option<BTreeSet<String>>,
    /// Hint for the maximum number of citations.
    pub top_k: Option<u32>,
    /// Ask the backend for incremental delivery.
    pub stream: Option<bool>,
}
