//! Plain-text rendering of workflow results for the command line.

use crate::backend::BackendHealth;
use crate::workflows::{BulkIngestionSummary, FileStatus, QueryResult, UploadOutcome};
use serde::Serialize;
use std::fmt::Write as _;

/// Number of leading characters of a document id shown in listings.
const SHORT_ID_LEN: usize = 8;

/// Serialize a value to pretty JSON, falling back to compact formatting on error.
pub fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|error| {
        tracing::warn!(%error, "Failed to serialize JSON prettily");
        serde_json::to_string(value).unwrap_or_else(|_| "{}".into())
    })
}

/// Leading characters of a document id, for compact listings.
pub fn short_id(doc_id: &str) -> &str {
    match doc_id.char_indices().nth(SHORT_ID_LEN) {
        Some((index, _)) => &doc_id[..index],
        None => doc_id,
    }
}

/// Render a single upload outcome.
pub fn upload_report(outcome: &UploadOutcome) -> String {
    format!(
        "Document ID: {}\nFile Name: {}\nPages: {}\nChunks: {}\nStatus: {}",
        outcome.doc_id, outcome.file_name, outcome.page_count, outcome.chunk_count, outcome.status
    )
}

/// Render a bulk ingestion summary followed by one line per file.
pub fn bulk_report(summary: &BulkIngestionSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Total Files: {}  Processed: {}  Successful: {}  Failed: {}  Skipped: {}",
        summary.total_files,
        summary.processed_files,
        summary.success_count,
        summary.error_count,
        summary.skipped_count
    );
    if summary.unknown_count > 0 {
        let _ = writeln!(out, "Unrecognized status: {}", summary.unknown_count);
    }
    let missing = summary.total_files.saturating_sub(summary.processed_files);
    if missing > 0 {
        let _ = writeln!(
            out,
            "Note: {missing} of {} files have no reported outcome",
            summary.total_files
        );
    }
    for mismatch in &summary.mismatches {
        let _ = writeln!(
            out,
            "Warning: backend reported {} = {}, results show {}",
            mismatch.field, mismatch.reported, mismatch.derived
        );
    }

    for item in &summary.items {
        let mut label = item.label().to_uppercase();
        if matches!(item.status, FileStatus::Unknown { .. }) {
            label.push('?');
        }
        let detail = match &item.status {
            FileStatus::Success {
                doc_id,
                page_count,
                chunk_count,
            } => format!(
                "{page_count} pages, {chunk_count} chunks  ID: {}...",
                short_id(doc_id)
            ),
            FileStatus::Error { error_message } => error_message.clone(),
            FileStatus::Skipped { reason } | FileStatus::Unknown { message: reason, .. } => {
                reason.clone().unwrap_or_default()
            }
        };
        let line = format!("[{label}] {}  {detail}", item.file_name);
        let _ = writeln!(out, "{}", line.trim_end());
    }

    out.trim_end().to_string()
}

/// Render an answer and its citations in rank order.
pub fn query_report(result: &QueryResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Answer\n{}\n", result.answer.trim());
    let _ = writeln!(
        out,
        "Sources ({} cited, {} retrieved)",
        result.sources.len(),
        result.retrieved_count
    );
    for (rank, source) in result.sources.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. Doc: {} • Page {} • Score {:.2}",
            rank + 1,
            source.doc_id,
            source.page,
            source.score
        );
        for line in source.snippet.lines() {
            let _ = writeln!(out, "   {line}");
        }
    }
    out.trim_end().to_string()
}

/// Render the backend health snapshot.
pub fn health_report(health: &BackendHealth) -> String {
    let mut out = format!("Status: {}", health.status);
    if let Some(model) = &health.models.embedding {
        let _ = write!(out, "\nEmbedding model: {model}");
    }
    if let Some(model) = &health.models.llm {
        let _ = write!(out, "\nLLM: {model}");
    }
    for (name, path) in &health.storage {
        let _ = write!(out, "\n{name}: {path}");
    }
    out
}
