//! Summary statistics for bulk ingestion results.

use crate::workflows::types::{
    BulkIngestionSummary, CountField, CountMismatch, FileOutcome, FileStatus, ReportedCounts,
};

/// Count per-file outcomes into a [`BulkIngestionSummary`].
///
/// Derived counts always come from `items`; `reported` only supplies `total_files` and is
/// otherwise checked against the derived values, each disagreement landing in
/// [`BulkIngestionSummary::mismatches`]. A reported total below the number of items is raised
/// to that number. Pure: identical input gives identical output.
pub fn aggregate(items: Vec<FileOutcome>, reported: &ReportedCounts) -> BulkIngestionSummary {
    let (mut success_count, mut error_count, mut skipped_count, mut unknown_count) = (0, 0, 0, 0);
    for item in &items {
        match item.status {
            FileStatus::Success { .. } => success_count += 1,
            FileStatus::Error { .. } => error_count += 1,
            FileStatus::Skipped { .. } => skipped_count += 1,
            FileStatus::Unknown { .. } => unknown_count += 1,
        }
    }
    let processed_files = items.len();

    let mut mismatches = Vec::new();
    let total_files = match reported.total_files {
        Some(total) if total < processed_files => {
            mismatches.push(CountMismatch {
                field: CountField::TotalFiles,
                reported: total,
                derived: processed_files,
            });
            processed_files
        }
        Some(total) => total,
        None => processed_files,
    };

    let checks = [
        (CountField::ProcessedFiles, reported.processed_files, processed_files),
        (CountField::SuccessCount, reported.success_count, success_count),
        (CountField::ErrorCount, reported.error_count, error_count),
        (CountField::SkippedCount, reported.skipped_count, skipped_count),
    ];
    mismatches.extend(checks.into_iter().filter_map(|(field, claimed, derived)| {
        claimed
            .filter(|claimed| *claimed != derived)
            .map(|claimed| CountMismatch {
                field,
                reported: claimed,
                derived,
            })
    }));

    BulkIngestionSummary {
        total_files,
        processed_files,
        success_count,
        error_count,
        skipped_count,
        unknown_count,
        items,
        mismatches,
    }
}
