//! Workflow clients (upload, bulk ingestion, query) and the view-models they produce.
//!
//! Each client validates input locally, then drives its own
//! [`crate::mutation::MutationController`], so an upload and a query never share state.

mod aggregate;
mod bulk;
mod mappers;
mod query;
pub mod types;
mod upload;

pub use aggregate::aggregate;
pub use bulk::BulkIngestClient;
pub use query::QueryClient;
pub use types::{
    BulkIngestionSummary, ClientError, CountField, CountMismatch, DocumentFile, DocumentKind,
    ErrorKind, FileOutcome, FileStatus, QueryOptions, QueryResult, ReportedCounts,
    SourceCitation, UploadOutcome,
};
pub use upload::UploadClient;
