//! HTTP boundary to the document-processing backend.

pub mod client;
pub mod types;

pub use client::BackendClient;
pub use types::{
    BackendError, BackendHealth, BulkUploadRequest, BulkUploadResponse, BulkUploadResult,
    HealthModels, QueryRequest, QueryResponse, QueryUsage, SourceChunk, UploadResponse,
};
