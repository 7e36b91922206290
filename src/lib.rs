#![deny(missing_docs)]

//! Client library for a document question-answering service.
//!
//! Covers single-document upload, directory-wide bulk ingestion, and cited queries, each
//! driven through a single-flight [`mutation::MutationController`].

/// HTTP boundary to the document-processing backend.
pub mod backend;
/// Environment-driven configuration management.
pub mod config;
/// Text rendering of results for the command line.
pub mod format;
/// Structured logging and tracing setup.
pub mod logging;
/// Single-flight request lifecycle controller.
pub mod mutation;
/// Upload, bulk ingestion, and query clients plus their result types.
pub mod workflows;
