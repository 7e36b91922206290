//! Question answering workflow.

use crate::backend::{BackendClient, QueryRequest};
use crate::mutation::{Mutation, MutationController, MutationState};
use crate::workflows::mappers;
use crate::workflows::types::{ClientError, QueryOptions, QueryResult};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

const QUERY_FAILED: &str = "Query failed";

struct QueryOperation {
    backend: Arc<BackendClient>,
}

#[async_trait]
impl Mutation<(String, QueryOptions), QueryResult> for QueryOperation {
    async fn execute(&self, input: (String, QueryOptions)) -> Result<QueryResult, ClientError> {
        let (question, options) = input;
        let request = QueryRequest {
            query: &question,
            doc_ids: options
                .doc_ids
                .as_ref()
                .map(|ids| ids.iter().map(String::as_str).collect()),
            top_k: options.top_k,
            stream: options.stream,
        };
        let response = self
            .backend
            .query(&request)
            .await
            .map_err(|err| ClientError::from_backend(err, QUERY_FAILED))?;
        let result = mappers::query_result(response)?;
        tracing::info!(
            sources = result.sources.len(),
            retrieved = result.retrieved_count,
            "Query answered"
        );
        Ok(result)
    }
}

/// Sends questions to the backend and exposes the answer with its citations.
pub struct QueryClient {
    controller: MutationController<(String, QueryOptions), QueryResult>,
}

impl QueryClient {
    /// Build a query client sending to `backend`.
    pub fn new(backend: Arc<BackendClient>) -> Self {
        Self {
            controller: MutationController::new("query", Arc::new(QueryOperation { backend })),
        }
    }

    /// Trim `question`, rejecting blank input.
    pub fn validate(question: &str) -> Result<String, ClientError> {
        let trimmed = question.trim();
        if trimmed.is_empty() {
            return Err(ClientError::InvalidInput("Question must not be empty".into()));
        }
        Ok(trimmed.to_string())
    }

    /// Validate and ask in the background; see [`MutationController::submit`].
    pub fn submit(
        &self,
        question: &str,
        options: QueryOptions,
    ) -> Result<JoinHandle<()>, ClientError> {
        let question = Self::validate(question)?;
        self.controller.submit((question, options))
    }

    /// Validate and ask, waiting for the answer.
    ///
    /// `sources` is returned exactly as the backend ranked it, regardless of `top_k`.
    pub async fn ask(
        &self,
        question: &str,
        options: QueryOptions,
    ) -> Result<QueryResult, ClientError> {
        let question = Self::validate(question)?;
        self.controller.run((question, options)).await
    }

    /// Latest query state.
    pub fn state(&self) -> MutationState<QueryResult> {
        self.controller.current_state()
    }

    /// Receiver notified on every query state transition.
    pub fn subscribe(&self) -> watch::Receiver<MutationState<QueryResult>> {
        self.controller.subscribe()
    }
}
