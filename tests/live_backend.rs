use std::sync::Arc;

use docrag::{
    backend::BackendClient,
    config::Config,
    workflows::{QueryClient, QueryOptions},
};

fn live_backend() -> Arc<BackendClient> {
    let config = Config::from_env().expect("configuration from environment");
    Arc::new(BackendClient::new(&config).expect("backend client"))
}

#[tokio::test]
#[ignore = "Requires a running backend at DOCRAG_API_URL"]
async fn live_backend_reports_healthy() {
    let health = live_backend().health().await.expect("health request");
    assert!(health.is_ok(), "backend should be healthy: {health:?}");
}

#[tokio::test]
#[ignore = "Requires a running backend with ingested documents"]
async fn live_query_returns_consistent_citations() {
    let result = QueryClient::new(live_backend())
        .ask(
            "Explain reinforcement learning",
            QueryOptions {
                top_k: Some(5),
                ..QueryOptions::default()
            },
        )
        .await
        .expect("query");
    assert!(!result.answer.trim().is_empty(), "answer should not be empty");
    if result.retrieved_count == 0 {
        assert!(result.sources.is_empty());
    }
}
