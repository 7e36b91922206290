//! HTTP client wrapper for the document-processing backend.

use crate::backend::types::{
    BackendError, BackendHealth, BulkUploadRequest, BulkUploadResponse, QueryRequest,
    QueryResponse, UploadResponse, extract_detail,
};
use crate::config::Config;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;

/// Lightweight HTTP client for the upload, bulk-upload, query, and health endpoints.
///
/// Timeouts are enforced here; a timed-out request surfaces as [`BackendError::Transport`].
pub struct BackendClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
}

impl BackendClient {
    /// Construct a client from configuration.
    pub fn new(config: &Config) -> Result<Self, BackendError> {
        let client = Client::builder()
            .user_agent(concat!("docrag/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .build()?;

        let base_url = normalize_base_url(&config.api_url).map_err(BackendError::InvalidUrl)?;
        tracing::debug!(
            url = %base_url,
            timeout_secs = config.request_timeout.as_secs(),
            "Initialized backend HTTP client"
        );

        Ok(Self { client, base_url })
    }

    /// Normalized base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one document as multipart field `file`.
    pub async fn upload(
        &self,
        file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadResponse, BackendError> {
        let size = bytes.len();
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime_type)?;
        let form = Form::new().part("file", part);

        tracing::debug!(file = file_name, bytes = size, "Uploading document");
        let response = self
            .request(Method::POST, "upload")
            .multipart(form)
            .send()
            .await?;

        self.parse_json(response, "upload").await
    }

    /// Ask the backend to ingest every supported file under `directory_path`.
    pub async fn bulk_upload(
        &self,
        directory_path: &str,
    ) -> Result<BulkUploadResponse, BackendError> {
        tracing::debug!(directory = directory_path, "Requesting bulk upload");
        let response = self
            .request(Method::POST, "bulk-upload")
            .json(&BulkUploadRequest { directory_path })
            .send()
            .await?;

        self.parse_json(response, "bulk-upload").await
    }

    /// Ask a question against the ingested corpus.
    pub async fn query(&self, request: &QueryRequest<'_>) -> Result<QueryResponse, BackendError> {
        tracing::debug!(
            top_k = request.top_k,
            doc_filter = request.doc_ids.as_ref().map(Vec::len),
            stream = request.stream,
            "Sending query"
        );
        let response = self
            .request(Method::POST, "query")
            .json(request)
            .send()
            .await?;

        self.parse_json(response, "query").await
    }

    /// Probe backend liveness and configuration.
    pub async fn health(&self) -> Result<BackendHealth, BackendError> {
        let response = self.request(Method::GET, "health").send().await?;
        self.parse_json(response, "health").await
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format_endpoint(&self.base_url, path);
        self.client.request(method, url)
    }

    async fn parse_json<T>(
        &self,
        response: reqwest::Response,
        endpoint: &str,
    ) -> Result<T, BackendError>
    where
        T: DeserializeOwned,
    {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let error = BackendError::Status {
                status,
                detail: extract_detail(&body),
            };
            tracing::error!(endpoint, error = %error, "Backend request failed");
            return Err(error);
        }

        serde_json::from_str(&body).map_err(|err| {
            let error = BackendError::Malformed(format!("{endpoint}: {err}"));
            tracing::error!(endpoint, error = %error, "Backend returned an unexpected body");
            error
        })
    }
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{
        Method::{GET, POST},
        MockServer,
    };
    use reqwest::StatusCode;
    use serde_json::json;

    fn client_for(server: &MockServer) -> BackendClient {
        BackendClient::new(&Config::with_api_url(server.base_url())).expect("client")
    }

    #[test]
    fn normalizes_trailing_slashes() {
        assert_eq!(
            normalize_base_url("http://localhost:8000/").unwrap(),
            "http://localhost:8000/"
        );
        assert_eq!(
            normalize_base_url("http://host/api/").unwrap(),
            "http://host/api"
        );
        assert!(normalize_base_url("not a url").is_err());
        assert_eq!(
            format_endpoint("http://host/api", "/query"),
            "http://host/api/query"
        );
    }

    #[test]
    fn rejects_invalid_base_url() {
        let result = BackendClient::new(&Config::with_api_url("::nope::"));
        assert!(matches!(result, Err(BackendError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn query_emits_expected_request() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/query")
                    .json_body(json!({ "query": "Explain RL", "docIds": ["d1"], "topK": 3 }));
                then.status(200).json_body(json!({
                    "answer": "An agent learns from rewards.",
                    "sources": [
                        { "docId": "d1", "page": 4, "score": 0.91, "snippet": "reward signal" }
                    ],
                    "usage": { "retrieved": 3 }
                }));
            })
            .await;

        let response = client_for(&server)
            .query(&QueryRequest {
                query: "Explain RL",
                doc_ids: Some(vec!["d1"]),
                top_k: Some(3),
                stream: None,
            })
            .await
            .expect("query");

        mock.assert_async().await;
        assert_eq!(response.answer, "An agent learns from rewards.");
        assert_eq!(response.sources.len(), 1);
        assert_eq!(response.sources[0].page, 4);
        assert_eq!(response.usage.retrieved, 3);
    }

    #[tokio::test]
    async fn upload_sends_multipart_file_field() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/upload")
                    .header_exists("content-type")
                    .body_contains("name=\"file\"")
                    .body_contains("filename=\"paper.pdf\"")
                    .body_contains("%PDF-1.7");
                then.status(200).json_body(json!({
                    "docId": "abc",
                    "fileName": "paper.pdf",
                    "pages": 2,
                    "chunks": 5,
                    "status": "ready"
                }));
            })
            .await;

        let response = client_for(&server)
            .upload("paper.pdf", "application/pdf", b"%PDF-1.7 body".to_vec())
            .await
            .expect("upload");

        mock.assert_async().await;
        assert_eq!(response.doc_id, "abc");
        assert_eq!(response.chunks, 5);
    }

    #[tokio::test]
    async fn error_status_carries_detail() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/bulk-upload");
                then.status(400)
                    .json_body(json!({ "detail": "Directory does not exist: /missing" }));
            })
            .await;

        let error = client_for(&server)
            .bulk_upload("/missing")
            .await
            .expect_err("should fail");

        match error {
            BackendError::Status { status, detail } => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(
                    detail.as_deref(),
                    Some("Directory does not exist: /missing")
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn success_with_wrong_shape_is_malformed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/health");
                then.status(200).body("<html>proxy login</html>");
            })
            .await;

        let error = client_for(&server).health().await.expect_err("malformed");
        assert!(matches!(error, BackendError::Malformed(_)));
    }

    #[tokio::test]
    async fn health_parses_backend_snapshot() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/health");
                then.status(200).json_body(json!({
                    "status": "ok",
                    "models": { "embedding": "all-MiniLM-L6-v2", "llm": "llama3.2" },
                    "storage": { "documents_dir": "/srv/docs" }
                }));
            })
            .await;

        let health = client_for(&server).health().await.expect("health");
        assert!(health.is_ok());
        assert_eq!(health.models.llm.as_deref(), Some("llama3.2"));
        assert_eq!(health.storage["documents_dir"], "/srv/docs");
    }
}
