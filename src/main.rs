use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use docrag::{
    backend::BackendClient,
    config, format, logging,
    workflows::{BulkIngestClient, QueryClient, QueryOptions, UploadClient},
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "docrag",
    version,
    about = "Upload documents, ingest directories, and ask cited questions"
)]
struct Cli {
    /// Print results as JSON instead of text.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload a single PDF or Markdown document.
    Upload {
        /// Path of the document to upload.
        file: PathBuf,
    },
    /// Ingest every PDF and Markdown file under a directory on the backend host.
    Bulk {
        /// Directory path as seen by the backend.
        directory: String,
    },
    /// Ask a question against the ingested documents.
    Ask {
        /// Natural-language question.
        question: String,
        /// Maximum number of citations to request.
        #[arg(long, default_value_t = 5)]
        top_k: u32,
        /// Restrict retrieval to this document id (repeatable).
        #[arg(long = "doc-id")]
        doc_ids: Vec<String>,
        /// Request incremental delivery from the backend.
        #[arg(long)]
        stream: bool,
    },
    /// Check that the backend is reachable and healthy.
    Health,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = config::init_config().context("failed to load configuration")?;
    logging::init_tracing(config.log_file.as_deref());
    tracing::debug!(
        api_url = %config.api_url,
        timeout_secs = config.request_timeout.as_secs(),
        log_file = ?config.log_file,
        "Loaded configuration"
    );

    let backend =
        Arc::new(BackendClient::new(config).context("failed to initialize backend client")?);
    tracing::debug!(url = backend.base_url(), "Using backend");

    let output = match cli.command {
        Command::Upload { file } => {
            let outcome = UploadClient::new(backend).upload_path(&file).await?;
            render(cli.json, &outcome, format::upload_report)
        }
        Command::Bulk { directory } => {
            let summary = BulkIngestClient::new(backend).ingest(&directory).await?;
            render(cli.json, &summary, format::bulk_report)
        }
        Command::Ask {
            question,
            top_k,
            doc_ids,
            stream,
        } => {
            let options = QueryOptions {
                doc_ids: (!doc_ids.is_empty()).then(|| doc_ids.into_iter().collect()),
                top_k: Some(top_k),
                stream: stream.then_some(true),
            };
            let result = QueryClient::new(backend).ask(&question, options).await?;
            render(cli.json, &result, format::query_report)
        }
        Command::Health => {
            let health = backend
                .health()
                .await
                .context("backend health check failed")?;
            let text = render(cli.json, &health, format::health_report);
            if !health.is_ok() {
                println!("{text}");
                bail!("backend reported status '{}'", health.status);
            }
            text
        }
    };

    println!("{output}");
    Ok(())
}

fn render<T: serde::Serialize>(json: bool, value: &T, text: fn(&T) -> String) -> String {
    if json {
        format::to_json(value)
    } else {
        text(value)
    }
}
