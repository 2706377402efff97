//! Run document processing for one storage event.
//!
//! Reads an "Object Created" event envelope from `--event <path>` (or stdin), processes the
//! referenced object, and prints the JSON result. Exits non-zero when processing fails.
use std::{
    fs,
    io::{self, Read},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::Parser;
use docflow::{config::Config, events::ObjectCreatedEvent, logging, service::DocumentService};
use serde_json::json;

#[derive(Parser)]
#[command(
    name = "docflow-process",
    about = "Extract and analyze a stored document from a storage event"
)]
struct Cli {
    /// Path to the event JSON; reads stdin when omitted.
    #[arg(long)]
    event: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        let body = json!({
            "message": "Error processing document",
            "error": format!("{err:#}"),
        });
        println!("{body}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    let config = Config::from_env().context("failed to load configuration")?;
    logging::init_tracing();

    let raw = match &cli.event {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read event at {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read event from stdin")?;
            buffer
        }
    };
    let event: ObjectCreatedEvent =
        serde_json::from_str(&raw).context("failed to parse storage event")?;

    let service = DocumentService::from_config(&config)
        .await
        .context("failed to initialize document service")?;
    let outcome = service.process(event).await?;

    let body = json!({
        "message": "Document processed successfully",
        "documentId": outcome.document_id,
        "analysis": outcome.analysis,
    });
    println!("{body}");
    Ok(())
}
