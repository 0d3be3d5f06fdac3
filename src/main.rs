//! Interactive MCP text client.
//!
//! Entry point: load configuration, connect to the MCP server, and run the
//! menu loop until the session fails.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use tracing::info;

use mcp_text_client::config::{AppConfig, Cli};
use mcp_text_client::llm::{LanguageModel, Orchestrator};
use mcp_text_client::mcp::catalog::Catalog;
use mcp_text_client::mcp::client::McpClient;
use mcp_text_client::mcp::sampling::SamplingHandler;
use mcp_text_client::mcp::service::CapabilityService;
use mcp_text_client::operator::{Operator, TerminalOperator};
use mcp_text_client::records::RecordStore;
use mcp_text_client::relay::PromptRelay;
use mcp_text_client::session::Session;
use mcp_text_client::{dispatch, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present)
    let _ = dotenv();

    let cli = Cli::parse();
    let config = match AppConfig::from_cli(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    // Initialize tracing (M-LOG-STRUCTURED)
    telemetry::init(config.logging.json);

    let settings = config.llm_settings()?;
    info!(
        name: "llm.config.loaded",
        base_url = %settings.base_url,
        model = %settings.model,
        provider = ?settings.provider,
        "LLM configuration loaded"
    );

    let operator: Arc<dyn Operator> = Arc::new(TerminalOperator::new());
    let model: Arc<dyn LanguageModel> = Arc::new(Orchestrator::new(settings));
    let relay = Arc::new(PromptRelay::new(Arc::clone(&operator), Arc::clone(&model)));

    let handler = SamplingHandler::new(Arc::clone(&relay), config.client.clone());
    let client = McpClient::connect(&config.server, handler).await?;
    let service: Arc<dyn CapabilityService> = Arc::new(client);

    let catalog = Catalog::fetch(service.as_ref())
        .await
        .context("failed to list server capabilities")?;
    let store = RecordStore::from_config(&config.storage);

    let session = Session::new(catalog, service, model, Arc::clone(&operator), relay, store);
    operator.show("You are connected!");

    dispatch::run(&session).await?;
    Ok(())
}
