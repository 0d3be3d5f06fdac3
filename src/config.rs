use crate::llm::provider::GEMINI_BASE_URL;
use crate::llm::{LlmSettings, Provider};
use crate::mcp::config::ServerConfig;
use anyhow::Context;
use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

/// Environment prefix for layered settings, e.g. `MCPC_LLM__MODEL`.
const ENV_PREFIX: &str = "MCPC";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path (YAML, TOML or JSON)
    #[arg(short, long, env = "MCPC_CONFIG_FILE")]
    pub config: Option<String>,

    /// Command that starts the MCP server
    #[arg(long)]
    pub server_command: Option<String>,

    /// Argument passed to the server command (repeatable)
    #[arg(long = "server-arg", allow_hyphen_values = true)]
    pub server_args: Vec<String>,

    /// LLM model identifier
    #[arg(long)]
    pub model: Option<String>,

    /// Base URL of the OpenAI-compatible LLM endpoint
    #[arg(long)]
    pub base_url: Option<String>,

    /// Model rounds per query
    #[arg(long)]
    pub max_steps: Option<usize>,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub client: ClientIdentity,
    pub llm: LlmConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Name and version announced to the server during initialization.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub max_steps: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub latest_output: PathBuf,
    pub user_records: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub json: bool,
}

impl AppConfig {
    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Self::from_cli(&cli)
    }

    pub fn from_cli(cli: &Cli) -> Result<Self, config::ConfigError> {
        let mut builder = Config::builder();

        // 1. Defaults
        builder = builder
            .set_default("server.command", "node")?
            .set_default("server.args", vec!["build/server.js"])?
            .set_default("client.name", "text-client")?
            .set_default("client.version", "1.0.0")?
            .set_default("llm.base_url", GEMINI_BASE_URL)?
            .set_default("llm.model", "gemini-2.0-flash")?
            .set_default("llm.max_steps", 1)?
            .set_default("storage.latest_output", "src/data/ai-latest-output.txt")?
            .set_default("storage.user_records", "src/data/users.json")?
            .set_default("logging.json", false)?;

        // 2. Config files: ./mcpc.{yaml,toml,json} if present, then --config
        builder = builder.add_source(File::with_name("mcpc").required(false));
        if let Some(path) = &cli.config {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // 3. Environment, e.g. MCPC_LLM__MODEL=gemini-2.5-pro
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .list_separator(" ")
                .with_list_parse_key("server.args")
                .try_parsing(true),
        );

        // 4. CLI overrides
        if let Some(command) = &cli.server_command {
            builder = builder.set_override("server.command", command.as_str())?;
        }
        if !cli.server_args.is_empty() {
            builder = builder.set_override("server.args", cli.server_args.clone())?;
        }
        if let Some(model) = &cli.model {
            builder = builder.set_override("llm.model", model.as_str())?;
        }
        if let Some(base_url) = &cli.base_url {
            builder = builder.set_override("llm.base_url", base_url.as_str())?;
        }
        if let Some(max_steps) = cli.max_steps {
            builder = builder.set_override("llm.max_steps", max_steps as u64)?;
        }
        if cli.json_logs {
            builder = builder.set_override("logging.json", true)?;
        }

        let cfg = builder.build()?;
        cfg.try_deserialize()
    }

    /// Resolve the LLM connection settings, reading the credential from the
    /// environment.
    pub fn llm_settings(&self) -> anyhow::Result<LlmSettings> {
        let base_url = self.llm.base_url.trim().to_string();
        url::Url::parse(&base_url).with_context(|| format!("invalid llm.base_url: {base_url}"))?;

        let model = self.llm.model.trim().to_string();
        anyhow::ensure!(!model.is_empty(), "llm.model cannot be empty");

        let api_key = api_key_from_env();
        if api_key.is_none() {
            tracing::warn!(
                name: "llm.credentials.missing",
                "Neither GEMINI_API_KEY nor LLM_API_KEY is set; LLM requests will be unauthenticated"
            );
        }

        // Auto-detect provider from base URL
        let mut provider = Provider::detect_from_url(&base_url);
        if let Provider::AzureOpenAI { .. } = &provider
            && let Ok(deployment_name) = std::env::var("AZURE_DEPLOYMENT_NAME")
        {
            provider = Provider::AzureOpenAI {
                deployment_name,
                api_version: std::env::var("AZURE_API_VERSION")
                    .unwrap_or_else(|_| "2024-08-01-preview".to_string()),
            };
        }

        Ok(LlmSettings {
            base_url,
            api_key,
            model,
            provider,
            max_steps: self.llm.max_steps.max(1),
        })
    }
}

/// `GEMINI_API_KEY`, falling back to `LLM_API_KEY`; blank values count as unset.
fn api_key_from_env() -> Option<String> {
    ["GEMINI_API_KEY", "LLM_API_KEY"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .find(|value| !value.trim().is_empty())
}
