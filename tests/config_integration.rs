use mcp_text_client::config::AppConfig;
use mcp_text_client::llm::Provider;
use serial_test::serial;
use std::env;
use std::fs;
use std::path::PathBuf;

const BIN: &str = "mcp-text-client";

// Helper to clear environment variables that might interfere with tests
fn clear_env_vars() {
    unsafe {
        env::remove_var("MCPC_CONFIG_FILE");
        env::remove_var("MCPC_LLM__MODEL");
        env::remove_var("MCPC_LLM__MAX_STEPS");
        env::remove_var("MCPC_SERVER__COMMAND");
        env::remove_var("MCPC_SERVER__ARGS");
        env::remove_var("GEMINI_API_KEY");
        env::remove_var("LLM_API_KEY");
    }
}

#[test]
#[serial]
fn test_default_config() {
    clear_env_vars();

    let config = AppConfig::load_from_args([BIN]).expect("defaults should load");

    assert_eq!(config.server.command, "node");
    assert_eq!(config.server.args, vec!["build/server.js"]);
    assert!(config.server.env.is_empty());
    assert_eq!(config.client.name, "text-client");
    assert_eq!(config.client.version, "1.0.0");
    assert_eq!(
        config.llm.base_url,
        "https://generativelanguage.googleapis.com/v1beta/openai"
    );
    assert_eq!(config.llm.model, "gemini-2.0-flash");
    assert_eq!(config.llm.max_steps, 1);
    assert_eq!(
        config.storage.latest_output,
        PathBuf::from("src/data/ai-latest-output.txt")
    );
    assert_eq!(config.storage.user_records, PathBuf::from("src/data/users.json"));
    assert!(!config.logging.json);
}

#[test]
#[serial]
fn test_env_override() {
    clear_env_vars();
    unsafe {
        env::set_var("MCPC_LLM__MODEL", "gemini-2.5-pro");
        env::set_var("MCPC_LLM__MAX_STEPS", "3");
        env::set_var("MCPC_SERVER__ARGS", "dist/index.js --stdio");
    }

    let config = AppConfig::load_from_args([BIN]).expect("Failed to load config");
    assert_eq!(config.llm.model, "gemini-2.5-pro");
    assert_eq!(config.llm.max_steps, 3);
    assert_eq!(config.server.args, vec!["dist/index.js", "--stdio"]);

    clear_env_vars();
}

#[test]
#[serial]
fn test_cli_overrides_env() {
    clear_env_vars();
    unsafe {
        env::set_var("MCPC_LLM__MODEL", "from-env");
    }

    let config = AppConfig::load_from_args([
        BIN,
        "--model",
        "from-cli",
        "--server-command",
        "python",
        "--server-arg",
        "-m",
        "--server-arg",
        "users_server",
        "--json-logs",
    ])
    .expect("Failed to load config");

    assert_eq!(config.llm.model, "from-cli");
    assert_eq!(config.server.command, "python");
    assert_eq!(config.server.args, vec!["-m", "users_server"]);
    assert!(config.logging.json);

    clear_env_vars();
}

#[test]
#[serial]
fn test_file_load() {
    clear_env_vars();

    let config_content = r#"
server:
  command: npx
  args: ["-y", "users-mcp"]
  env:
    DATA_DIR: "/tmp/users"
llm:
  model: gemini-1.5-flash
storage:
  user_records: out/users.json
    "#;

    let dir = tempfile::tempdir().expect("tempdir");
    let file_path = dir.path().join("client.yaml");
    fs::write(&file_path, config_content).expect("Failed to write temp config");

    // Point the loader at the file through the environment, as clap's `env` does
    unsafe {
        env::set_var("MCPC_CONFIG_FILE", &file_path);
    }

    let config = AppConfig::load_from_args([BIN]).expect("Failed to load config from file");
    assert_eq!(config.server.command, "npx");
    assert_eq!(config.server.args, vec!["-y", "users-mcp"]);
    assert_eq!(
        config.server.env.get("DATA_DIR").map(String::as_str),
        Some("/tmp/users")
    );
    assert_eq!(config.llm.model, "gemini-1.5-flash");
    assert_eq!(config.storage.user_records, PathBuf::from("out/users.json"));
    // Untouched keys keep their defaults
    assert_eq!(
        config.storage.latest_output,
        PathBuf::from("src/data/ai-latest-output.txt")
    );

    clear_env_vars();
}

#[test]
#[serial]
fn test_missing_config_file_is_an_error() {
    clear_env_vars();

    let result = AppConfig::load_from_args([BIN, "--config", "does/not/exist.yaml"]);
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_llm_settings_resolution() {
    clear_env_vars();
    unsafe {
        env::set_var("LLM_API_KEY", "fallback-key");
    }

    let config = AppConfig::load_from_args([BIN]).expect("defaults should load");
    let settings = config.llm_settings().expect("valid settings");
    assert_eq!(settings.provider, Provider::Gemini);
    assert_eq!(settings.api_key.as_deref(), Some("fallback-key"));
    assert_eq!(settings.max_steps, 1);

    unsafe {
        env::set_var("GEMINI_API_KEY", "gemini-key");
    }
    let settings = config.llm_settings().expect("valid settings");
    assert_eq!(settings.api_key.as_deref(), Some("gemini-key"));

    clear_env_vars();
}

#[test]
#[serial]
fn test_invalid_base_url_is_rejected() {
    clear_env_vars();

    let config = AppConfig::load_from_args([BIN, "--base-url", "not a url"])
        .expect("config itself loads");
    assert!(config.llm_settings().is_err());
}
