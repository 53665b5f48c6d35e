//! chat-relay: HTTP relay in front of a text-generation backend
//!
//! Accepts a chat message plus conversation history in whatever shape the
//! frontend sends, forwards it to the configured backend, and returns the
//! reply merged into a canonical history.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use chat_relay::{
    config::{AppConfig, ConfigError, ENV_BACKEND_URL},
    history::normalize,
    relay::{GenerationRequest, Relay},
    run_server,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Parser)]
#[command(name = "chat-relay")]
#[command(version = "0.1.0")]
#[command(about = "HTTP relay in front of a text-generation backend")]
#[command(long_about = "
chat-relay accepts {message, conversationHistory} requests, forwards them to a
text-generation backend, and returns the reply merged into the history.

The backend URL is read from config.yaml (backend.url) or RELAY_BACKEND__URL.
Any field can be overridden as RELAY_<SECTION>__<FIELD>, e.g. RELAY_GENERATION__TOP_P.

Example usage:
  RELAY_BACKEND__URL=http://localhost:8000 chat-relay run
  chat-relay render-prompt --message hi --history '[{\"role\":\"user\",\"content\":\"yo\"}]'
")]
struct Cli {
    /// Path to config file (optional when configured through RELAY_* variables)
    #[arg(short, long, global = true, default_value = "config.yaml")]
    config: PathBuf,

    /// Set logging level (trace, debug, info, warn, error)
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<LogLevel>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the relay server
    Run {
        /// Override listen port
        #[arg(short, long)]
        port: Option<u16>,
        /// Override backend URL (e.g., "http://localhost:8000")
        #[arg(long)]
        backend_url: Option<String>,
    },

    /// Validate configuration
    CheckConfig,

    /// Send a probe message through the relay to the backend
    TestBackend {
        /// Message to send
        #[arg(short, long, default_value = "ping")]
        message: String,
    },

    /// Print the flattened prompt for a message and history
    RenderPrompt {
        /// New user message
        #[arg(short, long)]
        message: String,
        /// Conversation history, as JSON or plain text
        #[arg(long)]
        history: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level_filter = if let Some(level) = cli.log_level {
        level.to_string()
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
            .to_string()
    };

    let subscriber = tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::new(&level_filter));
    match cli.log_format {
        LogFormat::Pretty => subscriber.init(),
        LogFormat::Json => subscriber.json().init(),
    }

    match cli.command {
        Commands::Run { port, backend_url } => {
            run_relay(&cli.config, port, backend_url).await?;
        }
        Commands::CheckConfig => {
            check_config(&cli.config);
        }
        Commands::TestBackend { message } => {
            test_backend(&cli.config, &message).await?;
        }
        Commands::RenderPrompt { message, history } => {
            render_prompt(&message, history);
        }
    }

    Ok(())
}

/// Run the relay server
async fn run_relay(
    config_path: &Path,
    port_override: Option<u16>,
    backend_url_override: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = resolve_or_exit(config_path);

    // Apply CLI overrides
    if let Some(port) = port_override {
        config.server.port = port;
    }
    if let Some(url) = backend_url_override {
        config.backend.url = Some(url);
    }

    validate_or_exit(&config);

    tracing::info!(
        contract = config.backend.contract.as_str(),
        timeout_seconds = config.backend.timeout_seconds,
        api_key = config.backend.api_key.is_some(),
        "Configuration loaded"
    );

    run_server(config).await
}

/// Validate configuration and print a summary
fn check_config(config_path: &Path) {
    let config = resolve_or_exit(config_path);

    match config.validate() {
        Ok(()) => {
            println!("✓ Configuration is valid\n");
            println!("Server:");
            println!("  Listen: {}:{}", config.server.host, config.server.port);
            println!("\nBackend:");
            println!("  Endpoint: {}", config.backend.endpoint().unwrap_or_default());
            println!("  Contract: {}", config.backend.contract.as_str());
            println!("  TLS: {}", if config.backend.is_tls() { "enabled" } else { "disabled" });
            if let Some(ref tls) = config.backend.tls {
                if tls.accept_invalid_certs {
                    println!("  TLS: Accepting invalid certificates");
                }
                if let Some(ref ca) = tls.ca_cert_path {
                    println!("  TLS CA: {}", ca);
                }
            }
            println!("  Timeout: {}s", config.backend.timeout_seconds);
            println!("  API key: {}", if config.backend.api_key.is_some() { "set" } else { "not set" });
            println!("\nGeneration defaults:");
            println!("  temperature: {}", config.generation.temperature);
            println!("  top_p: {}", config.generation.top_p);
            println!("  max_new_tokens: {}", config.generation.max_new_tokens);
            println!("  do_sample: {}", config.generation.do_sample);
        }
        Err(e) => {
            eprintln!("✗ Configuration error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Relay one probe message to the backend and report the outcome
async fn test_backend(config_path: &Path, message: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_or_exit(config_path);
    validate_or_exit(&config);

    let relay = Relay::new(&config.backend)?;
    println!("Testing backend: {}", relay.endpoint());

    let normalized = normalize(Some(message), &serde_json::Value::Null);
    let request = GenerationRequest::build(config.backend.contract, &normalized, config.generation);

    match relay.relay(&request, normalized.history()).await {
        Ok(result) => {
            println!("✓ Backend replied");
            println!("  Response: {}", result.text.trim());
        }
        Err(e) => {
            println!("✗ {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Print the prompt a prompt-contract backend would receive
fn render_prompt(message: &str, history: Option<String>) {
    // Stringified history goes through the same decoding as a request body
    let raw_history = history.map(serde_json::Value::String).unwrap_or(serde_json::Value::Null);
    let normalized = normalize(Some(message), &raw_history);
    println!("{}", normalized.prompt());
}

/// Resolve configuration or exit with error
fn resolve_or_exit(config_path: &Path) -> AppConfig {
    match AppConfig::resolve(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            std::process::exit(1);
        }
    }
}

/// Refuse to continue without a usable backend
fn validate_or_exit(config: &AppConfig) {
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        if matches!(e, ConfigError::MissingBackendUrl) {
            eprintln!("\nSet {}, pass --backend-url, or copy config.yaml.default:", ENV_BACKEND_URL);
            eprintln!("  cp config.yaml.default config.yaml");
        }
        std::process::exit(1);
    }
}
