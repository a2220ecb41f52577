//! fireworks-proxy: chat completion proxy for the Fireworks inference API
//!
//! Accepts chat requests from browser clients, fills in generation defaults,
//! injects the server-held API key, and relays the provider's answer either
//! as buffered JSON or as a live SSE stream.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

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
    Text,
    Json,
}

use fireworks_proxy::{
    api::ChatRequest,
    config::{AppConfig, API_KEY_ENV},
    proxy::{build_http_client, describe_failure, send_chat},
    run_server,
};

#[derive(Parser)]
#[command(name = "fireworks-proxy")]
#[command(version)]
#[command(about = "Chat completion proxy for the Fireworks inference API")]
#[command(long_about = "
fireworks-proxy accepts chat completion requests from browser clients and
forwards them to the Fireworks inference API:
  - Validates requests and fills in default generation parameters
  - Injects the server-side API key (FIREWORKS_API_KEY)
  - Returns buffered JSON or relays the SSE stream as it arrives

Example usage:
  FIREWORKS_API_KEY=fw-... fireworks-proxy run --port 8080
  fireworks-proxy check-config --config config.yaml
")]
struct Cli {
    /// Path to config file (defaults are used when none is found)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Set logging level (trace, debug, info, warn, error)
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<LogLevel>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the proxy server
    Run {
        /// Override listen port
        #[arg(short, long)]
        port: Option<u16>,
        /// Override the chat completions endpoint
        #[arg(long)]
        upstream_url: Option<String>,
    },

    /// Validate configuration and print the effective settings
    CheckConfig,

    /// Send one small request to the inference API
    TestUpstream,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.log_level, cli.log_format);

    match cli.command {
        Commands::Run { port, upstream_url } => {
            run_proxy(cli.config.as_deref(), port, upstream_url).await?;
        }
        Commands::CheckConfig => {
            check_config(cli.config.as_deref())?;
        }
        Commands::TestUpstream => {
            test_upstream(cli.config.as_deref()).await?;
        }
    }

    Ok(())
}

fn init_tracing(level: Option<LogLevel>, format: LogFormat) {
    let level_filter = if let Some(level) = level {
        level.to_string()
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
            .to_string()
    };

    let builder = tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::new(&level_filter));
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Load, apply the environment, and validate
fn load_config(config_path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let mut config = AppConfig::load_or_default(config_path).context("Error loading configuration")?;
    config.apply_env();
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Run the proxy server
async fn run_proxy(
    config_path: Option<&Path>,
    port_override: Option<u16>,
    upstream_url_override: Option<String>,
) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;

    if let Some(port) = port_override {
        config.server.port = port;
    }
    if let Some(url) = upstream_url_override {
        config.upstream.url = url;
        config.validate().context("Invalid --upstream-url")?;
    }

    match config_path {
        Some(path) => tracing::info!("Loaded configuration from {:?}", path),
        None => tracing::info!("Using default configuration search paths"),
    }

    run_server(config).await.map_err(|e| anyhow::anyhow!("{}", e))
}

/// Show the last four characters of a key
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}

fn check_config(config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("✗ Configuration error: {:#}", e);
            std::process::exit(1);
        }
    };

    println!("✓ Configuration is valid\n");
    println!("Server:");
    println!("  Listen: {}:{}", config.server.host, config.server.port);
    println!("\nUpstream:");
    println!("  URL: {}", config.upstream.url);
    println!("  Model: {}", config.upstream.model);
    println!("  User-Agent: {}", config.upstream.user_agent);
    println!("  TLS: {}", if config.upstream.is_tls() { "enabled" } else { "disabled" });
    if let Some(ref tls) = config.upstream.tls {
        if tls.accept_invalid_certs {
            println!("  TLS: Accepting invalid certificates");
        }
        if let Some(ref ca) = tls.ca_cert_path {
            println!("  TLS CA: {}", ca);
        }
    }
    match config.upstream.timeout_seconds {
        Some(secs) => println!("  Timeout: {}s", secs),
        None => println!("  Timeout: none"),
    }
    match config.upstream.api_key() {
        Some(key) => println!("  API key: {}", mask_key(key)),
        None => println!("  API key: not set ({})", API_KEY_ENV),
    }
    println!("\nDefaults:");
    let d = &config.defaults;
    println!("  temperature: {}", d.temperature);
    println!("  top_p: {}", d.top_p);
    println!("  top_k: {}", d.top_k);
    println!("  max_tokens: {}", d.max_tokens);
    println!("  presence_penalty: {}", d.presence_penalty);
    println!("  frequency_penalty: {}", d.frequency_penalty);
    println!("\nStats:");
    println!("  Enabled: {}", config.stats.enabled);
    println!("  Format: {:?}", config.stats.format);
    Ok(())
}

async fn test_upstream(config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let Some(api_key) = config.upstream.api_key() else {
        eprintln!("✗ {} is not set", API_KEY_ENV);
        std::process::exit(1);
    };

    println!("Testing inference API: {}", config.upstream.url);
    println!("  Model: {}", config.upstream.model);

    let client = build_http_client(&config.upstream)?;
    let body = serde_json::json!({
        "model": config.upstream.model,
        "messages": [{"role": "user", "content": "Reply with the single word: pong"}],
        "max_tokens": 8
    });
    let payload = ChatRequest::from_slice(body.to_string().as_bytes()).to_upstream(&config.defaults);

    let start = std::time::Instant::now();
    match send_chat(&client, &config.upstream, api_key, &payload, false).await {
        Ok(resp) => {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            if status.is_success() {
                println!("✓ Inference API is reachable ({} in {:?})", status, start.elapsed());
                if let Ok(json) = serde_json::from_str::<serde_json::Value>(&text) {
                    if let Some(content) = json.pointer("/choices/0/message/content").and_then(|c| c.as_str()) {
                        println!("  Reply: {}", content.trim());
                    }
                }
            } else {
                println!("✗ Inference API returned error status: {}", status);
                println!("  Response: {}", text.trim());
                std::process::exit(1);
            }
        }
        Err(e) => {
            println!(
                "✗ Failed to reach inference API: {}",
                describe_failure(&e.to_string(), e.is_timeout(), e.is_connect())
            );
            std::process::exit(1);
        }
    }

    Ok(())
}
