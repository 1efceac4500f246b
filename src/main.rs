mod config;
mod hook;
mod models;
mod output;
mod push;
mod server;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::Config;
use log::debug;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "prompt-capture")]
#[command(about = "Claude Code prompt capture - hook client and local Markdown log service")]
struct Cli {
    /// Config file (default: ~/.prompt-capture/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// UserPromptSubmit hook: read the event from stdin and forward the prompt
    Hook {
        /// Capture endpoint URL
        #[arg(long)]
        endpoint: Option<String>,
        /// Delivery timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Model label recorded with the prompt
        #[arg(long)]
        model: Option<String>,
    },
    /// Run the capture service
    Serve {
        /// Address to listen on
        #[arg(long)]
        bind: Option<String>,
        /// Log used when a request has no existing workspace directory
        #[arg(long)]
        fallback_log: Option<PathBuf>,
    },
    /// Check that the capture service is up
    Ping {
        /// Capture endpoint URL; /health is queried on the same host
        #[arg(long)]
        endpoint: Option<String>,
    },
    /// Write a default config file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn init_logging(default_filter: &str) {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(default_filter));
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Hook {
            endpoint,
            timeout_ms,
            model,
        } => {
            // Silent unless RUST_LOG asks otherwise
            init_logging("off");

            // Config problems must not break the host tool
            let mut config = Config::load(config_path)
                .unwrap_or_else(|e| {
                    debug!("Using default config: {:#}", e);
                    Config::default()
                })
                .hook;
            if let Some(endpoint) = endpoint {
                config.endpoint = endpoint;
            }
            if let Some(timeout_ms) = timeout_ms {
                config.timeout_ms = timeout_ms;
            }
            if let Some(model) = model {
                config.model = model;
            }

            hook::run_hook(std::io::stdin().lock(), &config)?;
        }
        Commands::Serve { bind, fallback_log } => {
            init_logging("info");

            let mut config = Config::load(config_path)?.server;
            if let Some(bind) = bind {
                config.bind_addr = bind;
            }
            if let Some(fallback_log) = fallback_log {
                config.fallback_log = fallback_log;
            }

            let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
            runtime.block_on(server::run_server(config))?;
        }
        Commands::Ping { endpoint } => {
            init_logging("warn");

            let config = Config::load(config_path)?.hook;
            let endpoint = endpoint.unwrap_or(config.endpoint);
            let health = push::check_health(&endpoint, Duration::from_millis(config.timeout_ms))?;

            println!("{}", health.status);
            if health.status != "healthy" {
                anyhow::bail!("Service reported status: {}", health.status);
            }
        }
        Commands::InitConfig { force } => {
            init_logging("info");

            let path = Config::default().save(config_path, force)?;
            eprintln!("Created config file at: {}", path.display());
        }
    }

    Ok(())
}
