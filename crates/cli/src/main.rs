//! kbrag CLI
//!
//! Main entry point for the kbrag command-line tool.
//! Asks questions against a managed knowledge base and prints the generated
//! answer with its cited sources.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ChatCommand, ConfigCommand};
use kbrag_core::{
    config::{AppConfig, ConfigOverrides, LogFormat},
    logging, AppResult,
};
use std::path::PathBuf;

/// kbrag - question answering over a managed knowledge base
#[derive(Parser, Debug)]
#[command(name = "kbrag")]
#[command(about = "Question answering over a managed knowledge base", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "KBRAG_CONFIG")]
    config: Option<PathBuf>,

    /// Service region (e.g., us-east-1)
    #[arg(short, long, global = true)]
    region: Option<String>,

    /// Knowledge base identifier
    #[arg(short = 'k', long, global = true)]
    knowledge_base_id: Option<String>,

    /// Foundation model id or full model ARN
    #[arg(short, long, global = true)]
    model_id: Option<String>,

    /// Endpoint override (e.g., a local proxy)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log format (text, json)
    #[arg(long, global = true, value_parser = parse_log_format)]
    log_format: Option<LogFormat>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a single question
    Ask(AskCommand),

    /// Interactive conversation that keeps server-side session context
    Chat(ChatCommand),

    /// Show the resolved configuration
    Config(ConfigCommand),
}

fn parse_log_format(s: &str) -> Result<LogFormat, String> {
    LogFormat::parse(s).ok_or_else(|| format!("unknown log format '{}' (expected text or json)", s))
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Config file, then environment, then CLI flags
    let config = AppConfig::load_from(cli.config)?.with_overrides(ConfigOverrides {
        region: cli.region,
        knowledge_base_id: cli.knowledge_base_id,
        model_id: cli.model_id,
        endpoint: cli.endpoint,
        log_level: cli.log_level,
        log_format: cli.log_format,
        verbose: cli.verbose,
        no_color: cli.no_color,
    });

    logging::init_logging(config.log_level.as_deref(), config.log_format, config.no_color)?;

    tracing::info!("kbrag starting");
    tracing::debug!("Config file: {:?}", config.config_file);
    tracing::debug!("Region: {:?}", config.region);
    tracing::debug!("Knowledge base: {:?}", config.knowledge_base_id);
    tracing::debug!("Model: {:?}", config.model_id);

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Chat(_) => "chat",
        Commands::Config(_) => "config",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
        Commands::Config(cmd) => cmd.execute(&config),
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
