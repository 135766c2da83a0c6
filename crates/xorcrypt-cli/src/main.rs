//! xorcrypt: parallel repeating-key XOR file transform
//!
//! Commands:
//!   encrypt -p <input> -o <output> -k <key> [-j <workers>]
//!   decrypt -p <input> -o <output> -k <key> [-j <workers>]
//!   config show        - display current configuration
//!
//! Encryption and decryption run the same transform. A failed transform
//! prints the error chain to stderr and exits with status 1.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::info;

use xorcrypt_core::config::{load_config, XorcryptConfig, DEFAULT_CONFIG_PATH};
use xorcrypt_core::{TransformRequest, WorkerCount};
use xorcrypt_engine::{EngineOptions, Transformer};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "xorcrypt",
    version,
    about = "Parallel repeating-key XOR file transform",
    long_about = "xorcrypt: encrypt or decrypt a file against a key file using parallel workers"
)]
struct Cli {
    /// Path to config.toml
    #[arg(long, short = 'c', env = "XORCRYPT_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides config
    #[arg(long, env = "XORCRYPT_LOG")]
    log: Option<String>,

    /// Log format; overrides config
    #[arg(long, env = "XORCRYPT_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encrypt a file with a key file
    Encrypt(TransformArgs),

    /// Decrypt a file with the key file it was encrypted with
    Decrypt(TransformArgs),

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Args, Debug)]
struct TransformArgs {
    /// Input file path
    #[arg(long = "input", short = 'p')]
    input: PathBuf,

    /// Output file path (created or truncated)
    #[arg(long = "output", short = 'o')]
    output: PathBuf,

    /// Key file path
    #[arg(long = "key", short = 'k')]
    key: PathBuf,

    /// Worker thread count (default: config `transform.workers`)
    #[arg(long = "workers", short = 'j', allow_negative_numbers = true)]
    workers: Option<i64>,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq)]
enum LogFormat {
    Json,
    Text,
}

#[derive(Clone, Copy, Debug)]
enum Direction {
    Encrypt,
    Decrypt,
}

impl Direction {
    fn done_message(self) -> &'static str {
        match self {
            Direction::Encrypt => "Encryption successful",
            Direction::Decrypt => "Decryption successful",
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)
        .with_context(|| format!("loading config: {}", cli.config.display()))?;

    let level = cli.log.clone().unwrap_or_else(|| config.log.level.clone());
    let format = cli
        .log_format
        .unwrap_or_else(|| parse_log_format(&config.log.format));
    init_logging(&level, format);

    match cli.command {
        Commands::Encrypt(args) => cmd_transform(&config, &args, Direction::Encrypt),
        Commands::Decrypt(args) => cmd_transform(&config, &args, Direction::Decrypt),
        Commands::Config {
            action: ConfigAction::Show,
        } => cmd_config_show(&config, &cli.config),
    }
}

fn parse_log_format(raw: &str) -> LogFormat {
    match raw {
        "json" => LogFormat::Json,
        _ => LogFormat::Text,
    }
}

fn init_logging(level: &str, format: LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so stdout only carries command output
    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

// ── `xorcrypt encrypt` / `xorcrypt decrypt` ───────────────────────────────────

fn build_request(config: &XorcryptConfig, args: &TransformArgs) -> Result<TransformRequest> {
    let workers = match args.workers {
        Some(raw) => WorkerCount::new(raw)?,
        None => config.transform.worker_count(),
    };
    Ok(TransformRequest {
        input: args.input.clone(),
        output: args.output.clone(),
        key: args.key.clone(),
        workers,
    })
}

fn failure_context(request: &TransformRequest, direction: Direction) -> String {
    format!(
        "{} {} -> {} failed",
        match direction {
            Direction::Encrypt => "encrypting",
            Direction::Decrypt => "decrypting",
        },
        request.input.display(),
        request.output.display()
    )
}

fn cmd_transform(config: &XorcryptConfig, args: &TransformArgs, direction: Direction) -> Result<()> {
    let request = build_request(config, args)?;
    info!(direction = ?direction, workers = request.workers.get(), "running transform");

    let transformer = Transformer::new(EngineOptions {
        worker_stack_size: config.transform.worker_stack_size(),
    });
    let outcome = transformer
        .transform(&request)
        .with_context(|| failure_context(&request, direction))?;

    println!("{}", direction.done_message());
    println!(
        "  {} bytes written to {} by {} worker(s)",
        outcome.bytes_written,
        request.output.display(),
        outcome.workers.len()
    );
    Ok(())
}

// ── `xorcrypt config show` ────────────────────────────────────────────────────

fn cmd_config_show(config: &XorcryptConfig, path: &Path) -> Result<()> {
    println!("# config: {}", path.display());
    print!(
        "{}",
        toml::to_string_pretty(config).context("serializing config")?
    );
    Ok(())
}
