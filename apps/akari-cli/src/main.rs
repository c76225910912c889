//! # Akari POS Command Line
//!
//! Process entry point for the Akari POS checkout engine.
//!
//! ## Application Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        akari (this binary)                              │
//! │                                                                         │
//! │  main.rs ─────► parse args, logging, config, database lifecycle        │
//! │                                                                         │
//! │  config.rs ───► AkariConfig (TOML + AKARI_* environment)               │
//! │                                                                         │
//! │  commands/ ───► product, cart, checkout, ticket, report, ...           │
//! │                                                                         │
//! │  error.rs ────► CliError { code, message } on stderr, exit status      │
//! │                                                                         │
//! │                                 │                                       │
//! │                                 ▼                                       │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                         SQLite Database                          │  │
//! │  │  akari.db (local file, WAL mode)                                 │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Startup Sequence
//! 1. Parse arguments
//! 2. Initialize tracing (logging, to stderr)
//! 3. Load configuration
//! 4. Connect to database & run migrations
//! 5. Run the command, print JSON on stdout
//! 6. Close the pool

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde_json::Value;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use akari_db::Database;

mod commands;
mod config;
mod error;

use crate::commands::Command;
use crate::config::AkariConfig;
use crate::error::{CliError, CliResult};

#[derive(Debug, Parser)]
#[command(name = "akari", about = "Akari POS checkout engine", version)]
struct Cli {
    /// Config file (default: platform config dir, akari.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file, overriding config and AKARI_DB_PATH
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let pretty = cli.pretty;
    match run(cli).await {
        Ok(value) => match render(&value, pretty) {
            Ok(out) => {
                println!("{}", out);
                ExitCode::SUCCESS
            }
            Err(err) => fail(err, pretty),
        },
        Err(err) => fail(err, pretty),
    }
}

async fn run(cli: Cli) -> CliResult<Value> {
    let mut config = AkariConfig::load(cli.config.as_deref())?;
    if let Some(path) = cli.db {
        config.database.path = Some(path);
    }

    let db_config = config.db_config()?;
    info!(path = %db_config.database_path.display(), "Opening database");
    let db = Database::new(db_config).await?;

    debug!(command = ?cli.command, "Running command");
    let result = commands::run(&db, config.checkout, cli.command).await;

    db.close().await;
    result
}

fn render(value: &Value, pretty: bool) -> CliResult<String> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(out)
}

fn fail(err: CliError, pretty: bool) -> ExitCode {
    error!(code = ?err.code, "{}", err);

    let body = serde_json::to_value(&err)
        .map_err(CliError::from)
        .and_then(|value| render(&value, pretty))
        .unwrap_or_else(|_| err.message.clone());
    eprintln!("{}", body);

    // exit_code() is always within 1..=75
    ExitCode::from(err.exit_code() as u8)
}

/// Initializes the tracing subscriber for structured logging.
///
/// Logs go to stderr so stdout stays machine-readable.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=akari=trace` - Show trace for akari crates only
/// - Default: `info,akari=debug,sqlx=warn`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,akari=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_negative_stock_delta_parses() {
        let cli = Cli::try_parse_from(["akari", "stock", "adjust", "p-1", "-3"]).unwrap();
        match cli.command {
            Command::Stock(commands::catalog::StockCommand::Adjust { product, delta }) => {
                assert_eq!(product, "p-1");
                assert_eq!(delta, -3);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_checkout_promo_flags_conflict() {
        let result = Cli::try_parse_from([
            "akari", "checkout", "--user", "u", "--client", "c", "--promo", "p", "--promo-code",
            "SUMMER10",
        ]);
        assert!(result.is_err());
    }
}
