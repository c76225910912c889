//! # Command Handlers
//!
//! One subcommand per operation. Every handler returns a JSON value that
//! `main` prints on stdout.
//!
//! ## Available Commands
//!
//! - [`catalog`] - product, category, provider, alert, stock
//! - [`people`] - user, client
//! - [`sales`] - promo, cart, checkout, ticket, report

use clap::Subcommand;
use serde::Serialize;
use serde_json::{json, Value};

use akari_core::CheckoutPolicy;
use akari_db::Database;

use crate::error::CliResult;

pub mod catalog;
pub mod people;
pub mod sales;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Database health and migration status
    Status,
    #[command(subcommand)]
    Product(catalog::ProductCommand),
    #[command(subcommand)]
    Category(catalog::CategoryCommand),
    #[command(subcommand)]
    Provider(catalog::ProviderCommand),
    /// Low-stock thresholds
    #[command(subcommand)]
    Alert(catalog::AlertCommand),
    #[command(subcommand)]
    Stock(catalog::StockCommand),
    #[command(subcommand)]
    User(people::UserCommand),
    #[command(subcommand)]
    Client(people::ClientCommand),
    #[command(subcommand)]
    Promo(sales::PromoCommand),
    #[command(subcommand)]
    Cart(sales::CartCommand),
    /// Turn a user's pending cart into a ticket
    Checkout(sales::CheckoutArgs),
    #[command(subcommand)]
    Ticket(sales::TicketCommand),
    #[command(subcommand)]
    Report(sales::ReportCommand),
}

/// Runs `command` against `db`.
pub async fn run(db: &Database, policy: CheckoutPolicy, command: Command) -> CliResult<Value> {
    match command {
        Command::Status => status(db).await,
        Command::Product(cmd) => catalog::product(db, cmd).await,
        Command::Category(cmd) => catalog::category(db, cmd).await,
        Command::Provider(cmd) => catalog::provider(db, cmd).await,
        Command::Alert(cmd) => catalog::alert(db, cmd).await,
        Command::Stock(cmd) => catalog::stock(db, cmd).await,
        Command::User(cmd) => people::user(db, cmd).await,
        Command::Client(cmd) => people::client(db, cmd).await,
        Command::Promo(cmd) => sales::promo(db, cmd).await,
        Command::Cart(cmd) => sales::cart(db, cmd).await,
        Command::Checkout(args) => sales::checkout(db, policy, args).await,
        Command::Ticket(cmd) => sales::ticket(db, cmd).await,
        Command::Report(cmd) => sales::report(db, cmd).await,
    }
}

async fn status(db: &Database) -> CliResult<Value> {
    let migrations = db.migration_status().await?;
    Ok(json!({
        "healthy": db.health_check().await,
        "migrations": migrations,
    }))
}

pub(crate) fn to_json<T: Serialize>(value: T) -> CliResult<Value> {
    Ok(serde_json::to_value(value)?)
}

#[cfg(test)]
pub(crate) mod test_support {
    use akari_db::{Database, DbConfig};

    pub(crate) async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }
}
