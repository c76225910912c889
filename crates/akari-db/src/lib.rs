//! # akari-db: Persistence Layer for Akari POS
//!
//! SQLite storage for the catalog, the people directory and the sales
//! ledger, accessed through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Akari POS Data Flow                              │
//! │                                                                         │
//! │  akari-cli (checkout --user .. --client ..)                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     akari-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │   Services    │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ Cart / Stock  │    │  (embedded)  │  │   │
//! │  │   │               │    │ Checkout      │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│───────────────│    │ 001_initial  │  │   │
//! │  │   │ WAL, FKs on   │    │ Repositories  │    │ _schema.sql  │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (akari.db)                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and domain error types
//! - [`repository`] - Per-table reads and writes
//! - [`service`] - Transactional cart, stock and checkout operations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use akari_db::{Database, DbConfig};
//! use akari_core::{CheckoutPolicy, CheckoutRequest, PaymentMethod};
//!
//! let db = Database::new(DbConfig::new("akari.db")).await?;
//!
//! db.cart().add_to_cart(&user_id, &product_id, 2, PaymentMethod::Cash).await?;
//! let ticket = db
//!     .checkout(CheckoutPolicy::default())
//!     .checkout(&CheckoutRequest::new(&user_id, &client_id))
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

#[cfg(test)]
pub(crate) mod test_support;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult, ErrorCode, PosError, PosResult};
pub use pool::{Database, DbConfig, MigrationStatus};

// Repository re-exports for convenience
pub use repository::alert::StockAlertRepository;
pub use repository::cart::CartLineRepository;
pub use repository::catalog::{CategoryRepository, ProviderRepository};
pub use repository::directory::{ClientRepository, UserRepository};
pub use repository::product::ProductRepository;
pub use repository::promo::PromoCodeRepository;
pub use repository::report::{ReportRepository, DEFAULT_TOP_LIMIT};
pub use repository::ticket::TicketRepository;

pub use service::cart::CartService;
pub use service::checkout::CheckoutService;
pub use service::stock::StockService;
