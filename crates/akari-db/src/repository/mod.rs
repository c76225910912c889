//! # Repository Module
//!
//! Database repository implementations for Akari POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  CLI command                                                           │
//! │       │  db.products().list(None)                                      │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── create / get_by_id / list / update / delete   (pool-backed)       │
//! │  └── get_in / update_stock_in                      (caller's conn)     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Pool-backed methods each take their own connection. The `*_in`        │
//! │  functions run on a connection the caller already holds, which is     │
//! │  how services compose several of them into one transaction.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Products and the conditional stock update
//! - [`catalog::CategoryRepository`], [`catalog::ProviderRepository`]
//! - [`alert::StockAlertRepository`] - Low-stock thresholds and report
//! - [`directory::UserRepository`], [`directory::ClientRepository`]
//! - [`promo::PromoCodeRepository`]
//! - [`cart::CartLineRepository`] - Cart ledger reads and CAS completion
//! - [`ticket::TicketRepository`] - Tickets and ticket detail
//! - [`report::ReportRepository`] - Dashboard aggregates

pub mod alert;
pub mod cart;
pub mod catalog;
pub mod directory;
pub mod product;
pub mod promo;
pub mod report;
pub mod ticket;
