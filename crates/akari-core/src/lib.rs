//! # akari-core: Pure Business Logic for Akari POS
//!
//! This crate holds every business rule of the point-of-sale backend as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Akari POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Request layer (akari CLI)                       │   │
//! │  │    add-to-cart ──► checkout ──► ticket show ──► reports         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ akari-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   promo   │  │ checkout  │  │   │
//! │  │   │  Product  │  │   Money   │  │ validate  │  │  pricing  │  │   │
//! │  │   │  Ticket   │  │ half-even │  │  expiry   │  │  policy   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │      akari-db (SQLite, repositories, checkout transaction)      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, CartLine, Ticket, PromoCode, ...)
//! - [`money`] - Money type with integer arithmetic and half-even rounding
//! - [`promo`] - Promo code usability rules
//! - [`checkout`] - Ticket pricing and checkout policy
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use akari_core::money::Money;
//! use akari_core::types::DiscountRate;
//!
//! let subtotal = Money::from_cents(15000); // 150.00
//! let total = subtotal.apply_discount(DiscountRate::from_percent(10));
//! assert_eq!(total.cents(), 13500); // 135.00
//! ```

pub mod checkout;
pub mod error;
pub mod money;
pub mod promo;
pub mod types;
pub mod validation;

pub use checkout::{CheckoutPolicy, CheckoutRequest, TicketPricing};
pub use error::{CoreError, CoreResult, PromoRejection, ValidationError};
pub use money::Money;
pub use types::*;

/// Maximum quantity of a single product on one cart line.
///
/// Guards against typing 1000 instead of 10 at the register.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest unit price a product may carry, in cents (one billion major units).
///
/// A full line of `MAX_ITEM_QUANTITY` at this price stays far inside `i64`.
pub const MAX_PRICE_CENTS: i64 = 100_000_000_000;

/// Maximum length of the free-form issue details printed on a ticket.
pub const MAX_ISSUE_DETAILS_LEN: usize = 1000;
