//! # Service Module
//!
//! Multi-table operations that must be atomic.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  CartService ──────┐                                                    │
//! │  StockService ─────┼──► pool.begin() ──► Repository::*_in(&mut tx) ──► │
//! │  CheckoutService ──┘                          COMMIT / drop = ROLLBACK  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A service owns the transaction; the repositories only ever see the
//! connection it lends them.

pub mod cart;
pub mod checkout;
pub mod stock;
