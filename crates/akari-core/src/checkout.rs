//! # Checkout Pricing
//!
//! The pure half of checkout: given the pending lines the database
//! handed back and an optional promo code, compute what the ticket says.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  akari-db CheckoutService (one transaction)                             │
//! │                                                                         │
//! │  1. SELECT pending lines ───────────┐                                   │
//! │  2. load promo code ────────────────┤                                   │
//! │                                     ▼                                   │
//! │                     ┌───────────────────────────────┐                   │
//! │                     │ price_ticket() ← THIS MODULE  │                   │
//! │                     │  • all lines pending?         │                   │
//! │                     │  • empty cart allowed?        │                   │
//! │                     │  • promo usable now?          │                   │
//! │                     │  • prev = Σ line totals       │                   │
//! │                     │  • final = half-even discount │                   │
//! │                     └───────────────┬───────────────┘                   │
//! │                                     ▼                                   │
//! │  3. decrement stock (stock_demand) ─► 4. INSERT ticket                  │
//! │  5. compare-and-swap lines ─────────► 6. COMMIT                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::promo::validate_promo;
use crate::types::{CartLine, DiscountRate, PromoCode};
use crate::validation::{validate_issue_details, validate_uuid, ValidationResult};

// =============================================================================
// Policy
// =============================================================================

/// Knobs that change how checkout treats edge cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutPolicy {
    /// Issue a zero-value ticket when the cart is empty instead of
    /// failing with `EmptyCart`.
    #[serde(default)]
    pub allow_empty: bool,

    /// Decrement product stock by the consumed line quantities.
    #[serde(default = "default_decrement_stock")]
    pub decrement_stock: bool,

    /// Extra attempts `checkout_with_retry` makes after a conflict.
    #[serde(default = "default_conflict_retries")]
    pub conflict_retries: u32,
}

fn default_decrement_stock() -> bool {
    true
}

fn default_conflict_retries() -> u32 {
    3
}

impl Default for CheckoutPolicy {
    fn default() -> Self {
        Self {
            allow_empty: false,
            decrement_stock: default_decrement_stock(),
            conflict_retries: default_conflict_retries(),
        }
    }
}

// =============================================================================
// Request
// =============================================================================

/// Everything needed to turn a user's cart into a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    /// Cashier whose pending lines are consumed.
    pub user_id: String,
    /// Customer the ticket is issued to.
    pub client_id: String,
    pub promo_code_id: Option<String>,
    pub issue_details: Option<String>,
}

impl CheckoutRequest {
    pub fn new(user_id: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            client_id: client_id.into(),
            promo_code_id: None,
            issue_details: None,
        }
    }

    pub fn with_promo(mut self, promo_code_id: impl Into<String>) -> Self {
        self.promo_code_id = Some(promo_code_id.into());
        self
    }

    pub fn with_issue_details(mut self, details: impl Into<String>) -> Self {
        self.issue_details = Some(details.into());
        self
    }

    pub fn validate(&self) -> ValidationResult<()> {
        validate_uuid("user_id", &self.user_id)?;
        validate_uuid("client_id", &self.client_id)?;
        if let Some(promo_id) = &self.promo_code_id {
            validate_uuid("promo_code_id", promo_id)?;
        }
        if let Some(details) = &self.issue_details {
            validate_issue_details(details)?;
        }
        Ok(())
    }
}

// =============================================================================
// Pricing
// =============================================================================

/// Result of pricing a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketPricing {
    /// Sum of line totals before discount.
    pub prev_price: Money,
    /// Amount charged.
    pub final_price: Money,
    pub discount: DiscountRate,
    pub line_count: usize,
}

/// Prices a ticket from the user's pending lines.
///
/// ## Errors
/// - `InvalidLineStatus` if any line is not pending
/// - `EmptyCart` if there are no lines and `policy.allow_empty` is false
/// - `InvalidPromoCode` if the promo is inactive or expired at `now`
/// - `Validation` if the line totals overflow
///
/// ```rust
/// use akari_core::checkout::{price_ticket, CheckoutPolicy};
/// use chrono::Utc;
///
/// // An empty cart prices to zero only when the policy allows it.
/// let policy = CheckoutPolicy { allow_empty: true, ..Default::default() };
/// let pricing = price_ticket("u-1", &[], None, Utc::now(), &policy).unwrap();
/// assert!(pricing.final_price.is_zero());
/// assert!(price_ticket("u-1", &[], None, Utc::now(), &CheckoutPolicy::default()).is_err());
/// ```
pub fn price_ticket(
    user_id: &str,
    lines: &[CartLine],
    promo: Option<&PromoCode>,
    now: DateTime<Utc>,
    policy: &CheckoutPolicy,
) -> CoreResult<TicketPricing> {
    if let Some(line) = lines.iter().find(|l| !l.is_pending()) {
        return Err(CoreError::InvalidLineStatus {
            line_id: line.id.clone(),
            status: line.order_status,
        });
    }

    if lines.is_empty() && !policy.allow_empty {
        return Err(CoreError::EmptyCart {
            user_id: user_id.to_string(),
        });
    }

    let discount = match promo {
        Some(promo) => validate_promo(promo, now)?,
        None => DiscountRate::zero(),
    };

    let prev_price = Money::checked_sum(lines.iter().map(CartLine::total_amount)).ok_or_else(|| {
        ValidationError::OutOfRange {
            field: "prev_price".to_string(),
            min: 0,
            max: i64::MAX,
        }
    })?;
    let final_price = prev_price.apply_discount(discount);

    Ok(TicketPricing {
        prev_price,
        final_price,
        discount,
        line_count: lines.len(),
    })
}

/// Units to take from stock per product, keyed in id order.
///
/// Several lines for the same product collapse into one adjustment, and the
/// sorted order keeps concurrent checkouts touching products in the same
/// sequence.
pub fn stock_demand(lines: &[CartLine]) -> BTreeMap<String, i64> {
    let mut demand = BTreeMap::new();
    for line in lines {
        *demand.entry(line.product_id.clone()).or_insert(0) += line.quantity;
    }
    demand
}

// =============================================================================
// Unit Tests
// =============================================================================
