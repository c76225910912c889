//! # Domain Types
//!
//! Core domain types used throughout Akari POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    CartLine     │   │     Ticket      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  product_id     │   │  id (UUID)      │       │
//! │  │  sku (business) │   │  user_id        │   │  client_id      │       │
//! │  │  quantity ≥ 0   │   │  order_status   │   │  prev_price     │       │
//! │  │  price_sell     │   │  ticket_id ─────┼──►│  final_price    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  DiscountRate   │   │ CartLineStatus  │   │ PaymentMethod   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  Pending        │   │  Cash           │       │
//! │  │  1000 = 10%     │   │  Completed      │   │  Card           │       │
//! │  └─────────────────┘   └─────────────────┘   │  Transfer       │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every entity is keyed by a UUID v4 string generated by the application.
//! Business identifiers (sku, username, promo code text) are unique but
//! never used as foreign keys.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::{
    validate_discount_bps, validate_name, validate_price_cents, validate_promo_code,
    validate_sku, validate_stock_level, validate_username, ValidationResult,
};

// =============================================================================
// Discount Rate
// =============================================================================

/// Discount rate in basis points (1 bps = 0.01%).
///
/// 1000 bps = 10% off. Valid range is 0..=10000.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DiscountRate(u32);

impl DiscountRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        DiscountRate(bps)
    }

    /// Whole-percent convenience constructor: `from_percent(10)` is 1000 bps.
    #[inline]
    pub const fn from_percent(pct: u32) -> Self {
        DiscountRate(pct * 100)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Percentage for display only.
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        DiscountRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for DiscountRate {
    fn default() -> Self {
        DiscountRate::zero()
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to the cashier and on the ticket.
    pub name: String,

    /// Stock Keeping Unit, unique when present.
    pub sku: Option<String>,

    pub color: Option<String>,

    /// Units on hand. Never negative.
    pub quantity: i64,

    /// Selling price in cents.
    pub price_sell_cents: i64,

    /// Purchase price in cents.
    pub price_buy_cents: i64,

    pub provider_id: Option<String>,

    pub image_url: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price_sell(&self) -> Money {
        Money::from_cents(self.price_sell_cents)
    }

    /// Checks whether `quantity` units can be taken from stock.
    pub fn can_fulfill(&self, quantity: i64) -> bool {
        self.quantity >= quantity
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub sku: Option<String>,
    pub color: Option<String>,
    pub quantity: i64,
    pub price_sell_cents: i64,
    pub price_buy_cents: i64,
    pub provider_id: Option<String>,
    pub image_url: Option<String>,
}

impl NewProduct {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name)?;
        if let Some(sku) = &self.sku {
            validate_sku(sku)?;
        }
        validate_stock_level("quantity", self.quantity)?;
        validate_price_cents("price_sell", self.price_sell_cents)?;
        validate_price_cents("price_buy", self.price_buy_cents)?;
        Ok(())
    }
}

/// Partial product update. `None` leaves the column unchanged.
///
/// Stock is not editable here; it moves only through stock adjustment
/// and checkout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub color: Option<String>,
    pub price_sell_cents: Option<i64>,
    pub price_buy_cents: Option<i64>,
    pub provider_id: Option<String>,
    pub image_url: Option<String>,
}

impl ProductUpdate {
    pub fn validate(&self) -> ValidationResult<()> {
        if let Some(name) = &self.name {
            validate_name("name", name)?;
        }
        if let Some(sku) = &self.sku {
            validate_sku(sku)?;
        }
        if let Some(cents) = self.price_sell_cents {
            validate_price_cents("price_sell", cents)?;
        }
        if let Some(cents) = self.price_buy_cents {
            validate_price_cents("price_buy", cents)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.sku.is_none()
            && self.color.is_none()
            && self.price_sell_cents.is_none()
            && self.price_buy_cents.is_none()
            && self.provider_id.is_none()
            && self.image_url.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    pub id: String,
    pub name: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Provider {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub contact_info: Option<String>,
}

/// Low-stock threshold for one product.
///
/// A product is low on stock when `quantity <= min_stock`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockAlert {
    pub id: String,
    pub product_id: String,
    pub min_stock: i64,
}

// =============================================================================
// Directory
// =============================================================================

/// Role of a registered user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    /// Cashier.
    #[default]
    Vendedor,
    Admin,
}

impl FromStr for UserType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vendedor" => Ok(UserType::Vendedor),
            "admin" => Ok(UserType::Admin),
            _ => Err(ValidationError::NotAllowed {
                field: "user_type".to_string(),
                allowed: vec!["vendedor".to_string(), "admin".to_string()],
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: String,
    pub username: String,
    pub phone: Option<String>,
    pub user_type: UserType,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub phone: Option<String>,
    pub user_type: UserType,
}

impl NewUser {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_username(&self.username)
    }
}

/// Partial user update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub phone: Option<String>,
    pub user_type: Option<UserType>,
}

impl UserUpdate {
    pub fn validate(&self) -> ValidationResult<()> {
        if let Some(username) = &self.username {
            validate_username(username)?;
        }
        Ok(())
    }
}

/// The customer a ticket is issued to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Client {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub contact_info: Option<String>,
}

// =============================================================================
// Promotions
// =============================================================================

/// A promotional discount code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PromoCode {
    pub id: String,
    /// Code the customer presents, unique.
    pub code: String,
    /// Discount in basis points, 0..=10000.
    pub discount_bps: i64,
    /// Last day the code can be used. `None` never expires.
    pub expires_on: Option<NaiveDate>,
    pub is_active: bool,
}

impl PromoCode {
    /// Returns the discount rate; out-of-range values clamp to 0..=100%.
    pub fn discount(&self) -> DiscountRate {
        DiscountRate::from_bps(self.discount_bps.clamp(0, 10_000) as u32)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPromoCode {
    pub code: String,
    pub discount_bps: i64,
    pub expires_on: Option<NaiveDate>,
    pub is_active: bool,
}

impl NewPromoCode {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_promo_code(&self.code)?;
        validate_discount_bps(self.discount_bps)?;
        Ok(())
    }
}

// =============================================================================
// Cart Line Status
// =============================================================================

/// Lifecycle of a cart line. The only transition is Pending → Completed,
/// performed by checkout together with setting `ticket_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum CartLineStatus {
    #[default]
    #[serde(rename = "pendiente")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "pendiente"))]
    Pending,
    #[serde(rename = "completado")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "completado"))]
    Completed,
}

impl CartLineStatus {
    /// Value stored in the `order_status` column.
    pub const fn as_str(&self) -> &'static str {
        match self {
            CartLineStatus::Pending => "pendiente",
            CartLineStatus::Completed => "completado",
        }
    }
}

impl fmt::Display for CartLineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Transfer,
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "transfer" => Ok(PaymentMethod::Transfer),
            _ => Err(ValidationError::NotAllowed {
                field: "payment_method".to_string(),
                allowed: vec![
                    "cash".to_string(),
                    "card".to_string(),
                    "transfer".to_string(),
                ],
            }),
        }
    }
}

// =============================================================================
// Cart Line
// =============================================================================

/// One line of a user's cart.
///
/// The price is snapshotted when the line is added so later catalog edits
/// do not change what the customer pays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CartLine {
    pub id: String,
    pub user_id: String,
    pub product_id: String,
    pub quantity: i64,
    /// `price_sell_cents` at the time the line was added.
    pub unit_price_cents: i64,
    /// `unit_price_cents * quantity`.
    pub total_amount_cents: i64,
    pub payment_method: PaymentMethod,
    pub order_status: CartLineStatus,
    /// Set exactly when `order_status` is Completed.
    pub ticket_id: Option<String>,
    pub order_date: DateTime<Utc>,
}

impl CartLine {
    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.order_status == CartLineStatus::Pending
    }
}

// =============================================================================
// Ticket
// =============================================================================

/// A finalized sale. Created only by checkout and never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Ticket {
    pub id: String,
    pub client_id: String,
    pub user_id: String,
    pub issue_details: Option<String>,
    /// Sum of the consumed cart lines, before discount.
    pub prev_price_cents: i64,
    /// Amount charged after the promo discount.
    pub final_price_cents: i64,
    pub promo_code_id: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Audit touch only; prices never change.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Ticket {
    #[inline]
    pub fn prev_price(&self) -> Money {
        Money::from_cents(self.prev_price_cents)
    }

    #[inline]
    pub fn final_price(&self) -> Money {
        Money::from_cents(self.final_price_cents)
    }
}

/// A ticket joined with its client, cashier, and consumed lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketDetail {
    pub ticket: Ticket,
    pub client_name: String,
    pub user_name: String,
    pub lines: Vec<CartLine>,
}

// =============================================================================
// Report Rows
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TopProduct {
    pub product_id: String,
    pub name: String,
    /// Number of completed cart lines for this product.
    pub times_sold: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TopClient {
    pub client_id: String,
    pub name: String,
    pub ticket_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LowStockProduct {
    pub product_id: String,
    pub name: String,
    pub quantity: i64,
    pub min_stock: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
