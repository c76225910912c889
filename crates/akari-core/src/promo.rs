//! # Promo Code Rules
//!
//! Decides whether a promotional code can be applied at a given instant.
//!
//! ```text
//! PromoCode ──► is_active? ──no──► Inactive
//!                  │
//!                 yes
//!                  ▼
//!        expires_on < today(now)? ──yes──► Expired { on }
//!                  │
//!                  no
//!                  ▼
//!           Ok(DiscountRate)
//! ```
//!
//! A code stays valid for the whole of its `expires_on` day (UTC).

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult, PromoRejection};
use crate::types::{DiscountRate, PromoCode};

/// Returns the discount to apply, or `InvalidPromoCode` when the code
/// is inactive or past its expiration date.
///
/// ```rust
/// use akari_core::promo::validate_promo;
/// use akari_core::types::PromoCode;
/// use chrono::{NaiveDate, TimeZone, Utc};
///
/// let promo = PromoCode {
///     id: "p-1".to_string(),
///     code: "SUMMER10".to_string(),
///     discount_bps: 1000,
///     expires_on: NaiveDate::from_ymd_opt(2024, 8, 31),
///     is_active: true,
/// };
///
/// let during = Utc.with_ymd_and_hms(2024, 8, 31, 23, 59, 0).unwrap();
/// assert_eq!(validate_promo(&promo, during).unwrap().bps(), 1000);
///
/// let after = Utc.with_ymd_and_hms(2024, 9, 1, 0, 0, 0).unwrap();
/// assert!(validate_promo(&promo, after).is_err());
/// ```
pub fn validate_promo(promo: &PromoCode, now: DateTime<Utc>) -> CoreResult<DiscountRate> {
    match rejection(promo, now) {
        Some(reason) => Err(CoreError::InvalidPromoCode {
            code: promo.code.clone(),
            reason,
        }),
        None => Ok(promo.discount()),
    }
}

/// Returns why `promo` cannot be used at `now`, or `None` when it can.
pub fn rejection(promo: &PromoCode, now: DateTime<Utc>) -> Option<PromoRejection> {
    if !promo.is_active {
        return Some(PromoRejection::Inactive);
    }
    match promo.expires_on {
        Some(on) if on < now.date_naive() => Some(PromoRejection::Expired { on }),
        _ => None,
    }
}
