//! # Checkout Service
//!
//! Turns a user's pending cart lines into a ticket in one transaction.
//!
//! ## Transaction Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │   1. user exists? client exists?              → NotFound                │
//! │   2. SELECT pending lines for user                                      │
//! │   3. load promo (if any)                      → NotFound                │
//! │   4. price_ticket()                           → EmptyCart,              │
//! │                                                 InvalidPromoCode        │
//! │   5. per product: conditional stock UPDATE    → InsufficientStock       │
//! │   6. INSERT ticket                                                      │
//! │   7. UPDATE lines SET completado, ticket_id                             │
//! │        WHERE id IN (selected) AND pendiente                             │
//! │        affected != selected               → TransactionConflict         │
//! │  COMMIT                                   (SQLITE_BUSY → Conflict)      │
//! │                                                                         │
//! │  Any error drops the transaction: no ticket, no line change, no stock  │
//! │  change.                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrent Checkouts
//! Two checkouts for the same user read the same pending set. Whichever
//! writes first wins; the other either sees its snapshot invalidated
//! (`SQLITE_BUSY`) or its compare-and-swap move fewer rows than it
//! selected. Both surface as the retryable `TransactionConflict`, so a line
//! can never end up on two tickets.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::PosResult;
use crate::repository::cart::CartLineRepository;
use crate::repository::directory::{ClientRepository, UserRepository};
use crate::repository::promo::PromoCodeRepository;
use crate::repository::ticket::TicketRepository;
use crate::service::stock;
use akari_core::checkout::{price_ticket, stock_demand};
use akari_core::{CheckoutPolicy, CheckoutRequest, CoreError, Ticket};

#[derive(Debug, Clone)]
pub struct CheckoutService {
    pool: SqlitePool,
    policy: CheckoutPolicy,
}

impl CheckoutService {
    pub fn new(pool: SqlitePool, policy: CheckoutPolicy) -> Self {
        CheckoutService { pool, policy }
    }

    pub fn policy(&self) -> &CheckoutPolicy {
        &self.policy
    }

    /// Checks out the user's cart as of now.
    pub async fn checkout(&self, request: &CheckoutRequest) -> PosResult<Ticket> {
        self.checkout_at(request, Utc::now()).await
    }

    /// Checks out the user's cart, judging promo expiry and stamping the
    /// ticket at `now`.
    #[instrument(skip(self, request), fields(user_id = %request.user_id, client_id = %request.client_id))]
    pub async fn checkout_at(
        &self,
        request: &CheckoutRequest,
        now: DateTime<Utc>,
    ) -> PosResult<Ticket> {
        request.validate()?;

        let mut tx = self.pool.begin().await?;

        if !UserRepository::exists_in(&mut tx, &request.user_id).await? {
            return Err(CoreError::not_found("User", &request.user_id).into());
        }
        if ClientRepository::name_in(&mut tx, &request.client_id)
            .await?
            .is_none()
        {
            return Err(CoreError::not_found("Client", &request.client_id).into());
        }

        let lines = CartLineRepository::pending_for_user_in(&mut tx, &request.user_id).await?;
        debug!(pending = lines.len(), "Selected pending lines");

        // An empty cart is reported before the promo is even looked up.
        if lines.is_empty() && !self.policy.allow_empty {
            warn!("Checkout rejected: empty cart");
            return Err(CoreError::EmptyCart {
                user_id: request.user_id.clone(),
            }
            .into());
        }

        let promo = match &request.promo_code_id {
            Some(promo_id) => Some(
                PromoCodeRepository::get_in(&mut tx, promo_id)
                    .await?
                    .ok_or_else(|| CoreError::not_found("PromoCode", promo_id))?,
            ),
            None => None,
        };

        let pricing = price_ticket(&request.user_id, &lines, promo.as_ref(), now, &self.policy)
            .map_err(|err| {
                warn!(error = %err, "Checkout rejected");
                err
            })?;

        if self.policy.decrement_stock {
            for (product_id, quantity) in stock_demand(&lines) {
                stock::adjust_in(&mut tx, &product_id, -quantity, now).await?;
            }
        }

        let ticket = Ticket {
            id: Uuid::new_v4().to_string(),
            client_id: request.client_id.clone(),
            user_id: request.user_id.clone(),
            issue_details: request.issue_details.clone(),
            prev_price_cents: pricing.prev_price.cents(),
            final_price_cents: pricing.final_price.cents(),
            promo_code_id: promo.as_ref().map(|p| p.id.clone()),
            created_at: now,
            updated_at: None,
        };
        TicketRepository::insert_in(&mut tx, &ticket).await?;

        let line_ids: Vec<String> = lines.iter().map(|line| line.id.clone()).collect();
        let moved = CartLineRepository::complete_in(&mut tx, &line_ids, &ticket.id).await?;
        if moved != line_ids.len() as u64 {
            warn!(
                selected = line_ids.len(),
                moved,
                "Cart lines changed underneath checkout"
            );
            return Err(CoreError::conflict(format!(
                "expected to complete {} cart lines, completed {}",
                line_ids.len(),
                moved
            ))
            .into());
        }

        tx.commit().await?;

        info!(
            ticket_id = %ticket.id,
            lines = pricing.line_count,
            prev_price_cents = ticket.prev_price_cents,
            final_price_cents = ticket.final_price_cents,
            discount_bps = pricing.discount.bps(),
            "Checkout completed"
        );
        Ok(ticket)
    }

    /// Runs [`checkout`](Self::checkout), retrying up to
    /// `policy.conflict_retries` more times on `TransactionConflict`.
    /// Every other error is returned at once.
    pub async fn checkout_with_retry(&self, request: &CheckoutRequest) -> PosResult<Ticket> {
        let mut retries = 0;
        loop {
            match self.checkout(request).await {
                Err(err) if err.is_retryable() && retries < self.policy.conflict_retries => {
                    retries += 1;
                    warn!(attempt = retries, error = %err, "Retrying checkout after conflict");
                    tokio::task::yield_now().await;
                }
                result => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PosError;
    use crate::test_support::{new_product, seed_sale_fixture, test_db, SaleFixture};
    use crate::Database;
    use akari_core::{CartLineStatus, NewPromoCode, PaymentMethod, PromoRejection};
    use chrono::NaiveDate;

    async fn assert_untouched(db: &Database, fx: &SaleFixture) {
        let pending = db.cart_lines().pending_lines(&fx.user.id).await.unwrap();
        assert_eq!(pending.len(), 2);
        assert!(pending.iter().all(|l| l.ticket_id.is_none()));
        assert!(db.tickets().list(10).await.unwrap().is_empty());

        let cuaderno = db.products().get_by_id(&fx.cuaderno.id).await.unwrap().unwrap();
        let pluma = db.products().get_by_id(&fx.pluma.id).await.unwrap().unwrap();
        assert_eq!(cuaderno.quantity, fx.cuaderno.quantity);
        assert_eq!(pluma.quantity, fx.pluma.quantity);
    }

    #[tokio::test]
    async fn test_checkout_with_active_promo() {
        let db = test_db().await;
        let fx = seed_sale_fixture(&db).await;

        let ticket = db
            .checkout(CheckoutPolicy::default())
            .checkout(
                &CheckoutRequest::new(&fx.user.id, &fx.client.id)
                    .with_promo(&fx.promo.id)
                    .with_issue_details("sin bolsa"),
            )
            .await
            .unwrap();

        assert_eq!(ticket.prev_price_cents, 15000);
        assert_eq!(ticket.final_price_cents, 13500);
        assert_eq!(ticket.promo_code_id.as_deref(), Some(fx.promo.id.as_str()));
        assert_eq!(ticket.issue_details.as_deref(), Some("sin bolsa"));

        let lines = db.cart_lines().lines_for_ticket(&ticket.id).await.unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines
            .iter()
            .all(|l| l.order_status == CartLineStatus::Completed
                && l.ticket_id.as_deref() == Some(ticket.id.as_str())));
        assert!(db.cart_lines().pending_lines(&fx.user.id).await.unwrap().is_empty());

        let cuaderno = db.products().get_by_id(&fx.cuaderno.id).await.unwrap().unwrap();
        let pluma = db.products().get_by_id(&fx.pluma.id).await.unwrap().unwrap();
        assert_eq!(cuaderno.quantity, fx.cuaderno.quantity - 1);
        assert_eq!(pluma.quantity, fx.pluma.quantity - 2);
    }

    #[tokio::test]
    async fn test_checkout_without_promo_charges_full_price() {
        let db = test_db().await;
        let fx = seed_sale_fixture(&db).await;

        let ticket = db
            .checkout(CheckoutPolicy::default())
            .checkout(&CheckoutRequest::new(&fx.user.id, &fx.client.id))
            .await
            .unwrap();

        assert_eq!(ticket.prev_price_cents, ticket.final_price_cents);
        assert!(ticket.promo_code_id.is_none());
    }

    #[tokio::test]
    async fn test_expired_promo_rolls_back() {
        let db = test_db().await;
        let fx = seed_sale_fixture(&db).await;
        let expired = db
            .promo_codes()
            .create(&NewPromoCode {
                code: "OLD10".to_string(),
                discount_bps: 1000,
                expires_on: NaiveDate::from_ymd_opt(2020, 1, 31),
                is_active: true,
            })
            .await
            .unwrap();

        let err = db
            .checkout(CheckoutPolicy::default())
            .checkout(&CheckoutRequest::new(&fx.user.id, &fx.client.id).with_promo(&expired.id))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PosError::Core(CoreError::InvalidPromoCode {
                reason: PromoRejection::Expired { .. },
                ..
            })
        ));
        assert_untouched(&db, &fx).await;
    }

    #[tokio::test]
    async fn test_promo_valid_through_its_last_day() {
        let db = test_db().await;
        let fx = seed_sale_fixture(&db).await;
        let promo = db
            .promo_codes()
            .create(&NewPromoCode {
                code: "LASTDAY".to_string(),
                discount_bps: 1000,
                expires_on: NaiveDate::from_ymd_opt(2024, 8, 31),
                is_active: true,
            })
            .await
            .unwrap();
        let last_evening = NaiveDate::from_ymd_opt(2024, 8, 31)
            .unwrap()
            .and_hms_opt(23, 30, 0)
            .unwrap()
            .and_utc();

        let ticket = db
            .checkout(CheckoutPolicy::default())
            .checkout_at(
                &CheckoutRequest::new(&fx.user.id, &fx.client.id).with_promo(&promo.id),
                last_evening,
            )
            .await
            .unwrap();
        assert_eq!(ticket.final_price_cents, 13500);
        assert_eq!(ticket.created_at, last_evening);
    }

    #[tokio::test]
    async fn test_inactive_promo_rolls_back() {
        let db = test_db().await;
        let fx = seed_sale_fixture(&db).await;
        db.promo_codes().set_active(&fx.promo.id, false).await.unwrap();

        let err = db
            .checkout(CheckoutPolicy::default())
            .checkout(&CheckoutRequest::new(&fx.user.id, &fx.client.id).with_promo(&fx.promo.id))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PosError::Core(CoreError::InvalidPromoCode {
                reason: PromoRejection::Inactive,
                ..
            })
        ));
        assert_untouched(&db, &fx).await;
    }

    #[tokio::test]
    async fn test_unknown_references_are_not_found() {
        let db = test_db().await;
        let fx = seed_sale_fixture(&db).await;
        let checkout = db.checkout(CheckoutPolicy::default());
        let ghost = Uuid::new_v4().to_string();

        for request in [
            CheckoutRequest::new(&ghost, &fx.client.id),
            CheckoutRequest::new(&fx.user.id, &ghost),
            CheckoutRequest::new(&fx.user.id, &fx.client.id).with_promo(&ghost),
        ] {
            let err = checkout.checkout(&request).await.unwrap_err();
            assert!(matches!(err, PosError::Core(CoreError::NotFound { .. })));
        }
        assert_untouched(&db, &fx).await;
    }

    #[tokio::test]
    async fn test_empty_cart_policy() {
        let db = test_db().await;
        let fx = seed_sale_fixture(&db).await;
        let strict = db.checkout(CheckoutPolicy::default());

        strict
            .checkout(&CheckoutRequest::new(&fx.user.id, &fx.client.id))
            .await
            .unwrap();

        // Lines are consumed; a second checkout has nothing to sell.
        let err = strict
            .checkout(&CheckoutRequest::new(&fx.user.id, &fx.client.id))
            .await
            .unwrap_err();
        assert!(matches!(err, PosError::Core(CoreError::EmptyCart { .. })));
        assert!(!err.is_retryable());

        let lenient = db.checkout(CheckoutPolicy {
            allow_empty: true,
            ..Default::default()
        });
        let zero = lenient
            .checkout(&CheckoutRequest::new(&fx.user.id, &fx.client.id))
            .await
            .unwrap();
        assert_eq!(zero.prev_price_cents, 0);
        assert_eq!(zero.final_price_cents, 0);
        assert!(db.cart_lines().lines_for_ticket(&zero.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back_everything() {
        let db = test_db().await;
        let fx = seed_sale_fixture(&db).await;

        // Leave a single pluma; the cart wants two.
        db.stock()
            .adjust_stock(&fx.pluma.id, -(fx.pluma.quantity - 1))
            .await
            .unwrap();

        let err = db
            .checkout(CheckoutPolicy::default())
            .checkout(&CheckoutRequest::new(&fx.user.id, &fx.client.id))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PosError::Core(CoreError::InsufficientStock {
                available: 1,
                requested: 2,
                ..
            })
        ));

        let cuaderno = db.products().get_by_id(&fx.cuaderno.id).await.unwrap().unwrap();
        assert_eq!(cuaderno.quantity, fx.cuaderno.quantity);
        assert_eq!(db.cart_lines().pending_lines(&fx.user.id).await.unwrap().len(), 2);
        assert!(db.tickets().list(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stock_left_alone_when_policy_says_so() {
        let db = test_db().await;
        let fx = seed_sale_fixture(&db).await;

        db.checkout(CheckoutPolicy {
            decrement_stock: false,
            ..Default::default()
        })
        .checkout(&CheckoutRequest::new(&fx.user.id, &fx.client.id))
        .await
        .unwrap();

        let cuaderno = db.products().get_by_id(&fx.cuaderno.id).await.unwrap().unwrap();
        assert_eq!(cuaderno.quantity, fx.cuaderno.quantity);
    }

    #[tokio::test]
    async fn test_half_even_rounding_end_to_end() {
        let db = test_db().await;
        let fx = seed_sale_fixture(&db).await;
        let odd = db.products().create(&new_product("Goma", 1005, 5)).await.unwrap();
        let half = db
            .promo_codes()
            .create(&NewPromoCode {
                code: "HALF".to_string(),
                discount_bps: 5000,
                expires_on: None,
                is_active: true,
            })
            .await
            .unwrap();

        // Separate cashier so the fixture lines stay out of this cart.
        let cashier = db
            .users()
            .register(&crate::test_support::new_user("beto"))
            .await
            .unwrap();
        db.cart()
            .add_to_cart(&cashier.id, &odd.id, 1, PaymentMethod::Cash)
            .await
            .unwrap();

        let ticket = db
            .checkout(CheckoutPolicy::default())
            .checkout(&CheckoutRequest::new(&cashier.id, &fx.client.id).with_promo(&half.id))
            .await
            .unwrap();
        assert_eq!(ticket.prev_price_cents, 1005);
        assert_eq!(ticket.final_price_cents, 502);
    }

    #[tokio::test]
    async fn test_retry_passes_through_terminal_errors() {
        let db = test_db().await;
        let fx = seed_sale_fixture(&db).await;
        let checkout = db.checkout(CheckoutPolicy::default());

        let ticket = checkout
            .checkout_with_retry(&CheckoutRequest::new(&fx.user.id, &fx.client.id))
            .await
            .unwrap();
        assert_eq!(ticket.prev_price_cents, 15000);

        let err = checkout
            .checkout_with_retry(&CheckoutRequest::new(&fx.user.id, &fx.client.id))
            .await
            .unwrap_err();
        assert!(matches!(err, PosError::Core(CoreError::EmptyCart { .. })));
    }

    #[tokio::test]
    async fn test_malformed_ids_fail_validation() {
        let db = test_db().await;
        let err = db
            .checkout(CheckoutPolicy::default())
            .checkout(&CheckoutRequest::new("not-a-uuid", "also-not"))
            .await
            .unwrap_err();
        assert!(matches!(err, PosError::Core(CoreError::Validation(_))));
    }
}
