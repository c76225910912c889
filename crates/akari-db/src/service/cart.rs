//! # Cart Service
//!
//! Adds lines to a user's cart and edits pending ones.
//!
//! ## add_to_cart
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate_quantity(1..=999)                                             │
//! │       │                                                                 │
//! │  BEGIN                                                                  │
//! │       ├── user exists?     no → NotFound (nothing written)             │
//! │       ├── product exists?  no → NotFound (nothing written)             │
//! │       ├── unit = product.price_sell_cents (snapshot)                   │
//! │       ├── unit × qty overflows?  → Validation (nothing written)        │
//! │       └── INSERT cart_line { pendiente, unit × qty }                   │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Stock is NOT touched here; checkout decrements it.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{PosError, PosResult};
use crate::repository::cart::CartLineRepository;
use crate::repository::directory::UserRepository;
use crate::repository::product::ProductRepository;
use akari_core::validation::{validate_quantity, validate_uuid};
use akari_core::{CartLine, CartLineStatus, CoreError, PaymentMethod, ValidationError};

#[derive(Debug, Clone)]
pub struct CartService {
    pool: SqlitePool,
}

impl CartService {
    pub fn new(pool: SqlitePool) -> Self {
        CartService { pool }
    }

    /// Appends a pending line to `user_id`'s cart.
    ///
    /// ## Errors
    /// - `Validation` for a malformed id, a quantity outside 1..=999, or a
    ///   line total that does not fit in an `i64`
    /// - `NotFound` if the user or product does not exist
    #[instrument(skip(self))]
    pub async fn add_to_cart(
        &self,
        user_id: &str,
        product_id: &str,
        quantity: i64,
        payment_method: PaymentMethod,
    ) -> PosResult<CartLine> {
        validate_uuid("user_id", user_id)?;
        validate_uuid("product_id", product_id)?;
        validate_quantity(quantity)?;

        let mut tx = self.pool.begin().await?;

        if !UserRepository::exists_in(&mut tx, user_id).await? {
            return Err(CoreError::not_found("User", user_id).into());
        }

        let product = ProductRepository::get_in(&mut tx, product_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Product", product_id))?;

        let unit = product.price_sell();
        let total = unit
            .checked_multiply_quantity(quantity)
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "total_amount".to_string(),
                min: 0,
                max: i64::MAX,
            })?;
        let line = CartLine {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            product_id: product.id.clone(),
            quantity,
            unit_price_cents: unit.cents(),
            total_amount_cents: total.cents(),
            payment_method,
            order_status: CartLineStatus::Pending,
            ticket_id: None,
            order_date: Utc::now(),
        };

        CartLineRepository::insert_in(&mut tx, &line).await?;
        tx.commit().await?;

        info!(
            line_id = %line.id,
            user_id = %user_id,
            product_id = %product_id,
            quantity,
            total_cents = line.total_amount_cents,
            "Cart line added"
        );
        Ok(line)
    }

    /// Changes the quantity of a pending line; the total follows the unit
    /// price captured when the line was added.
    ///
    /// ## Errors
    /// - `Validation` for a malformed id or a quantity outside 1..=999
    /// - `NotFound` if the line does not exist
    /// - `InvalidLineStatus` if the line was already checked out
    #[instrument(skip(self))]
    pub async fn update_pending_quantity(&self, line_id: &str, quantity: i64) -> PosResult<CartLine> {
        validate_uuid("line_id", line_id)?;
        validate_quantity(quantity)?;

        let mut tx = self.pool.begin().await?;

        if let Some(line) =
            CartLineRepository::update_pending_quantity_in(&mut tx, line_id, quantity).await?
        {
            tx.commit().await?;
            info!(line_id = %line_id, quantity, "Pending line quantity updated");
            return Ok(line);
        }

        let existing = CartLineRepository::get_in(&mut tx, line_id)
            .await?
            .ok_or_else(|| CoreError::not_found("CartLine", line_id))?;

        Err(PosError::Core(CoreError::InvalidLineStatus {
            line_id: line_id.to_string(),
            status: existing.order_status,
        }))
    }
}

#[cfg(test)]
mod tests {
    use crate::error::PosError;
    use crate::test_support::{new_product, new_user, seed_sale_fixture, test_db};
    use akari_core::{
        CartLineStatus, CheckoutPolicy, CheckoutRequest, CoreError, PaymentMethod, ValidationError,
    };
    use uuid::Uuid;

    #[tokio::test]
    async fn test_add_snapshots_price_and_leaves_stock() {
        let db = test_db().await;
        let user = db.users().register(&new_user("ana")).await.unwrap();
        let product = db.products().create(&new_product("Pluma", 2500, 20)).await.unwrap();

        let line = db
            .cart()
            .add_to_cart(&user.id, &product.id, 3, PaymentMethod::Transfer)
            .await
            .unwrap();

        assert_eq!(line.unit_price_cents, 2500);
        assert_eq!(line.total_amount_cents, 7500);
        assert_eq!(line.order_status, CartLineStatus::Pending);
        assert!(line.ticket_id.is_none());

        let stored = db.cart_lines().get_by_id(&line.id).await.unwrap().unwrap();
        assert_eq!(stored, line);

        let product = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(product.quantity, 20);
    }

    #[tokio::test]
    async fn test_add_missing_product_creates_nothing() {
        let db = test_db().await;
        let user = db.users().register(&new_user("ana")).await.unwrap();

        let err = db
            .cart()
            .add_to_cart(&user.id, &Uuid::new_v4().to_string(), 1, PaymentMethod::Cash)
            .await
            .unwrap_err();
        assert!(matches!(err, PosError::Core(CoreError::NotFound { ref entity, .. }) if entity == "Product"));
        assert!(db.cart_lines().list_lines().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_missing_user() {
        let db = test_db().await;
        let product = db.products().create(&new_product("Pluma", 2500, 20)).await.unwrap();

        let err = db
            .cart()
            .add_to_cart(&Uuid::new_v4().to_string(), &product.id, 1, PaymentMethod::Cash)
            .await
            .unwrap_err();
        assert!(matches!(err, PosError::Core(CoreError::NotFound { ref entity, .. }) if entity == "User"));
    }

    #[tokio::test]
    async fn test_malformed_ids_are_validation_errors() {
        let db = test_db().await;
        let user = db.users().register(&new_user("ana")).await.unwrap();
        let product = db.products().create(&new_product("Pluma", 2500, 20)).await.unwrap();

        for (user_id, product_id) in [("missing", product.id.as_str()), (user.id.as_str(), "missing")] {
            let err = db
                .cart()
                .add_to_cart(user_id, product_id, 1, PaymentMethod::Cash)
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                PosError::Core(CoreError::Validation(ValidationError::InvalidFormat { .. }))
            ));
        }

        let err = db.cart().update_pending_quantity("missing", 1).await.unwrap_err();
        assert!(matches!(err, PosError::Core(CoreError::Validation(_))));
        assert!(db.cart_lines().list_lines().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_quantity_bounds() {
        let db = test_db().await;
        let user = db.users().register(&new_user("ana")).await.unwrap();
        let product = db.products().create(&new_product("Pluma", 2500, 20)).await.unwrap();

        for qty in [0, -2, 1000] {
            let err = db
                .cart()
                .add_to_cart(&user.id, &product.id, qty, PaymentMethod::Cash)
                .await
                .unwrap_err();
            assert!(matches!(err, PosError::Core(CoreError::Validation(_))));
        }
    }

    #[tokio::test]
    async fn test_oversized_price_is_an_error_not_a_panic() {
        let db = test_db().await;
        let user = db.users().register(&new_user("ana")).await.unwrap();

        let err = db
            .products()
            .create(&new_product("Lingote", i64::MAX / 2, 5))
            .await
            .unwrap_err();
        assert!(matches!(err, PosError::Core(CoreError::Validation(_))));

        // A price written behind validation's back still cannot overflow the line.
        let product = db.products().create(&new_product("Lingote", 100, 5)).await.unwrap();
        sqlx::query("UPDATE products SET price_sell_cents = ?1 WHERE id = ?2")
            .bind(i64::MAX / 2)
            .bind(&product.id)
            .execute(db.pool())
            .await
            .unwrap();

        let err = db
            .cart()
            .add_to_cart(&user.id, &product.id, 3, PaymentMethod::Cash)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PosError::Core(CoreError::Validation(ValidationError::OutOfRange { ref field, .. }))
                if field == "total_amount"
        ));
        assert!(db.cart_lines().list_lines().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_later_price_change_does_not_reprice_line() {
        let db = test_db().await;
        let fx = seed_sale_fixture(&db).await;

        db.products()
            .update(
                &fx.cuaderno.id,
                &akari_core::ProductUpdate {
                    price_sell_cents: Some(99_999),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let total: i64 = db
            .cart_lines()
            .pending_lines(&fx.user.id)
            .await
            .unwrap()
            .iter()
            .map(|l| l.total_amount_cents)
            .sum();
        assert_eq!(total, 15000);
    }

    #[tokio::test]
    async fn test_update_pending_quantity() {
        let db = test_db().await;
        let fx = seed_sale_fixture(&db).await;
        let line = fx.lines[1].clone();

        let updated = db.cart().update_pending_quantity(&line.id, 4).await.unwrap();
        assert_eq!(updated.quantity, 4);
        assert_eq!(updated.total_amount_cents, line.unit_price_cents * 4);

        db.checkout(CheckoutPolicy::default())
            .checkout(&CheckoutRequest::new(&fx.user.id, &fx.client.id))
            .await
            .unwrap();

        let err = db.cart().update_pending_quantity(&line.id, 1).await.unwrap_err();
        assert!(matches!(
            err,
            PosError::Core(CoreError::InvalidLineStatus {
                status: CartLineStatus::Completed,
                ..
            })
        ));

        let ghost = Uuid::new_v4().to_string();
        let err = db.cart().update_pending_quantity(&ghost, 1).await.unwrap_err();
        assert!(matches!(err, PosError::Core(CoreError::NotFound { .. })));
    }
}
