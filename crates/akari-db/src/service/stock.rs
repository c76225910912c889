//! # Stock Service
//!
//! Atomic stock adjustment.
//!
//! ```text
//! adjust_stock(product, delta)
//!      │
//!      ▼
//! conditional UPDATE … RETURNING quantity
//!      │
//!      ├── row      → Ok(new quantity)
//!      └── no row   → product exists?
//!                       ├── no           → NotFound
//!                       ├── delta > 0    → Validation (quantity past i64::MAX)
//!                       └── delta <= 0   → InsufficientStock { available, requested }
//! ```
//!
//! Stock is never clamped: an adjustment either applies in full or not at
//! all.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, instrument, warn};

use crate::error::{PosError, PosResult};
use crate::repository::product::ProductRepository;
use akari_core::validation::validate_uuid;
use akari_core::{CoreError, ValidationError};

#[derive(Debug, Clone)]
pub struct StockService {
    pool: SqlitePool,
}

impl StockService {
    pub fn new(pool: SqlitePool) -> Self {
        StockService { pool }
    }

    /// Adds `delta` (negative to remove) to the product's stock and returns
    /// the new quantity.
    ///
    /// ## Errors
    /// - `Validation` if `product_id` is not a UUID, or the result would not
    ///   fit in an `i64`
    /// - `NotFound` if the product does not exist
    /// - `InsufficientStock` if the result would be negative; stock unchanged
    #[instrument(skip(self))]
    pub async fn adjust_stock(&self, product_id: &str, delta: i64) -> PosResult<i64> {
        validate_uuid("product_id", product_id)?;

        let mut tx = self.pool.begin().await?;
        let quantity = adjust_in(&mut tx, product_id, delta, Utc::now()).await?;
        tx.commit().await?;

        info!(product_id = %product_id, delta, quantity, "Stock adjusted");
        Ok(quantity)
    }
}

/// Applies a stock adjustment on the caller's connection.
///
/// Checkout calls this inside its own transaction so a shortage on any
/// line undoes every earlier decrement.
pub(crate) async fn adjust_in(
    conn: &mut SqliteConnection,
    product_id: &str,
    delta: i64,
    now: DateTime<Utc>,
) -> PosResult<i64> {
    if let Some(quantity) = ProductRepository::update_stock_in(conn, product_id, delta, now).await? {
        return Ok(quantity);
    }

    // The update matched nothing: tell a missing product from a shortage.
    let product = ProductRepository::get_in(conn, product_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Product", product_id))?;

    warn!(
        product_id = %product_id,
        available = product.quantity,
        delta,
        "Stock adjustment rejected"
    );

    if delta > 0 {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0,
            max: i64::MAX,
        }
        .into());
    }

    Err(PosError::Core(CoreError::InsufficientStock {
        product_id: product_id.to_string(),
        available: product.quantity,
        // i64::MIN has no positive counterpart
        requested: delta.saturating_neg(),
    }))
}

#[cfg(test)]
mod tests {
    use crate::error::PosError;
    use crate::test_support::{new_product, test_db};
    use akari_core::{CoreError, ValidationError};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_adjust_up_and_down() {
        let db = test_db().await;
        let product = db.products().create(&new_product("Tinta", 1200, 10)).await.unwrap();

        assert_eq!(db.stock().adjust_stock(&product.id, -4).await.unwrap(), 6);
        assert_eq!(db.stock().adjust_stock(&product.id, 5).await.unwrap(), 11);
        assert_eq!(db.stock().adjust_stock(&product.id, -11).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_insufficient_stock_leaves_quantity() {
        let db = test_db().await;
        let product = db.products().create(&new_product("Tinta", 1200, 3)).await.unwrap();

        let err = db.stock().adjust_stock(&product.id, -5).await.unwrap_err();
        match err {
            PosError::Core(CoreError::InsufficientStock {
                available,
                requested,
                ..
            }) => {
                assert_eq!(available, 3);
                assert_eq!(requested, 5);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let after = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(after.quantity, 3);
    }

    #[tokio::test]
    async fn test_extreme_deltas_are_errors_not_panics() {
        let db = test_db().await;
        let product = db.products().create(&new_product("Tinta", 1200, 3)).await.unwrap();

        let err = db.stock().adjust_stock(&product.id, i64::MIN).await.unwrap_err();
        assert!(matches!(
            err,
            PosError::Core(CoreError::InsufficientStock {
                available: 3,
                requested: i64::MAX,
                ..
            })
        ));

        let err = db.stock().adjust_stock(&product.id, i64::MAX).await.unwrap_err();
        assert!(matches!(
            err,
            PosError::Core(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));

        let after = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(after.quantity, 3);

        // Topping up to exactly i64::MAX is still allowed.
        assert_eq!(
            db.stock().adjust_stock(&product.id, i64::MAX - 3).await.unwrap(),
            i64::MAX
        );
    }

    #[tokio::test]
    async fn test_missing_product() {
        let db = test_db().await;
        let ghost = Uuid::new_v4().to_string();
        let err = db.stock().adjust_stock(&ghost, 1).await.unwrap_err();
        assert!(matches!(err, PosError::Core(CoreError::NotFound { .. })));

        let err = db.stock().adjust_stock("missing", 1).await.unwrap_err();
        assert!(matches!(err, PosError::Core(CoreError::Validation(_))));
    }
}
