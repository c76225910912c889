//! # Stock Alert Repository
//!
//! Per-product low-stock thresholds and the report built on them.
//!
//! A product shows up in [`StockAlertRepository::low_stock`] when any of its
//! alerts has `quantity <= min_stock`.

use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::error::{DbError, DbResult, PosResult};
use akari_core::validation::validate_stock_level;
use akari_core::{LowStockProduct, StockAlert};

#[derive(Debug, Clone)]
pub struct StockAlertRepository {
    pool: SqlitePool,
}

impl StockAlertRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StockAlertRepository { pool }
    }

    /// Adds a threshold for `product_id`.
    pub async fn create(&self, product_id: &str, min_stock: i64) -> PosResult<StockAlert> {
        validate_stock_level("min_stock", min_stock)?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM products WHERE id = ?1")
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Err(DbError::not_found("Product", product_id).into());
        }

        let alert = StockAlert {
            id: Uuid::new_v4().to_string(),
            product_id: product_id.to_string(),
            min_stock,
        };

        sqlx::query("INSERT INTO stock_alerts (id, product_id, min_stock) VALUES (?1, ?2, ?3)")
            .bind(&alert.id)
            .bind(&alert.product_id)
            .bind(alert.min_stock)
            .execute(&self.pool)
            .await?;

        info!(alert_id = %alert.id, product_id = %product_id, min_stock, "Stock alert created");
        Ok(alert)
    }

    pub async fn list(&self) -> DbResult<Vec<StockAlert>> {
        let alerts = sqlx::query_as::<_, StockAlert>(
            "SELECT * FROM stock_alerts ORDER BY product_id, min_stock",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(alerts)
    }

    pub async fn update(&self, id: &str, min_stock: i64) -> PosResult<StockAlert> {
        validate_stock_level("min_stock", min_stock)?;

        let alert = sqlx::query_as::<_, StockAlert>(
            "UPDATE stock_alerts SET min_stock = ?2 WHERE id = ?1 RETURNING *",
        )
        .bind(id)
        .bind(min_stock)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("StockAlert", id))?;

        Ok(alert)
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM stock_alerts WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("StockAlert", id));
        }

        Ok(())
    }

    /// Products at or below one of their thresholds, emptiest first.
    pub async fn low_stock(&self) -> DbResult<Vec<LowStockProduct>> {
        let rows = sqlx::query_as::<_, LowStockProduct>(
            r#"
            SELECT
                p.id AS product_id,
                p.name,
                p.quantity,
                MAX(a.min_stock) AS min_stock
            FROM stock_alerts a
            INNER JOIN products p ON p.id = a.product_id
            WHERE p.quantity <= a.min_stock
            GROUP BY p.id, p.name, p.quantity
            ORDER BY p.quantity, p.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::PosError;
    use crate::test_support::{new_product, test_db};
    use akari_core::CoreError;

    #[tokio::test]
    async fn test_low_stock_report() {
        let db = test_db().await;
        let scarce = db.products().create(&new_product("Tinta", 1200, 2)).await.unwrap();
        let plenty = db.products().create(&new_product("Papel", 300, 50)).await.unwrap();

        db.stock_alerts().create(&scarce.id, 5).await.unwrap();
        db.stock_alerts().create(&plenty.id, 10).await.unwrap();

        let low = db.stock_alerts().low_stock().await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].product_id, scarce.id);
        assert_eq!(low[0].quantity, 2);
        assert_eq!(low[0].min_stock, 5);
    }

    #[tokio::test]
    async fn test_threshold_is_inclusive() {
        let db = test_db().await;
        let product = db.products().create(&new_product("Tinta", 1200, 5)).await.unwrap();
        let alert = db.stock_alerts().create(&product.id, 4).await.unwrap();
        assert!(db.stock_alerts().low_stock().await.unwrap().is_empty());

        db.stock_alerts().update(&alert.id, 5).await.unwrap();
        assert_eq!(db.stock_alerts().low_stock().await.unwrap().len(), 1);

        db.stock_alerts().delete(&alert.id).await.unwrap();
        assert!(db.stock_alerts().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_alert_requires_product() {
        let db = test_db().await;
        let err = db.stock_alerts().create("missing", 3).await.unwrap_err();
        assert!(matches!(err, PosError::Core(CoreError::NotFound { .. })));

        let product = db.products().create(&new_product("Tinta", 1200, 5)).await.unwrap();
        let err = db.stock_alerts().create(&product.id, -1).await.unwrap_err();
        assert!(matches!(err, PosError::Core(CoreError::Validation(_))));
    }
}
