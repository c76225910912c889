//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - CRUD with validation
//! - Listing, optionally filtered by category
//! - The conditional stock update used by stock adjustment and checkout
//!
//! ## Conditional Stock Update
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UPDATE products                                                        │
//! │     SET quantity = quantity + :delta                                    │
//! │   WHERE id = :id AND quantity + :delta >= 0                             │
//! │  RETURNING quantity                                                     │
//! │                                                                         │
//! │  stock 10, delta -3  → row returned, quantity 7                         │
//! │  stock  3, delta -5  → no row, stock untouched                          │
//! │                                                                         │
//! │  One statement: the check and the write cannot interleave with         │
//! │  another connection's update.                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult, PosResult};
use akari_core::{NewProduct, Product, ProductUpdate};

/// Repository for product database operations.
///
/// ```rust,ignore
/// let repo = db.products();
/// let product = repo.create(&NewProduct { name: "Cuaderno".into(), ..Default::default() }).await?;
/// let found = repo.get_by_id(&product.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Validates and inserts a new product.
    pub async fn create(&self, input: &NewProduct) -> PosResult<Product> {
        input.validate()?;

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            sku: input.sku.as_ref().map(|s| s.trim().to_string()),
            color: input.color.clone(),
            quantity: input.quantity,
            price_sell_cents: input.price_sell_cents,
            price_buy_cents: input.price_buy_cents,
            provider_id: input.provider_id.clone(),
            image_url: input.image_url.clone(),
            created_at: now,
            updated_at: now,
        };

        debug!(sku = ?product.sku, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, sku, color, quantity,
                price_sell_cents, price_buy_cents, provider_id, image_url,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.sku)
        .bind(&product.color)
        .bind(product.quantity)
        .bind(product.price_sell_cents)
        .bind(product.price_buy_cents)
        .bind(&product.provider_id)
        .bind(&product.image_url)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        Self::get_in(&mut conn, id).await
    }

    /// Gets a product by its SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE sku = ?1")
            .bind(sku.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Lists products by name, optionally only those in `category_id`.
    pub async fn list(&self, category_id: Option<&str>) -> DbResult<Vec<Product>> {
        let products = match category_id {
            Some(category_id) => {
                sqlx::query_as::<_, Product>(
                    r#"
                    SELECT p.*
                    FROM products p
                    INNER JOIN product_categories pc ON pc.product_id = p.id
                    WHERE pc.category_id = ?1
                    ORDER BY p.name
                    "#,
                )
                .bind(category_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY name")
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        debug!(count = products.len(), category_id = ?category_id, "Listed products");
        Ok(products)
    }

    /// Applies a partial update. Stock is not touched here.
    pub async fn update(&self, id: &str, update: &ProductUpdate) -> PosResult<Product> {
        update.validate()?;

        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET
                name = COALESCE(?2, name),
                sku = COALESCE(?3, sku),
                color = COALESCE(?4, color),
                price_sell_cents = COALESCE(?5, price_sell_cents),
                price_buy_cents = COALESCE(?6, price_buy_cents),
                provider_id = COALESCE(?7, provider_id),
                image_url = COALESCE(?8, image_url),
                updated_at = ?9
            WHERE id = ?1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.name.as_deref().map(str::trim))
        .bind(update.sku.as_deref().map(str::trim))
        .bind(&update.color)
        .bind(update.price_sell_cents)
        .bind(update.price_buy_cents)
        .bind(&update.provider_id)
        .bind(&update.image_url)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Product", id))?;

        info!(product_id = %id, "Product updated");
        Ok(product)
    }

    /// Deletes a product and its category links.
    ///
    /// Products that appear on any cart line are kept: the delete fails with
    /// `ForeignKeyViolation` and the links are restored by the rollback.
    pub async fn delete(&self, id: &str) -> PosResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM product_categories WHERE product_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id).into());
        }

        tx.commit().await?;
        info!(product_id = %id, "Product deleted");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Connection-level operations (used inside service transactions)
    // -------------------------------------------------------------------------

    pub(crate) async fn get_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(conn)
            .await?;

        Ok(product)
    }

    /// Adds `delta` to the stock unless the result would be negative or
    /// past `i64::MAX`.
    ///
    /// ## Returns
    /// * `Ok(Some(quantity))` - new stock level
    /// * `Ok(None)` - product missing or stock out of range; nothing changed
    pub(crate) async fn update_stock_in(
        conn: &mut SqliteConnection,
        id: &str,
        delta: i64,
        now: DateTime<Utc>,
    ) -> DbResult<Option<i64>> {
        // SQLite turns an overflowing integer sum into a REAL, so the upper
        // bound is checked as `quantity <= MAX - delta`.
        let quantity: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET quantity = quantity + ?2, updated_at = ?3
            WHERE id = ?1
              AND CASE WHEN ?2 >= 0 THEN quantity <= ?4 - ?2 ELSE quantity + ?2 >= 0 END
            RETURNING quantity
            "#,
        )
        .bind(id)
        .bind(delta)
        .bind(now)
        .bind(i64::MAX)
        .fetch_optional(conn)
        .await?;

        Ok(quantity)
    }
}
