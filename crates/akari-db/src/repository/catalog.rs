//! # Catalog Repositories
//!
//! Categories, providers, and the product ↔ category links.
//!
//! ```text
//! products ◄──┬── product_categories ──┬──► categories
//!             │   (product_id,         │
//!             │    category_id) PK     │
//!             ▼
//!         providers (optional)
//! ```

use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult, PosResult};
use akari_core::validation::validate_name;
use akari_core::{Category, Provider};

// =============================================================================
// Categories
// =============================================================================

#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    pub async fn create(&self, name: &str, image_url: Option<&str>) -> PosResult<Category> {
        validate_name("name", name)?;

        let category = Category {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            image_url: image_url.map(str::to_string),
        };

        sqlx::query("INSERT INTO categories (id, name, image_url) VALUES (?1, ?2, ?3)")
            .bind(&category.id)
            .bind(&category.name)
            .bind(&category.image_url)
            .execute(&self.pool)
            .await?;

        info!(category_id = %category.id, name = %category.name, "Category created");
        Ok(category)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(category)
    }

    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(categories)
    }

    /// Puts a product in a category. Linking twice is a no-op.
    ///
    /// ## Errors
    /// `NotFound` when either side does not exist.
    pub async fn link_product(&self, product_id: &str, category_id: &str) -> PosResult<()> {
        let mut tx = self.pool.begin().await?;

        let product: Option<i64> = sqlx::query_scalar("SELECT 1 FROM products WHERE id = ?1")
            .bind(product_id)
            .fetch_optional(&mut *tx)
            .await?;
        if product.is_none() {
            return Err(DbError::not_found("Product", product_id).into());
        }

        let category: Option<i64> = sqlx::query_scalar("SELECT 1 FROM categories WHERE id = ?1")
            .bind(category_id)
            .fetch_optional(&mut *tx)
            .await?;
        if category.is_none() {
            return Err(DbError::not_found("Category", category_id).into());
        }

        sqlx::query(
            "INSERT OR IGNORE INTO product_categories (product_id, category_id) VALUES (?1, ?2)",
        )
        .bind(product_id)
        .bind(category_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(product_id = %product_id, category_id = %category_id, "Product linked to category");
        Ok(())
    }

    /// Categories a product belongs to.
    pub async fn for_product(&self, product_id: &str) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT c.*
            FROM categories c
            INNER JOIN product_categories pc ON pc.category_id = c.id
            WHERE pc.product_id = ?1
            ORDER BY c.name
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }
}

// =============================================================================
// Providers
// =============================================================================

#[derive(Debug, Clone)]
pub struct ProviderRepository {
    pool: SqlitePool,
}

impl ProviderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProviderRepository { pool }
    }

    pub async fn create(
        &self,
        name: &str,
        address: Option<&str>,
        contact_info: Option<&str>,
    ) -> PosResult<Provider> {
        validate_name("name", name)?;

        let provider = Provider {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            address: address.map(str::to_string),
            contact_info: contact_info.map(str::to_string),
        };

        sqlx::query("INSERT INTO providers (id, name, address, contact_info) VALUES (?1, ?2, ?3, ?4)")
            .bind(&provider.id)
            .bind(&provider.name)
            .bind(&provider.address)
            .bind(&provider.contact_info)
            .execute(&self.pool)
            .await?;

        info!(provider_id = %provider.id, "Provider created");
        Ok(provider)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Provider>> {
        let provider = sqlx::query_as::<_, Provider>("SELECT * FROM providers WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(provider)
    }

    pub async fn list(&self) -> DbResult<Vec<Provider>> {
        let providers = sqlx::query_as::<_, Provider>("SELECT * FROM providers ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(providers)
    }
}
