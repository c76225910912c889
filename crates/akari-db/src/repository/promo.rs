//! # Promo Code Repository
//!
//! Storage for promotional codes. Whether a code can be applied is decided
//! by [`akari_core::promo::validate_promo`], not here.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;
use uuid::Uuid;

use crate::error::{DbError, DbResult, PosResult};
use akari_core::{NewPromoCode, PromoCode};

#[derive(Debug, Clone)]
pub struct PromoCodeRepository {
    pool: SqlitePool,
}

impl PromoCodeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PromoCodeRepository { pool }
    }

    /// Creates a code. The code text is unique.
    pub async fn create(&self, input: &NewPromoCode) -> PosResult<PromoCode> {
        input.validate()?;

        let promo = PromoCode {
            id: Uuid::new_v4().to_string(),
            code: input.code.trim().to_string(),
            discount_bps: input.discount_bps,
            expires_on: input.expires_on,
            is_active: input.is_active,
        };

        sqlx::query(
            r#"
            INSERT INTO promo_codes (id, code, discount_bps, expires_on, is_active)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&promo.id)
        .bind(&promo.code)
        .bind(promo.discount_bps)
        .bind(promo.expires_on)
        .bind(promo.is_active)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("code", &promo.code),
            other => other,
        })?;

        info!(
            promo_id = %promo.id,
            code = %promo.code,
            discount_bps = promo.discount_bps,
            "Promo code created"
        );
        Ok(promo)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<PromoCode>> {
        let mut conn = self.pool.acquire().await?;
        Self::get_in(&mut conn, id).await
    }

    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<PromoCode>> {
        let promo = sqlx::query_as::<_, PromoCode>("SELECT * FROM promo_codes WHERE code = ?1")
            .bind(code.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(promo)
    }

    pub async fn list(&self) -> DbResult<Vec<PromoCode>> {
        let promos = sqlx::query_as::<_, PromoCode>("SELECT * FROM promo_codes ORDER BY code")
            .fetch_all(&self.pool)
            .await?;

        Ok(promos)
    }

    /// Switches a code on or off.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<PromoCode> {
        let promo = sqlx::query_as::<_, PromoCode>(
            "UPDATE promo_codes SET is_active = ?2 WHERE id = ?1 RETURNING *",
        )
        .bind(id)
        .bind(active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("PromoCode", id))?;

        info!(promo_id = %id, active, "Promo code toggled");
        Ok(promo)
    }

    pub(crate) async fn get_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<PromoCode>> {
        let promo = sqlx::query_as::<_, PromoCode>("SELECT * FROM promo_codes WHERE id = ?1")
            .bind(id)
            .fetch_optional(conn)
            .await?;

        Ok(promo)
    }
}
