//! # Cart Line Repository
//!
//! Reads and low-level writes for the cart ledger. Anything that must be
//! atomic with other tables (adding a line, checkout) goes through the
//! services, which call the `*_in` functions on their own transaction.
//!
//! ## Line Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  add_to_cart ──► pendiente, ticket_id NULL                              │
//! │                     │                                                   │
//! │                     │ update_pending_quantity (total recomputed)        │
//! │                     ▼                                                   │
//! │  checkout ─────► completado, ticket_id = T     (one UPDATE, CAS)        │
//! │                                                                         │
//! │  Lines are never deleted.                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use akari_core::{CartLine, CartLineStatus};

#[derive(Debug, Clone)]
pub struct CartLineRepository {
    pool: SqlitePool,
}

impl CartLineRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CartLineRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<CartLine>> {
        let mut conn = self.pool.acquire().await?;
        Self::get_in(&mut conn, id).await
    }

    /// A user's pending lines, oldest first.
    pub async fn pending_lines(&self, user_id: &str) -> DbResult<Vec<CartLine>> {
        let mut conn = self.pool.acquire().await?;
        Self::pending_for_user_in(&mut conn, user_id).await
    }

    /// Every line in the ledger, newest first.
    pub async fn list_lines(&self) -> DbResult<Vec<CartLine>> {
        let lines = sqlx::query_as::<_, CartLine>(
            "SELECT * FROM cart_lines ORDER BY order_date DESC, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    pub async fn lines_for_ticket(&self, ticket_id: &str) -> DbResult<Vec<CartLine>> {
        let mut conn = self.pool.acquire().await?;
        Self::for_ticket_in(&mut conn, ticket_id).await
    }

    // -------------------------------------------------------------------------
    // Connection-level operations
    // -------------------------------------------------------------------------

    pub(crate) async fn get_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<CartLine>> {
        let line = sqlx::query_as::<_, CartLine>("SELECT * FROM cart_lines WHERE id = ?1")
            .bind(id)
            .fetch_optional(conn)
            .await?;

        Ok(line)
    }

    pub(crate) async fn pending_for_user_in(
        conn: &mut SqliteConnection,
        user_id: &str,
    ) -> DbResult<Vec<CartLine>> {
        let lines = sqlx::query_as::<_, CartLine>(
            r#"
            SELECT * FROM cart_lines
            WHERE user_id = ?1 AND order_status = ?2
            ORDER BY order_date, id
            "#,
        )
        .bind(user_id)
        .bind(CartLineStatus::Pending)
        .fetch_all(conn)
        .await?;

        Ok(lines)
    }

    pub(crate) async fn for_ticket_in(
        conn: &mut SqliteConnection,
        ticket_id: &str,
    ) -> DbResult<Vec<CartLine>> {
        let lines = sqlx::query_as::<_, CartLine>(
            "SELECT * FROM cart_lines WHERE ticket_id = ?1 ORDER BY order_date, id",
        )
        .bind(ticket_id)
        .fetch_all(conn)
        .await?;

        Ok(lines)
    }

    pub(crate) async fn insert_in(conn: &mut SqliteConnection, line: &CartLine) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO cart_lines (
                id, user_id, product_id, quantity,
                unit_price_cents, total_amount_cents, payment_method,
                order_status, ticket_id, order_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&line.id)
        .bind(&line.user_id)
        .bind(&line.product_id)
        .bind(line.quantity)
        .bind(line.unit_price_cents)
        .bind(line.total_amount_cents)
        .bind(line.payment_method)
        .bind(line.order_status)
        .bind(&line.ticket_id)
        .bind(line.order_date)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Sets a new quantity on a pending line and recomputes its total from
    /// the unit price snapshot. Returns `None` if the line is not pending.
    pub(crate) async fn update_pending_quantity_in(
        conn: &mut SqliteConnection,
        id: &str,
        quantity: i64,
    ) -> DbResult<Option<CartLine>> {
        let line = sqlx::query_as::<_, CartLine>(
            r#"
            UPDATE cart_lines
            SET quantity = ?2, total_amount_cents = unit_price_cents * ?2
            WHERE id = ?1 AND order_status = ?3
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(quantity)
        .bind(CartLineStatus::Pending)
        .fetch_optional(conn)
        .await?;

        Ok(line)
    }

    /// Compare-and-swap: marks the given lines completed and links them to
    /// `ticket_id`, but only those still pending.
    ///
    /// Returns the number of lines actually moved; the caller compares it
    /// with `ids.len()` to detect a concurrent checkout.
    pub(crate) async fn complete_in(
        conn: &mut SqliteConnection,
        ids: &[String],
        ticket_id: &str,
    ) -> DbResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut qb: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("UPDATE cart_lines SET order_status = ");
        qb.push_bind(CartLineStatus::Completed);
        qb.push(", ticket_id = ");
        qb.push_bind(ticket_id);
        qb.push(" WHERE order_status = ");
        qb.push_bind(CartLineStatus::Pending);
        qb.push(" AND id IN (");
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(id.as_str());
        }
        separated.push_unseparated(")");

        let result = qb.build().execute(conn).await?;

        debug!(
            expected = ids.len(),
            affected = result.rows_affected(),
            ticket_id = %ticket_id,
            "Completed cart lines"
        );
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_sale_fixture, test_db};

    #[tokio::test]
    async fn test_complete_in_only_moves_pending_lines() {
        let db = test_db().await;
        let fx = seed_sale_fixture(&db).await;

        let lines = db.cart_lines().pending_lines(&fx.user.id).await.unwrap();
        let ids: Vec<String> = lines.iter().map(|l| l.id.clone()).collect();
        assert_eq!(ids.len(), 2);

        let mut conn = db.pool().acquire().await.unwrap();
        sqlx::query(
            "INSERT INTO tickets (id, client_id, user_id, prev_price_cents, final_price_cents, created_at)
             VALUES ('t-1', ?1, ?2, 0, 0, '2024-01-01T00:00:00+00:00')",
        )
        .bind(&fx.client.id)
        .bind(&fx.user.id)
        .execute(&mut *conn)
        .await
        .unwrap();

        let moved = CartLineRepository::complete_in(&mut conn, &ids, "t-1")
            .await
            .unwrap();
        assert_eq!(moved, 2);

        // Second pass finds nothing still pending
        let moved_again = CartLineRepository::complete_in(&mut conn, &ids, "t-1")
            .await
            .unwrap();
        assert_eq!(moved_again, 0);
        drop(conn);

        assert!(db.cart_lines().pending_lines(&fx.user.id).await.unwrap().is_empty());
        let linked = db.cart_lines().lines_for_ticket("t-1").await.unwrap();
        assert_eq!(linked.len(), 2);
        assert!(linked
            .iter()
            .all(|l| l.order_status == CartLineStatus::Completed));
    }

    #[tokio::test]
    async fn test_ticket_id_requires_completed_status() {
        let db = test_db().await;
        let fx = seed_sale_fixture(&db).await;
        let line = db.cart_lines().pending_lines(&fx.user.id).await.unwrap()[0].clone();

        // Status and ticket link are only ever set together.
        let result = sqlx::query("UPDATE cart_lines SET order_status = 'completado' WHERE id = ?1")
            .bind(&line.id)
            .execute(db.pool())
            .await;
        assert!(result.is_err());
    }
}
