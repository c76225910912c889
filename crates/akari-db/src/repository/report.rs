//! # Report Repository
//!
//! Read-only aggregates for the sales dashboard.
//!
//! ```text
//! ┌──────────────────────┬──────────────────────────────────────────────┐
//! │ total_sales()        │ Σ tickets.final_price_cents                  │
//! │ top_products(limit)  │ completed cart lines per product, desc       │
//! │ top_clients(limit)   │ tickets per client, desc                     │
//! └──────────────────────┴──────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;

use crate::error::DbResult;
use akari_core::{CartLineStatus, Money, TopClient, TopProduct};

/// Default number of rows in the top-N reports.
pub const DEFAULT_TOP_LIMIT: u32 = 10;

#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Sum of all ticket final prices.
    pub async fn total_sales(&self) -> DbResult<Money> {
        let cents: i64 =
            sqlx::query_scalar("SELECT COALESCE(SUM(final_price_cents), 0) FROM tickets")
                .fetch_one(&self.pool)
                .await?;

        Ok(Money::from_cents(cents))
    }

    /// Products ranked by how many completed cart lines they appear on.
    ///
    /// Pending lines are left out: a cart that is never checked out did not
    /// sell anything.
    pub async fn top_products(&self, limit: u32) -> DbResult<Vec<TopProduct>> {
        let rows = sqlx::query_as::<_, TopProduct>(
            r#"
            SELECT
                p.id AS product_id,
                p.name,
                COUNT(cl.id) AS times_sold
            FROM cart_lines cl
            INNER JOIN products p ON p.id = cl.product_id
            WHERE cl.order_status = ?1
            GROUP BY p.id, p.name
            ORDER BY times_sold DESC, p.name
            LIMIT ?2
            "#,
        )
        .bind(CartLineStatus::Completed)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Clients ranked by number of tickets.
    pub async fn top_clients(&self, limit: u32) -> DbResult<Vec<TopClient>> {
        let rows = sqlx::query_as::<_, TopClient>(
            r#"
            SELECT
                c.id AS client_id,
                c.name,
                COUNT(t.id) AS ticket_count
            FROM tickets t
            INNER JOIN clients c ON c.id = t.client_id
            GROUP BY c.id, c.name
            ORDER BY ticket_count DESC, c.name
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
