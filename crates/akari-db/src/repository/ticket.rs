//! # Ticket Repository
//!
//! Read access to finalized tickets. Tickets are only inserted by the
//! checkout service and are never updated except for the `updated_at`
//! audit stamp.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult, PosResult};
use crate::repository::cart::CartLineRepository;
use crate::repository::directory::{ClientRepository, UserRepository};
use akari_core::validation::validate_uuid;
use akari_core::{Ticket, TicketDetail};

#[derive(Debug, Clone)]
pub struct TicketRepository {
    pool: SqlitePool,
}

impl TicketRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TicketRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Ticket>> {
        let mut conn = self.pool.acquire().await?;
        Self::get_in(&mut conn, id).await
    }

    /// Tickets newest first.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<Ticket>> {
        let tickets = sqlx::query_as::<_, Ticket>(
            "SELECT * FROM tickets ORDER BY created_at DESC, id LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(tickets)
    }

    /// A ticket with its client name, cashier username, and consumed lines.
    ///
    /// ## Errors
    /// - `Validation` when `id` is not a UUID
    /// - `NotFound` when the ticket does not exist
    pub async fn detail(&self, id: &str) -> PosResult<TicketDetail> {
        validate_uuid("ticket_id", id)?;

        let mut conn = self.pool.acquire().await?;

        let ticket = Self::get_in(&mut conn, id)
            .await?
            .ok_or_else(|| DbError::not_found("Ticket", id))?;

        let client_name = ClientRepository::name_in(&mut conn, &ticket.client_id)
            .await?
            .ok_or_else(|| DbError::not_found("Client", &ticket.client_id))?;

        let user_name = UserRepository::username_in(&mut conn, &ticket.user_id)
            .await?
            .ok_or_else(|| DbError::not_found("User", &ticket.user_id))?;

        let lines = CartLineRepository::for_ticket_in(&mut conn, id).await?;

        debug!(ticket_id = %id, lines = lines.len(), "Loaded ticket detail");
        Ok(TicketDetail {
            ticket,
            client_name,
            user_name,
            lines,
        })
    }

    /// Stamps `updated_at`. Prices and lines are left as they are.
    pub async fn touch(&self, id: &str) -> DbResult<Ticket> {
        let ticket = sqlx::query_as::<_, Ticket>(
            "UPDATE tickets SET updated_at = ?2 WHERE id = ?1 RETURNING *",
        )
        .bind(id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Ticket", id))?;

        Ok(ticket)
    }

    // -------------------------------------------------------------------------
    // Connection-level operations
    // -------------------------------------------------------------------------

    pub(crate) async fn get_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Ticket>> {
        let ticket = sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE id = ?1")
            .bind(id)
            .fetch_optional(conn)
            .await?;

        Ok(ticket)
    }

    pub(crate) async fn insert_in(conn: &mut SqliteConnection, ticket: &Ticket) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO tickets (
                id, client_id, user_id, issue_details,
                prev_price_cents, final_price_cents, promo_code_id,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&ticket.id)
        .bind(&ticket.client_id)
        .bind(&ticket.user_id)
        .bind(&ticket.issue_details)
        .bind(ticket.prev_price_cents)
        .bind(ticket.final_price_cents)
        .bind(&ticket.promo_code_id)
        .bind(ticket.created_at)
        .bind(ticket.updated_at)
        .execute(conn)
        .await?;

        Ok(())
    }
}
