//! # Directory Repositories
//!
//! Users (cashiers and admins) and clients (ticket recipients).
//!
//! Authentication and password handling live outside this crate; a user
//! row here is only an identity that cart lines and tickets point at.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult, PosResult};
use akari_core::validation::validate_name;
use akari_core::{Client, NewUser, User, UserUpdate};

// =============================================================================
// Users
// =============================================================================

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Registers a user.
    ///
    /// ## Errors
    /// - `Validation` for a malformed username
    /// - `UniqueViolation` when the username is taken
    pub async fn register(&self, input: &NewUser) -> PosResult<User> {
        input.validate()?;

        let user = User {
            id: Uuid::new_v4().to_string(),
            username: input.username.trim().to_string(),
            phone: input.phone.clone(),
            user_type: input.user_type,
            created_at: Utc::now(),
            updated_at: None,
        };

        sqlx::query(
            r#"
            INSERT INTO users (id, username, phone, user_type, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, NULL)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.phone)
        .bind(user.user_type)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| username_taken(e, &user.username))?;

        info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn list(&self) -> DbResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY username")
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    /// Applies a partial update and stamps `updated_at`.
    pub async fn update(&self, id: &str, update: &UserUpdate) -> PosResult<User> {
        update.validate()?;

        let username = update.username.as_deref().map(str::trim);
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                username = COALESCE(?2, username),
                phone = COALESCE(?3, phone),
                user_type = COALESCE(?4, user_type),
                updated_at = ?5
            WHERE id = ?1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(username)
        .bind(&update.phone)
        .bind(update.user_type)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| username_taken(e, username.unwrap_or_default()))?
        .ok_or_else(|| DbError::not_found("User", id))?;

        info!(user_id = %id, "User updated");
        Ok(user)
    }

    /// Deletes a user with no cart history.
    ///
    /// Users referenced by cart lines or tickets fail with
    /// `ForeignKeyViolation`.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        info!(user_id = %id, "User deleted");
        Ok(())
    }

    pub(crate) async fn exists_in(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(conn)
            .await?;

        Ok(found.is_some())
    }

    pub(crate) async fn username_in(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<String>> {
        let username = sqlx::query_scalar("SELECT username FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(conn)
            .await?;

        Ok(username)
    }
}

fn username_taken(err: sqlx::Error, username: &str) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { .. } => DbError::duplicate("username", username),
        other => other,
    }
}

// =============================================================================
// Clients
// =============================================================================

#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ClientRepository { pool }
    }

    pub async fn create(
        &self,
        name: &str,
        address: Option<&str>,
        contact_info: Option<&str>,
    ) -> PosResult<Client> {
        validate_name("name", name)?;

        let client = Client {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            address: address.map(str::to_string),
            contact_info: contact_info.map(str::to_string),
        };

        sqlx::query("INSERT INTO clients (id, name, address, contact_info) VALUES (?1, ?2, ?3, ?4)")
            .bind(&client.id)
            .bind(&client.name)
            .bind(&client.address)
            .bind(&client.contact_info)
            .execute(&self.pool)
            .await?;

        debug!(client_id = %client.id, "Client created");
        Ok(client)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Client>> {
        let client = sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(client)
    }

    pub async fn list(&self) -> DbResult<Vec<Client>> {
        let clients = sqlx::query_as::<_, Client>("SELECT * FROM clients ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(clients)
    }

    pub(crate) async fn name_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<String>> {
        let name = sqlx::query_scalar("SELECT name FROM clients WHERE id = ?1")
            .bind(id)
            .fetch_optional(conn)
            .await?;

        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::{DbError, PosError};
    use crate::test_support::{new_user, test_db};
    use akari_core::{CoreError, UserType, UserUpdate};

    #[tokio::test]
    async fn test_register_and_get() {
        let db = test_db().await;
        let user = db.users().register(&new_user("ana")).await.unwrap();

        let found = db.users().get_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(found.username, "ana");
        assert_eq!(found.user_type, UserType::Vendedor);
        assert!(found.updated_at.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let db = test_db().await;
        db.users().register(&new_user("ana")).await.unwrap();

        let err = db.users().register(&new_user("ana")).await.unwrap_err();
        match err {
            PosError::Db(DbError::UniqueViolation { field, value }) => {
                assert_eq!(field, "username");
                assert_eq!(value, "ana");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_partial_update() {
        let db = test_db().await;
        let user = db.users().register(&new_user("ana")).await.unwrap();

        let updated = db
            .users()
            .update(
                &user.id,
                &UserUpdate {
                    user_type: Some(UserType::Admin),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.username, "ana");
        assert_eq!(updated.user_type, UserType::Admin);
        assert!(updated.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_delete_user() {
        let db = test_db().await;
        let user = db.users().register(&new_user("ana")).await.unwrap();

        db.users().delete(&user.id).await.unwrap();
        assert!(db.users().list().await.unwrap().is_empty());

        let err: PosError = db.users().delete(&user.id).await.unwrap_err().into();
        assert!(matches!(err, PosError::Core(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_clients() {
        let db = test_db().await;
        let client = db
            .clients()
            .create("Papelería Luna", None, Some("555-0101"))
            .await
            .unwrap();

        assert_eq!(db.clients().list().await.unwrap(), vec![client.clone()]);
        assert_eq!(db.clients().get_by_id(&client.id).await.unwrap(), Some(client));
    }
}
