//! # Database Error Types
//!
//! Error types for database operations and for the services built on them.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError ← categorized: unique, foreign key, check, busy, ...          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PosError ← what services return                                       │
//! │  ├── Core(CoreError)   NotFound, EmptyCart, TransactionConflict (BUSY) │
//! │  └── Db(DbError)       everything storage-specific                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CliError { code, message } ← printed by the akari binary              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use akari_core::{CoreError, ValidationError};
use serde::Serialize;
use thiserror::Error;

// =============================================================================
// DbError
// =============================================================================

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Duplicate SKU
    /// - Duplicate username
    /// - Duplicate promo code text
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Deleting a product that cart lines still reference
    /// - Inserting a row that points at a missing parent
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// CHECK constraint violation (negative stock, bad status pairing).
    #[error("Check constraint violation: {message}")]
    CheckViolation { message: String },

    /// Another connection holds the write lock, or our read snapshot is
    /// stale (SQLITE_BUSY / SQLITE_LOCKED).
    #[error("Database busy: {0}")]
    Busy(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Primary SQLite result codes for "someone else is writing".
const SQLITE_BUSY: i64 = 5;
const SQLITE_LOCKED: i64 = 6;

fn is_busy(db_err: &dyn sqlx::error::DatabaseError) -> bool {
    let by_code = db_err
        .code()
        .and_then(|code| code.parse::<i64>().ok())
        .map(|code| matches!(code & 0xff, SQLITE_BUSY | SQLITE_LOCKED))
        .unwrap_or(false);
    by_code || db_err.message().contains("database is locked")
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → code / message decide the constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // "UNIQUE constraint failed: <table>.<column>"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("CHECK constraint failed") {
                    DbError::CheckViolation {
                        message: msg.to_string(),
                    }
                } else if is_busy(db_err.as_ref()) {
                    DbError::Busy(msg.to_string())
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// PosError
// =============================================================================

/// Error returned by the services: either a business rule said no, or
/// storage failed.
#[derive(Debug, Error)]
pub enum PosError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(DbError),
}

/// Stable, machine-readable error codes.
///
/// ```json
/// { "code": "INSUFFICIENT_STOCK", "message": "Insufficient stock for product ..." }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    ValidationError,
    InvalidPromoCode,
    InsufficientStock,
    /// Retryable.
    TransactionConflict,
    EmptyCart,
    InvalidLineStatus,
    /// Unique or foreign key constraint.
    Conflict,
    DatabaseError,
}

impl PosError {
    /// Returns the stable error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            PosError::Core(err) => match err {
                CoreError::NotFound { .. } => ErrorCode::NotFound,
                CoreError::InvalidPromoCode { .. } => ErrorCode::InvalidPromoCode,
                CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
                CoreError::TransactionConflict { .. } => ErrorCode::TransactionConflict,
                CoreError::EmptyCart { .. } => ErrorCode::EmptyCart,
                CoreError::InvalidLineStatus { .. } => ErrorCode::InvalidLineStatus,
                CoreError::Validation(_) => ErrorCode::ValidationError,
            },
            PosError::Db(err) => match err {
                DbError::NotFound { .. } => ErrorCode::NotFound,
                DbError::UniqueViolation { .. } | DbError::ForeignKeyViolation { .. } => {
                    ErrorCode::Conflict
                }
                DbError::CheckViolation { .. } => ErrorCode::ValidationError,
                DbError::Busy(_) => ErrorCode::TransactionConflict,
                _ => ErrorCode::DatabaseError,
            },
        }
    }

    /// True only for transaction conflicts: the operation rolled back and
    /// may succeed if run again.
    pub fn is_retryable(&self) -> bool {
        match self {
            PosError::Core(err) => err.is_retryable(),
            PosError::Db(DbError::Busy(_)) => true,
            PosError::Db(_) => false,
        }
    }
}

/// Lifts storage failures that have a domain meaning into `CoreError`.
///
/// ```text
/// DbError::NotFound → CoreError::NotFound
/// DbError::Busy     → CoreError::TransactionConflict
/// anything else     → PosError::Db
/// ```
impl From<DbError> for PosError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => PosError::Core(CoreError::NotFound { entity, id }),
            DbError::Busy(reason) => PosError::Core(CoreError::TransactionConflict { reason }),
            other => PosError::Db(other),
        }
    }
}

impl From<sqlx::Error> for PosError {
    fn from(err: sqlx::Error) -> Self {
        DbError::from(err).into()
    }
}

impl From<ValidationError> for PosError {
    fn from(err: ValidationError) -> Self {
        PosError::Core(CoreError::Validation(err))
    }
}

/// Result type for service operations.
pub type PosResult<T> = Result<T, PosError>;
