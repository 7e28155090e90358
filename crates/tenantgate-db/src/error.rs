//! Database-specific error types and conversions.
//!
//! Retry eligibility is decided here from structured driver data
//! (error kind and SQLSTATE / SQLite result codes), never from message
//! text.

use tenantgate_core::error::{GateError, Transience};

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Corrupt record: {0}")]
    Decode(String),
}

impl DbError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn transience(&self) -> Transience {
        match self {
            DbError::Sqlx(err) => classify(err),
            _ => Transience::Permanent,
        }
    }
}

// SQLite primary result codes (extended codes share the low byte).
const SQLITE_BUSY: i64 = 5;
const SQLITE_LOCKED: i64 = 6;

// PostgreSQL SQLSTATE codes, should the adapter be pointed at Postgres.
const PG_SERIALIZATION_FAILURE: &str = "40001";
const PG_DEADLOCK_DETECTED: &str = "40P01";

fn classify(err: &sqlx::Error) -> Transience {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => Transience::Transient,
        sqlx::Error::Database(db) => match db.code().as_deref() {
            Some(PG_SERIALIZATION_FAILURE | PG_DEADLOCK_DETECTED) => Transience::Transient,
            Some(code) => match code.parse::<i64>() {
                Ok(n) if matches!(n & 0xff, SQLITE_BUSY | SQLITE_LOCKED) => Transience::Transient,
                _ => Transience::Permanent,
            },
            None => Transience::Permanent,
        },
        _ => Transience::Permanent,
    }
}

impl From<DbError> for GateError {
    fn from(err: DbError) -> Self {
        let transience = err.transience();
        match err {
            DbError::NotFound { entity, id } => GateError::NotFound { entity, id },
            DbError::Sqlx(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                GateError::AlreadyExists {
                    entity: "record".into(),
                    key: db.message().to_string(),
                }
            }
            other => GateError::Database {
                message: other.to_string(),
                transience,
            },
        }
    }
}
