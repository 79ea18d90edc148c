//! PostgreSQL persistence for the sign-off service.
//!
//! - [`models`] -- `FromRow` entity structs and create DTOs.
//! - [`repositories`] -- zero-sized repos with async query methods.
//!
//! Repository methods that issue a single statement are generic over
//! [`sqlx::PgExecutor`], so they run against the pool or inside a caller's
//! transaction alike.

use sqlx::postgres::PgPoolOptions;

pub mod models;
pub mod repositories;

pub type DbPool = sqlx::PgPool;

/// A PostgreSQL transaction borrowed from the pool.
pub type DbTransaction<'a> = sqlx::Transaction<'a, sqlx::Postgres>;

/// PostgreSQL SQLSTATE for `unique_violation`.
pub const SQLSTATE_UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL SQLSTATE for `serialization_failure`.
pub const SQLSTATE_SERIALIZATION_FAILURE: &str = "40001";

/// PostgreSQL SQLSTATE for `deadlock_detected`.
pub const SQLSTATE_DEADLOCK_DETECTED: &str = "40P01";

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to confirm the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply all pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}

/// Begin a transaction at `SERIALIZABLE` isolation.
///
/// The isolation level must be set before the first query of the
/// transaction, so callers must not run anything on the pool connection
/// between `begin` and this statement.
pub async fn begin_serializable(pool: &DbPool) -> Result<DbTransaction<'static>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
        .execute(&mut *tx)
        .await?;
    Ok(tx)
}

/// Whether `err` is a serialization failure or deadlock that the caller
/// should resolve by re-running the whole transaction.
pub fn is_serialization_failure(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => matches!(
            db_err.code().as_deref(),
            Some(SQLSTATE_SERIALIZATION_FAILURE) | Some(SQLSTATE_DEADLOCK_DETECTED)
        ),
        _ => false,
    }
}

/// Whether `err` is a unique violation of the named constraint.
pub fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some(SQLSTATE_UNIQUE_VIOLATION)
                && db_err.constraint() == Some(constraint)
        }
        _ => false,
    }
}
