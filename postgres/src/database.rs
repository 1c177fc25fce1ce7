//! Connection pool and the repeatable-read unit of work.
//!
//! Every multi-statement write goes through [`Database::run_in_transaction`],
//! which hands the unit an explicit [`UnitOfWork`] handle — there is no
//! ambient, context-keyed transaction lookup. Single-statement reads use
//! the pool directly via [`Database::pool`].

use futures::future::BoxFuture;
use pickup_point_core::error::StoreError;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};

/// A transaction-scoped handle, valid for the duration of one unit of work.
pub struct UnitOfWork {
    tx: Transaction<'static, Postgres>,
}

impl UnitOfWork {
    /// The query-capable handle for statements inside this unit of work.
    pub fn executor(&mut self) -> &mut PgConnection {
        &mut self.tx
    }
}

/// The pooled `PostgreSQL` store.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect a new pool to the given database URL.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the pool cannot be established.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .connect(url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The pooled handle for single-statement reads outside a unit of work.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("migration failed: {e}")))
    }

    /// Execute `unit` under a repeatable-read, read-write transaction.
    ///
    /// The transaction commits when the unit returns `Ok` and rolls back
    /// when it returns `Err`. A rollback that itself fails is reported as
    /// the distinct, non-retryable [`StoreError::RollbackFailed`]; a clean
    /// rollback wraps the unit's error in [`StoreError::RolledBack`].
    ///
    /// # Errors
    ///
    /// - [`StoreError::SerializationConflict`] when begin or commit hits a
    ///   serialization failure (retryable by the caller)
    /// - [`StoreError::RolledBack`] / [`StoreError::RollbackFailed`] when
    ///   the unit fails
    /// - [`StoreError::Database`] for any other pool or protocol failure
    pub async fn run_in_transaction<T, F>(&self, unit: F) -> Result<T, StoreError>
    where
        T: Send,
        F: for<'u> FnOnce(&'u mut UnitOfWork) -> BoxFuture<'u, Result<T, StoreError>> + Send,
    {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        let mut uow = UnitOfWork { tx };
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(uow.executor())
            .await
            .map_err(map_sqlx_error)?;

        match unit(&mut uow).await {
            Ok(value) => {
                uow.tx.commit().await.map_err(map_sqlx_error)?;
                Ok(value)
            }
            Err(source) => match uow.tx.rollback().await {
                Ok(()) => Err(StoreError::RolledBack {
                    source: Box::new(source),
                }),
                Err(rollback) => {
                    tracing::error!(%rollback, "rollback failed after unit of work error");
                    Err(StoreError::RollbackFailed {
                        source: Box::new(source),
                        rollback: rollback.to_string(),
                    })
                }
            },
        }
    }
}

/// SQLSTATE for a repeatable-read serialization failure.
const SERIALIZATION_FAILURE: &str = "40001";

/// Translate driver errors into the store taxonomy.
///
/// Units of work built outside this crate use this to map statement
/// failures before handing them back to [`Database::run_in_transaction`].
#[must_use]
pub fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::Database(db) if db.code().as_deref() == Some(SERIALIZATION_FAILURE) => {
            StoreError::SerializationConflict(db.message().to_string())
        }
        _ => StoreError::Database(err.to_string()),
    }
}
