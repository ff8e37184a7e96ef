// SQLite Context - one transaction-scoped unit of work

use crate::bind::{bind_all, bind_all_as};
use crate::error::map_sqlx_error;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteQueryResult, SqliteRow};
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};
use std::any::Any;
use std::sync::Arc;
use strata_core::domain::{format_command, SqlValue};
use strata_core::error::{AppError, Result};
use strata_core::port::{SqlCommand, UnitOfWork};
use tokio::sync::Mutex;
use tracing::debug;

/// Sink receiving the fully formatted text of every logged command.
pub type SqlLogSink = Arc<dyn Fn(&str) + Send + Sync>;

/// One connection/transaction pair with an optional SQL log sink.
///
/// The transaction begins when the context is constructed and stays open
/// until `complete` (commit) or `abandon` (rollback). Dropping a context
/// that was never completed rolls the transaction back and releases the
/// connection. Repositories borrow the context, so the borrow checker keeps
/// them from outliving it.
///
/// The connection is exclusive to this context. Repositories sharing it must
/// be driven from one logical operation sequence; the internal mutex only
/// serializes accidental overlap, it does not make concurrent use part of
/// the contract.
pub struct SqliteContext {
    tx: Mutex<Transaction<'static, Sqlite>>,
    sql_log: Option<SqlLogSink>,
}

// The SQL log sink is an `Arc<dyn Fn>`, which is not `Debug`, so the struct
// cannot derive `Debug`. A manual impl satisfies the `unwrap_err`/`Debug`
// bound the tests rely on without exposing the sink or the transaction.
impl std::fmt::Debug for SqliteContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteContext")
            .field("logged", &self.sql_log.is_some())
            .finish_non_exhaustive()
    }
}

impl SqliteContext {
    /// Open a transaction on `pool` without SQL logging.
    pub async fn begin(pool: &SqlitePool) -> Result<Self> {
        Self::start(pool, None).await
    }

    /// Open a transaction with every executed command reported to `sink`,
    /// formatted with its parameters substituted. The sink is fixed for the
    /// lifetime of the context.
    pub async fn begin_logged(pool: &SqlitePool, sink: SqlLogSink) -> Result<Self> {
        Self::start(pool, Some(sink)).await
    }

    async fn start(pool: &SqlitePool, sql_log: Option<SqlLogSink>) -> Result<Self> {
        if pool.is_closed() {
            return Err(AppError::InvalidState(
                "cannot begin a context on a closed pool".to_string(),
            ));
        }
        let tx = pool.begin().await.map_err(map_sqlx_error)?;
        Ok(Self {
            tx: Mutex::new(tx),
            sql_log,
        })
    }

    /// Recover the concrete context from a unit-of-work reference.
    ///
    /// Fails with `NotSupported` when the unit of work was produced by a
    /// different adapter; no other failure mode exists.
    pub fn from_unit_of_work(uow: &dyn UnitOfWork) -> Result<&SqliteContext> {
        uow.as_any().downcast_ref::<SqliteContext>().ok_or_else(|| {
            AppError::NotSupported(
                "this unit of work is not a SqliteContext; construct it through \
                 strata-infra-sqlite to use direct database access"
                    .to_string(),
            )
        })
    }

    /// Commit the transaction and release the connection.
    pub async fn complete(self) -> Result<()> {
        self.tx.into_inner().commit().await.map_err(map_sqlx_error)
    }

    /// Roll the transaction back and release the connection.
    pub async fn abandon(self) -> Result<()> {
        self.tx
            .into_inner()
            .rollback()
            .await
            .map_err(map_sqlx_error)
    }

    /// Run a typed query inside this context's transaction. Reports the
    /// formatted command to the log sink.
    pub async fn query_as<T>(&self, sql: &str, args: &[SqlValue]) -> Result<Vec<T>>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let rows = self.fetch_unlogged(sql, args).await?;
        self.log(sql, args);
        Ok(rows)
    }

    pub(crate) fn log(&self, sql: &str, args: &[SqlValue]) {
        if let Some(sink) = &self.sql_log {
            sink(&format_command(sql, args));
        }
    }

    pub(crate) async fn execute_unlogged(
        &self,
        sql: &str,
        args: &[SqlValue],
    ) -> Result<SqliteQueryResult> {
        debug!(%sql, "execute");
        let mut tx = self.tx.lock().await;
        bind_all(sqlx::query(sql), args)
            .execute(&mut **tx)
            .await
            .map_err(map_sqlx_error)
    }

    pub(crate) async fn fetch_unlogged<T>(&self, sql: &str, args: &[SqlValue]) -> Result<Vec<T>>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        debug!(%sql, "fetch");
        let mut tx = self.tx.lock().await;
        bind_all_as(sqlx::query_as::<_, T>(sql), args)
            .fetch_all(&mut **tx)
            .await
            .map_err(map_sqlx_error)
    }

    pub(crate) async fn fetch_scalar_unlogged(
        &self,
        sql: &str,
        args: &[SqlValue],
    ) -> Result<i64> {
        let rows: Vec<(i64,)> = self.fetch_unlogged(sql, args).await?;
        rows.first()
            .map(|row| row.0)
            .ok_or_else(|| AppError::Database(format!("scalar query returned no rows: {}", sql)))
    }
}

#[async_trait]
impl UnitOfWork for SqliteContext {
    async fn complete(self: Box<Self>) -> Result<()> {
        (*self).complete().await
    }

    async fn abandon(self: Box<Self>) -> Result<()> {
        (*self).abandon().await
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[async_trait]
impl SqlCommand for SqliteContext {
    async fn execute(&self, sql: &str, args: &[SqlValue]) -> Result<u64> {
        let result = self.execute_unlogged(sql, args).await?;
        self.log(sql, args);
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::create_pool;
    use std::sync::Mutex as StdMutex;
    use strata_core::port::SqlCommand;

    fn _assert_db_context(ctx: SqliteContext) -> impl strata_core::port::DbContext {
        ctx
    }

    async fn pool_with_table() -> SqlitePool {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        sqlx::query("CREATE TABLE kv (k TEXT PRIMARY KEY, v TEXT NOT NULL)")
            .execute(&pool)
            .await
            .unwrap();
        pool
    }

    #[tokio::test]
    async fn execute_returns_affected_rows() {
        let pool = pool_with_table().await;
        let ctx = SqliteContext::begin(&pool).await.unwrap();
        let rows = ctx
            .execute(
                "INSERT INTO kv (k, v) VALUES (?, ?)",
                &[SqlValue::from("a"), SqlValue::from("1")],
            )
            .await
            .unwrap();
        assert_eq!(rows, 1);
        ctx.complete().await.unwrap();
    }

    #[tokio::test]
    async fn drop_without_complete_rolls_back() {
        let db_path = "/tmp/strata_test_ctx_drop.db";
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", db_path, suffix));
        }

        let pool = create_pool(db_path).await.unwrap();
        sqlx::query("CREATE TABLE kv (k TEXT PRIMARY KEY, v TEXT NOT NULL)")
            .execute(&pool)
            .await
            .unwrap();
        {
            let ctx = SqliteContext::begin(&pool).await.unwrap();
            ctx.execute(
                "INSERT INTO kv (k, v) VALUES (?, ?)",
                &[SqlValue::from("a"), SqlValue::from("1")],
            )
            .await
            .unwrap();
            // dropped here, never completed
        }
        let ctx = SqliteContext::begin(&pool).await.unwrap();
        let rows: Vec<(String,)> = ctx.query_as("SELECT k FROM kv", &[]).await.unwrap();
        assert!(rows.is_empty());
        ctx.abandon().await.unwrap();

        let _ = std::fs::remove_file(db_path);
    }

    #[tokio::test]
    async fn abandon_rolls_back() {
        let pool = pool_with_table().await;
        let ctx = SqliteContext::begin(&pool).await.unwrap();
        ctx.execute(
            "INSERT INTO kv (k, v) VALUES (?, ?)",
            &[SqlValue::from("a"), SqlValue::from("1")],
        )
        .await
        .unwrap();
        ctx.abandon().await.unwrap();

        let ctx = SqliteContext::begin(&pool).await.unwrap();
        let count: Vec<(i64,)> = ctx.query_as("SELECT COUNT(*) FROM kv", &[]).await.unwrap();
        assert_eq!(count[0].0, 0);
        ctx.abandon().await.unwrap();
    }

    #[tokio::test]
    async fn log_sink_receives_formatted_command() {
        let pool = pool_with_table().await;
        let lines = Arc::new(StdMutex::new(Vec::<String>::new()));
        let sink_lines = lines.clone();
        let ctx = SqliteContext::begin_logged(
            &pool,
            Arc::new(move |line| sink_lines.lock().unwrap().push(line.to_string())),
        )
        .await
        .unwrap();

        ctx.execute(
            "INSERT INTO kv (k, v) VALUES (?, ?)",
            &[SqlValue::from("a"), SqlValue::from("it's")],
        )
        .await
        .unwrap();
        ctx.complete().await.unwrap();

        let lines = lines.lock().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0], "INSERT INTO kv (k, v) VALUES ('a', 'it''s')");
    }

    #[tokio::test]
    async fn begin_on_closed_pool_fails_fast() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        pool.close().await;
        let err = SqliteContext::begin(&pool).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[tokio::test]
    async fn capability_cast_succeeds_for_sqlite_context() {
        let pool = pool_with_table().await;
        let uow: Box<dyn UnitOfWork> = Box::new(SqliteContext::begin(&pool).await.unwrap());
        assert!(SqliteContext::from_unit_of_work(uow.as_ref()).is_ok());
        uow.complete().await.unwrap();
    }

    #[tokio::test]
    async fn capability_cast_rejects_foreign_unit_of_work() {
        struct NotSqlite;

        #[async_trait]
        impl UnitOfWork for NotSqlite {
            async fn complete(self: Box<Self>) -> Result<()> {
                Ok(())
            }
            async fn abandon(self: Box<Self>) -> Result<()> {
                Ok(())
            }
            fn as_any(&self) -> &dyn Any {
                self
            }
        }

        let uow = NotSqlite;
        let err = SqliteContext::from_unit_of_work(&uow).unwrap_err();
        assert!(matches!(err, AppError::NotSupported(_)));
    }
}
