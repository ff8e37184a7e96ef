// Generic SQLite Repository

use crate::context::SqliteContext;
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::FromRow;
use std::marker::PhantomData;
use std::ops::Deref;
use strata_core::domain::{
    Entity, IdentityEntity, PageRequest, PageResponse, Query, SqlValue, UniqueIdEntity,
};
use strata_core::error::{AppError, Result};
use strata_core::port::Repository;

/// Bound on entities the adapter can materialize from rows.
pub trait SqliteEntity: Entity + for<'r> FromRow<'r, SqliteRow> + Unpin {}

impl<E> SqliteEntity for E where E: Entity + for<'r> FromRow<'r, SqliteRow> + Unpin {}

/// Repository bound to one context for the duration of one transaction
/// scope. Stateless beyond that binding; any number of repositories may
/// share a context. The `'c` borrow keeps a repository from outliving its
/// context.
pub struct SqliteRepository<'c, E> {
    context: &'c SqliteContext,
    _entity: PhantomData<E>,
}

impl<'c, E: SqliteEntity> SqliteRepository<'c, E> {
    pub fn new(context: &'c SqliteContext) -> Self {
        Self {
            context,
            _entity: PhantomData,
        }
    }

    /// The context this repository operates through.
    pub fn context(&self) -> &SqliteContext {
        self.context
    }

    async fn insert(&self, entity: &mut E) -> Result<()> {
        let mut columns: Vec<&str> = Vec::with_capacity(E::columns().len() + 1);
        let mut args: Vec<SqlValue> = Vec::with_capacity(E::columns().len() + 1);
        if !E::key_is_generated() {
            columns.push(E::key_column());
            args.push(entity.key().into());
        }
        columns.extend_from_slice(E::columns());
        args.extend(entity.values());

        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            E::table(),
            columns.join(", "),
            placeholders
        );
        let result = self.context.execute_unlogged(&sql, &args).await?;
        if E::key_is_generated() {
            entity.assign_key(result.last_insert_rowid());
        }
        self.context.log(&sql, &args);
        Ok(())
    }

    async fn update(&self, entity: &E) -> Result<()> {
        let assignments = E::columns()
            .iter()
            .map(|column| format!("{} = ?", column))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?",
            E::table(),
            assignments,
            E::key_column()
        );
        let mut args = entity.values();
        args.push(entity.key().into());
        self.context.execute_unlogged(&sql, &args).await?;
        self.context.log(&sql, &args);
        Ok(())
    }

    async fn delete_by_key(&self, key: E::Key) -> Result<u64> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?",
            E::table(),
            E::key_column()
        );
        let args = [key.into()];
        let result = self.context.execute_unlogged(&sql, &args).await?;
        self.context.log(&sql, &args);
        Ok(result.rows_affected())
    }

    fn single_row(sql: &str, mut rows: Vec<E>) -> Result<Option<E>> {
        match rows.len() {
            0 => Ok(None),
            1 => Ok(rows.pop()),
            n => Err(AppError::Database(format!(
                "expected a single row, query returned {}: {}",
                n, sql
            ))),
        }
    }

    /// Update the given column/value pairs on every row matching `query`,
    /// without fetching entities first. Returns affected rows.
    pub async fn modify_where(
        &self,
        assignments: &[(&str, SqlValue)],
        query: &Query,
    ) -> Result<u64> {
        if assignments.is_empty() {
            return Err(AppError::Validation(
                "modify_where requires at least one assignment".to_string(),
            ));
        }
        let set = assignments
            .iter()
            .map(|(column, _)| format!("{} = ?", column))
            .collect::<Vec<_>>()
            .join(", ");
        let mut args: Vec<SqlValue> = assignments.iter().map(|(_, value)| value.clone()).collect();
        args.extend(query.args().iter().cloned());

        let sql = format!("UPDATE {} SET {}{}", E::table(), set, query.where_sql());
        let result = self.context.execute_unlogged(&sql, &args).await?;
        self.context.log(&sql, &args);
        Ok(result.rows_affected())
    }

    /// Update only the named columns of `entity`, leaving the rest of the
    /// row untouched. Column names must appear in `E::columns()`.
    pub async fn modify_columns(&self, entity: &E, columns: &[&str]) -> Result<u64> {
        if columns.is_empty() {
            return Err(AppError::Validation(
                "modify_columns requires at least one column".to_string(),
            ));
        }
        let all = E::columns();
        let values = entity.values();
        let mut set = Vec::with_capacity(columns.len());
        let mut args = Vec::with_capacity(columns.len() + 1);
        for name in columns {
            let index = all.iter().position(|column| column == name).ok_or_else(|| {
                AppError::Validation(format!("unknown column {} on {}", name, E::table()))
            })?;
            set.push(format!("{} = ?", name));
            args.push(values[index].clone());
        }
        args.push(entity.key().into());

        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?",
            E::table(),
            set.join(", "),
            E::key_column()
        );
        let result = self.context.execute_unlogged(&sql, &args).await?;
        self.context.log(&sql, &args);
        Ok(result.rows_affected())
    }

    /// Fetch one page of matches plus the total match count. The count query
    /// reuses the descriptor's filter with ordering stripped.
    pub async fn find_paged(
        &self,
        request: &PageRequest,
        query: &Query,
    ) -> Result<PageResponse<E>> {
        let count_sql = format!("SELECT COUNT(*) FROM {}{}", E::table(), query.where_sql());
        let total = self
            .context
            .fetch_scalar_unlogged(&count_sql, query.args())
            .await?;

        let sql = format!(
            "SELECT * FROM {}{} LIMIT ? OFFSET ?",
            E::table(),
            query.suffix_sql()
        );
        let mut args: Vec<SqlValue> = query.args().to_vec();
        args.push(SqlValue::Integer(request.limit() as i64));
        args.push(SqlValue::Integer(request.offset() as i64));
        let items = self.context.fetch_unlogged::<E>(&sql, &args).await?;
        self.context.log(&sql, &args);

        Ok(PageResponse::new(
            items,
            request.page,
            request.page_size,
            total as u64,
        ))
    }

    /// Insert when the key is still in its "new" state, update otherwise.
    pub async fn save(&self, entity: &mut E) -> Result<()> {
        if entity.is_new() {
            self.insert(entity).await
        } else {
            self.update(entity).await
        }
    }
}

#[async_trait]
impl<'c, E: SqliteEntity> Repository<E> for SqliteRepository<'c, E> {
    async fn add(&self, entity: &mut E) -> Result<()> {
        self.insert(entity).await
    }

    async fn modify(&self, entity: &E) -> Result<()> {
        self.update(entity).await
    }

    async fn remove(&self, entity: &E) -> Result<u64> {
        self.delete_by_key(entity.key()).await
    }

    async fn remove_by_key(&self, key: E::Key) -> Result<u64> {
        self.delete_by_key(key).await
    }

    async fn remove_where(&self, query: &Query) -> Result<u64> {
        let sql = format!("DELETE FROM {}{}", E::table(), query.where_sql());
        let result = self.context.execute_unlogged(&sql, query.args()).await?;
        self.context.log(&sql, query.args());
        Ok(result.rows_affected())
    }

    async fn find(&self, key: E::Key) -> Result<Option<E>> {
        let sql = format!(
            "SELECT * FROM {} WHERE {} = ?",
            E::table(),
            E::key_column()
        );
        let args = [key.into()];
        let rows = self.context.fetch_unlogged::<E>(&sql, &args).await?;
        self.context.log(&sql, &args);
        Self::single_row(&sql, rows)
    }

    async fn find_one(&self, query: &Query) -> Result<Option<E>> {
        let sql = format!("SELECT * FROM {}{}", E::table(), query.suffix_sql());
        let rows = self.context.fetch_unlogged::<E>(&sql, query.args()).await?;
        self.context.log(&sql, query.args());
        Self::single_row(&sql, rows)
    }

    async fn query(&self, query: &Query) -> Result<Vec<E>> {
        let sql = format!("SELECT * FROM {}{}", E::table(), query.suffix_sql());
        self.context.fetch_unlogged(&sql, query.args()).await
    }

    async fn fetch_all(&self) -> Result<Vec<E>> {
        let sql = format!("SELECT * FROM {}", E::table());
        self.context.fetch_unlogged(&sql, &[]).await
    }
}

/// Repository for auto-increment integer-keyed entities. Narrows the key
/// contract only; behavior is the base repository's.
pub struct SqliteIdentityRepository<'c, E> {
    inner: SqliteRepository<'c, E>,
}

impl<'c, E> SqliteIdentityRepository<'c, E>
where
    E: IdentityEntity + SqliteEntity,
{
    pub fn new(context: &'c SqliteContext) -> Self {
        Self {
            inner: SqliteRepository::new(context),
        }
    }
}

impl<'c, E> Deref for SqliteIdentityRepository<'c, E> {
    type Target = SqliteRepository<'c, E>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Repository for entities keyed by a caller-supplied unique identifier.
/// Narrows the key contract only; behavior is the base repository's.
pub struct SqliteUniqueIdRepository<'c, E> {
    inner: SqliteRepository<'c, E>,
}

impl<'c, E> SqliteUniqueIdRepository<'c, E>
where
    E: UniqueIdEntity + SqliteEntity,
{
    pub fn new(context: &'c SqliteContext) -> Self {
        Self {
            inner: SqliteRepository::new(context),
        }
    }
}

impl<'c, E> Deref for SqliteUniqueIdRepository<'c, E> {
    type Target = SqliteRepository<'c, E>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
