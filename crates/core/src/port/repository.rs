// Repository Port

use crate::domain::{Entity, Query};
use crate::error::Result;
use async_trait::async_trait;

/// CRUD and query operations for one entity type within one transaction
/// scope. Implementations are bound to a context at construction and carry
/// no state beyond that binding; several repositories may share a context.
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    /// Insert. Store-assigned keys are written back to the entity.
    async fn add(&self, entity: &mut E) -> Result<()>;

    /// Full-row update by key.
    async fn modify(&self, entity: &E) -> Result<()>;

    /// Delete by entity instance (key match). Returns affected rows.
    async fn remove(&self, entity: &E) -> Result<u64>;

    /// Delete by key, no prior fetch.
    async fn remove_by_key(&self, key: E::Key) -> Result<u64>;

    /// Delete every row matching the descriptor.
    async fn remove_where(&self, query: &Query) -> Result<u64>;

    /// Single row by key, or `None`. Absence is not an error.
    async fn find(&self, key: E::Key) -> Result<Option<E>>;

    /// Single row matching the descriptor, or `None`. More than one match is
    /// an error, never resolved by picking a row.
    async fn find_one(&self, query: &Query) -> Result<Option<E>>;

    /// Every row matching the descriptor, unpaged.
    async fn query(&self, query: &Query) -> Result<Vec<E>>;

    /// Every row in the table. Unbounded cost; not meant for large tables.
    async fn fetch_all(&self) -> Result<Vec<E>>;
}
