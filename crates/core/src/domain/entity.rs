// Entity Contract

use crate::domain::value::SqlValue;
use uuid::Uuid;

/// Mapping contract between a domain type and its backing table.
///
/// `columns()` and `values()` must stay aligned: the value at index `i` is
/// written to the column at index `i`. The key column is handled separately
/// by the adapter.
pub trait Entity: Send + Sync {
    /// Primary key type. `Default` doubles as the "not yet persisted" state:
    /// 0 for integer identities, nil for unique identifiers.
    type Key: Clone + Default + PartialEq + Into<SqlValue> + Send + Sync;

    /// Backing table name.
    fn table() -> &'static str;

    /// Primary key column name.
    fn key_column() -> &'static str;

    /// Non-key columns, in insert/update order.
    fn columns() -> &'static [&'static str];

    fn key(&self) -> Self::Key;

    /// Non-key column values, aligned with `columns()`.
    fn values(&self) -> Vec<SqlValue>;

    /// Whether the store assigns the key on insert. Generated keys are
    /// omitted from INSERT column lists.
    fn key_is_generated() -> bool {
        false
    }

    /// Whether the store has not seen this entity yet. Drives save/upsert.
    fn is_new(&self) -> bool {
        self.key() == Self::Key::default()
    }

    /// Called after an insert that produced a generated row id. Entities with
    /// store-assigned keys overwrite their key here; others ignore it.
    fn assign_key(&mut self, _rowid: i64) {}
}

/// Entities keyed by a store-assigned auto-increment integer.
///
/// Implementations return `true` from `key_is_generated` and store the
/// generated id in `assign_key`.
pub trait IdentityEntity: Entity<Key = i64> {}

/// Entities keyed by a caller-supplied unique identifier, set before insert.
pub trait UniqueIdEntity: Entity<Key = Uuid> {}
