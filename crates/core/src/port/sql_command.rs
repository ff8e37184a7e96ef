// Direct SQL Execution Port

use crate::domain::SqlValue;
use crate::error::Result;
use crate::port::unit_of_work::UnitOfWork;
use async_trait::async_trait;

/// Raw command execution against a context's transaction.
#[async_trait]
pub trait SqlCommand: Send + Sync {
    /// Run a non-query command. Returns the affected row count and reports
    /// the formatted command to the context's log sink.
    async fn execute(&self, sql: &str, args: &[SqlValue]) -> Result<u64>;
}

/// The full context contract: a unit of work that can also run raw commands.
///
/// Typed queries are generic and therefore live on the concrete adapter
/// context rather than on this object-safe trait.
pub trait DbContext: UnitOfWork + SqlCommand {}

impl<T: UnitOfWork + SqlCommand> DbContext for T {}
