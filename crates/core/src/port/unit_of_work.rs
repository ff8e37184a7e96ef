// Unit-of-Work Port

use crate::error::Result;
use async_trait::async_trait;
use std::any::Any;

/// One transactional scope: begun by the adapter when the context is
/// constructed, finished exactly once. The consuming receivers make a second
/// completion unrepresentable.
///
/// Dropping an incomplete unit of work abandons it and the adapter rolls the
/// underlying transaction back. Callers wanting a commit must call
/// `complete` before the context goes out of scope.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Commit the transaction and release the connection.
    async fn complete(self: Box<Self>) -> Result<()>;

    /// Roll the transaction back without waiting for drop.
    async fn abandon(self: Box<Self>) -> Result<()>;

    /// Concrete-type escape hatch for capability casts.
    fn as_any(&self) -> &dyn Any;
}
