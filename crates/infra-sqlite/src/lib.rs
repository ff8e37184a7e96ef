// Strata Infrastructure - sqlx/SQLite Adapter
// Implements: UnitOfWork + SqlCommand (SqliteContext), Repository (SqliteRepository)

mod bind;
mod connection;
mod context;
mod error;
mod repository;

pub use connection::create_pool;
pub use context::{SqlLogSink, SqliteContext};
pub use repository::{
    SqliteEntity, SqliteIdentityRepository, SqliteRepository, SqliteUniqueIdRepository,
};

// Note: sqlx::Error conversion lives in error.rs here
// (orphan rules: cannot implement From<sqlx::Error> for AppError outside core)
