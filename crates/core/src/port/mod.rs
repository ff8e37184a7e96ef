// Port Layer - data-access capabilities implemented by adapter crates

pub mod repository;
pub mod sql_command;
pub mod unit_of_work;

// Re-exports
pub use repository::Repository;
pub use sql_command::{DbContext, SqlCommand};
pub use unit_of_work::UnitOfWork;
