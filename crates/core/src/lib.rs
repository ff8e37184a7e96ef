// Strata Core - Entity Contracts & Data-Access Ports
// NO infrastructure dependencies: everything that touches sqlx lives in infra-sqlite

pub mod domain;
pub mod error;
pub mod port;

pub use error::{AppError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
