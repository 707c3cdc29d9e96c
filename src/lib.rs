pub mod config;
pub mod database;
pub mod executor;
pub mod planner;
pub mod storage;
pub mod types;
pub mod utils;

pub use config::DatabaseConfig;
pub use database::{Database, QueryOutput};
pub use types::error::{DatabaseError, Result};
