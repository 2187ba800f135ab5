pub mod connection;
pub mod cooldowns;
pub mod outcomes;
pub mod ratings;
pub mod repository;
pub mod setup;

pub use connection::{DbConn, DbPool, create_pool, get_connection};
pub use repository::SqliteRepository;
