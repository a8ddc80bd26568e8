pub mod schema;
pub mod connection;
pub mod repositories;
pub mod row;

pub use connection::{Database, DbPool};
