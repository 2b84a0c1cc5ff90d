pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::{Fault, MemoryStoreProvider};
pub use postgres::PgStoreProvider;
pub use store::{ProjectStore, StoreProvider};
