pub mod config;
pub mod engine;
pub mod memory;
pub mod table;

pub use config::StorageConfig;
pub use engine::StorageEngine;
pub use memory::InMemoryStorage;
pub use table::{KEY_COLUMN, Table, TableSchema};
