use super::table::TableSchema;
use crate::core::{Column, Result, Row};
use crate::transaction::Change;
use async_trait::async_trait;
use uuid::Uuid;

/// Storage engine trait - allows pluggable storage backends
///
/// `apply` is the flush entry point: a batch either lands completely or not
/// at all. Implementations must be safe to share between contexts.
#[async_trait]
pub trait StorageEngine: Send + Sync {
    /// Create a new table with the given schema
    fn create_table(&self, schema: TableSchema) -> Result<()>;

    /// Drop a table and all of its rows
    fn drop_table(&self, name: &str) -> Result<()>;

    /// Add a column, back-filling existing rows with its default
    fn add_column(&self, table: &str, column: Column) -> Result<()>;

    /// Remove a column from a table
    fn drop_column(&self, table: &str, column: &str) -> Result<()>;

    /// Apply a batch of row changes atomically, returning the affected row count
    fn apply(&self, batch: &[Change]) -> Result<usize>;

    /// Asynchronous flush entry point
    async fn apply_async(&self, batch: &[Change]) -> Result<usize> {
        self.apply(batch)
    }

    /// Fetch a single row by primary key
    fn get_row(&self, table: &str, key: Uuid) -> Result<Option<Row>>;

    /// Scan all rows in a table
    fn scan(&self, table: &str) -> Result<Vec<Row>>;

    /// Get the schema for a table
    fn schema(&self, table: &str) -> Result<TableSchema>;

    /// Check if a table exists
    fn table_exists(&self, name: &str) -> bool;

    /// List all table names
    fn list_tables(&self) -> Vec<String>;

    /// Get table row count
    fn row_count(&self, table: &str) -> Result<usize>;
}
