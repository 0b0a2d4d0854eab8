use super::{StorageConfig, StorageEngine, Table, TableSchema};
use crate::core::{Column, DbError, Result, Row, Value};
use crate::transaction::Change;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::{Level, event};
use uuid::Uuid;

/// In-memory relational store.
///
/// All tables live behind one lock so that a flush batch is validated and
/// applied as a single unit.
pub struct InMemoryStorage {
    config: StorageConfig,
    tables: RwLock<HashMap<String, Table>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::with_config(StorageConfig::default())
    }

    pub fn with_config(config: StorageConfig) -> Self {
        Self {
            config,
            tables: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Rejects text the server encoding cannot represent.
    fn check_text_encoding(&self, table: &str, values: &[(String, Value)]) -> Result<()> {
        if !self.config.strict_text_encoding {
            return Ok(());
        }
        for (column, value) in values {
            if let Value::Text(text) = value
                && text.contains('\0')
            {
                return Err(DbError::InvalidTextEncoding {
                    table: table.to_string(),
                    column: column.clone(),
                });
            }
        }
        Ok(())
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageEngine for InMemoryStorage {
    fn create_table(&self, schema: TableSchema) -> Result<()> {
        let mut tables = self.tables.write()?;
        let name = schema.name().to_string();
        if tables.contains_key(&name) {
            return Err(DbError::TableExists(name));
        }
        tables.insert(name, Table::new(schema));
        Ok(())
    }

    fn drop_table(&self, name: &str) -> Result<()> {
        let mut tables = self.tables.write()?;
        if tables.remove(name).is_none() {
            return Err(DbError::TableNotFound(name.to_string()));
        }
        Ok(())
    }

    fn add_column(&self, table: &str, column: Column) -> Result<()> {
        let mut tables = self.tables.write()?;
        let table_ref = tables
            .get_mut(table)
            .ok_or_else(|| DbError::TableNotFound(table.to_string()))?;
        table_ref.add_column(column)
    }

    fn drop_column(&self, table: &str, column: &str) -> Result<()> {
        let mut tables = self.tables.write()?;
        let table_ref = tables
            .get_mut(table)
            .ok_or_else(|| DbError::TableNotFound(table.to_string()))?;
        table_ref.drop_column(column)
    }

    fn apply(&self, batch: &[Change]) -> Result<usize> {
        let mut tables = self.tables.write()?;

        // Stage every change against an overlay first; nothing touches the
        // tables until the whole batch has validated.
        let mut overlay: HashMap<(String, Uuid), Option<Row>> = HashMap::new();
        for change in batch {
            let table_name = change.table_name();
            let table = tables
                .get(table_name)
                .ok_or_else(|| DbError::TableNotFound(table_name.to_string()))?;
            let key = change.key();
            let slot = (table_name.to_string(), key);
            let existing = match overlay.get(&slot) {
                Some(staged) => staged.clone(),
                None => table.get(&key).cloned(),
            };

            self.check_text_encoding(table_name, change.values())?;

            let staged = match change {
                Change::InsertRow { values, .. } => {
                    if existing.is_some() {
                        return Err(DbError::ConstraintViolation(format!(
                            "Duplicate key {} in table '{}'",
                            key, table_name
                        )));
                    }
                    Some(table.build_insert_row(key, values)?)
                }
                Change::UpdateRow { values, .. } => {
                    let current = existing.ok_or_else(|| {
                        DbError::EntityNotFound(format!("{}({})", table_name, key))
                    })?;
                    Some(table.build_update_row(&current, values)?)
                }
                Change::DeleteRow { .. } => {
                    if existing.is_none() {
                        return Err(DbError::EntityNotFound(format!("{}({})", table_name, key)));
                    }
                    None
                }
            };
            overlay.insert(slot, staged);
        }

        for ((table_name, key), staged) in overlay {
            if let Some(table) = tables.get_mut(&table_name) {
                match staged {
                    Some(row) => table.put(key, row),
                    None => {
                        table.remove(&key);
                    }
                }
            }
        }

        event!(
            Level::DEBUG,
            database = %self.config.name,
            changes = batch.len(),
            "storage batch applied"
        );
        Ok(batch.len())
    }

    async fn apply_async(&self, batch: &[Change]) -> Result<usize> {
        // The lock is synchronous; give other tasks a turn before taking it.
        tokio::task::yield_now().await;
        self.apply(batch)
    }

    fn get_row(&self, table: &str, key: Uuid) -> Result<Option<Row>> {
        let tables = self.tables.read()?;
        let table_ref = tables
            .get(table)
            .ok_or_else(|| DbError::TableNotFound(table.to_string()))?;
        Ok(table_ref.get(&key).cloned())
    }

    fn scan(&self, table: &str) -> Result<Vec<Row>> {
        let tables = self.tables.read()?;
        let table_ref = tables
            .get(table)
            .ok_or_else(|| DbError::TableNotFound(table.to_string()))?;
        Ok(table_ref.scan())
    }

    fn schema(&self, table: &str) -> Result<TableSchema> {
        let tables = self.tables.read()?;
        tables
            .get(table)
            .map(|t| t.schema().clone())
            .ok_or_else(|| DbError::TableNotFound(table.to_string()))
    }

    fn table_exists(&self, name: &str) -> bool {
        self.tables
            .read()
            .map(|tables| tables.contains_key(name))
            .unwrap_or(false)
    }

    fn list_tables(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .tables
            .read()
            .map(|tables| tables.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    fn row_count(&self, table: &str) -> Result<usize> {
        let tables = self.tables.read()?;
        tables
            .get(table)
            .map(Table::row_count)
            .ok_or_else(|| DbError::TableNotFound(table.to_string()))
    }
}
