//! Schema migrations.
//!
//! A [`Migrator`] owns an ordered list of [`SchemaMigration`]s and records
//! applied ids in the `__migrations_history` table of the store.

use crate::core::{Column, DataType, DbError, Result, Value};
use crate::storage::{StorageEngine, TableSchema};
use crate::transaction::Change;
use chrono::Utc;
use std::collections::HashSet;
use tracing::{Level, event};
use uuid::Uuid;

pub const MIGRATIONS_HISTORY_TABLE: &str = "__migrations_history";

const HISTORY_ID_COLUMN: &str = "MigrationId";
const HISTORY_APPLIED_AT_COLUMN: &str = "AppliedAt";

/// One schema change.
#[derive(Debug, Clone)]
pub enum SchemaOperation {
    CreateTable(TableSchema),
    DropTable(String),
    AddColumn { table: String, column: Column },
    DropColumn { table: String, column: String },
}

impl SchemaOperation {
    pub fn add_column(table: impl Into<String>, column: Column) -> Self {
        Self::AddColumn {
            table: table.into(),
            column,
        }
    }

    pub fn drop_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::DropColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    pub fn apply(&self, storage: &dyn StorageEngine) -> Result<()> {
        match self {
            Self::CreateTable(schema) => storage.create_table(schema.clone()),
            Self::DropTable(name) => storage.drop_table(name),
            Self::AddColumn { table, column } => storage.add_column(table, column.clone()),
            Self::DropColumn { table, column } => storage.drop_column(table, column),
        }
    }
}

/// A named migration with its forward and reverse operations.
#[derive(Debug, Clone)]
pub struct SchemaMigration {
    id: String,
    up: Vec<SchemaOperation>,
    down: Vec<SchemaOperation>,
}

impl SchemaMigration {
    /// `id` sorts migrations; use a timestamp prefix such as
    /// `20260214231905_AddDateFormat`.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            up: Vec::new(),
            down: Vec::new(),
        }
    }

    pub fn up(mut self, operation: SchemaOperation) -> Self {
        self.up.push(operation);
        self
    }

    pub fn down(mut self, operation: SchemaOperation) -> Self {
        self.down.push(operation);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn up_operations(&self) -> &[SchemaOperation] {
        &self.up
    }

    pub fn down_operations(&self) -> &[SchemaOperation] {
        &self.down
    }
}

/// Applies migrations in id order and keeps the history table current.
#[derive(Debug, Clone)]
pub struct Migrator {
    migrations: Vec<SchemaMigration>,
}

impl Migrator {
    /// Validates that ids are non-empty, unique and ascending.
    pub fn new(migrations: Vec<SchemaMigration>) -> Result<Self> {
        let mut previous: Option<&str> = None;
        for migration in &migrations {
            if migration.id.trim().is_empty() {
                return Err(DbError::MigrationError(
                    "Migration id must not be empty".to_string(),
                ));
            }
            if let Some(prev) = previous
                && migration.id.as_str() <= prev
            {
                return Err(DbError::MigrationError(format!(
                    "Migration '{}' must sort after '{}'",
                    migration.id, prev
                )));
            }
            previous = Some(migration.id.as_str());
        }
        Ok(Self { migrations })
    }

    pub fn migrations(&self) -> &[SchemaMigration] {
        &self.migrations
    }

    /// Ids recorded in the history table, in order.
    pub fn applied(&self, storage: &dyn StorageEngine) -> Result<Vec<String>> {
        if !storage.table_exists(MIGRATIONS_HISTORY_TABLE) {
            return Ok(Vec::new());
        }
        let schema = storage.schema(MIGRATIONS_HISTORY_TABLE)?;
        let idx = schema
            .schema()
            .find_column_index(HISTORY_ID_COLUMN)
            .ok_or_else(|| {
                DbError::ColumnNotFound(
                    HISTORY_ID_COLUMN.to_string(),
                    MIGRATIONS_HISTORY_TABLE.to_string(),
                )
            })?;

        let mut ids: Vec<String> = storage
            .scan(MIGRATIONS_HISTORY_TABLE)?
            .into_iter()
            .filter_map(|row| row.get(idx).and_then(|v| v.as_str().map(str::to_string)))
            .collect();
        ids.sort();
        Ok(ids)
    }

    /// Migrations not yet recorded in the history table.
    pub fn pending(&self, storage: &dyn StorageEngine) -> Result<Vec<&SchemaMigration>> {
        let applied: HashSet<String> = self.applied(storage)?.into_iter().collect();
        for id in &applied {
            if !self.migrations.iter().any(|m| &m.id == id) {
                return Err(DbError::MigrationError(format!(
                    "Store has unknown migration '{}' applied",
                    id
                )));
            }
        }
        Ok(self
            .migrations
            .iter()
            .filter(|m| !applied.contains(&m.id))
            .collect())
    }

    /// Applies all pending migrations, returning the ids applied now.
    pub fn migrate(&self, storage: &dyn StorageEngine) -> Result<Vec<String>> {
        ensure_history_table(storage)?;

        let mut applied_now = Vec::new();
        for migration in self.pending(storage)? {
            for operation in &migration.up {
                operation.apply(storage).map_err(|err| {
                    DbError::MigrationError(format!("{} failed: {}", migration.id, err))
                })?;
            }
            storage.apply(&[Change::InsertRow {
                table: MIGRATIONS_HISTORY_TABLE.to_string(),
                key: history_key(&migration.id),
                values: vec![
                    (HISTORY_ID_COLUMN.to_string(), Value::from(migration.id.as_str())),
                    (HISTORY_APPLIED_AT_COLUMN.to_string(), Value::from(Utc::now())),
                ],
            }])?;
            event!(Level::INFO, migration = %migration.id, "migration applied");
            applied_now.push(migration.id.clone());
        }
        Ok(applied_now)
    }

    /// Reverts the most recently applied migration.
    pub fn rollback_last(&self, storage: &dyn StorageEngine) -> Result<Option<String>> {
        let Some(last) = self.applied(storage)?.pop() else {
            return Ok(None);
        };
        let migration = self
            .migrations
            .iter()
            .find(|m| m.id == last)
            .ok_or_else(|| {
                DbError::MigrationError(format!("Store has unknown migration '{}' applied", last))
            })?;

        for operation in &migration.down {
            operation.apply(storage).map_err(|err| {
                DbError::MigrationError(format!("{} rollback failed: {}", migration.id, err))
            })?;
        }
        storage.apply(&[Change::DeleteRow {
            table: MIGRATIONS_HISTORY_TABLE.to_string(),
            key: history_key(&migration.id),
        }])?;
        event!(Level::INFO, migration = %migration.id, "migration reverted");
        Ok(Some(last))
    }
}

fn ensure_history_table(storage: &dyn StorageEngine) -> Result<()> {
    if storage.table_exists(MIGRATIONS_HISTORY_TABLE) {
        return Ok(());
    }
    storage.create_table(TableSchema::new(
        MIGRATIONS_HISTORY_TABLE,
        vec![
            Column::new(HISTORY_ID_COLUMN, DataType::Text).not_null(),
            Column::new(HISTORY_APPLIED_AT_COLUMN, DataType::Timestamp).not_null(),
        ],
    ))
}

fn history_key(id: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, id.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStorage;

    fn migrations() -> Vec<SchemaMigration> {
        vec![
            SchemaMigration::new("0001_Create")
                .up(SchemaOperation::CreateTable(TableSchema::new(
                    "Goals",
                    vec![Column::new("Name", DataType::Text).not_null()],
                )))
                .down(SchemaOperation::DropTable("Goals".into())),
            SchemaMigration::new("0002_AddTarget")
                .up(SchemaOperation::add_column(
                    "Goals",
                    Column::new("Target", DataType::Float).not_null().default_value(0.0),
                ))
                .down(SchemaOperation::drop_column("Goals", "Target")),
        ]
    }

    #[test]
    fn test_ids_must_ascend() {
        let mut list = migrations();
        list.reverse();
        assert!(matches!(Migrator::new(list), Err(DbError::MigrationError(_))));
        assert!(Migrator::new(vec![SchemaMigration::new(" ")]).is_err());
    }

    #[test]
    fn test_migrate_is_idempotent() {
        let storage = InMemoryStorage::new();
        let migrator = Migrator::new(migrations()).unwrap();

        let first = migrator.migrate(&storage).unwrap();
        assert_eq!(first, vec!["0001_Create", "0002_AddTarget"]);
        assert!(migrator.migrate(&storage).unwrap().is_empty());
        assert_eq!(migrator.applied(&storage).unwrap().len(), 2);

        let schema = storage.schema("Goals").unwrap();
        assert!(schema.schema().get_column("Target").is_some());
    }

    #[test]
    fn test_rollback_last_reverts_down_ops() {
        let storage = InMemoryStorage::new();
        let migrator = Migrator::new(migrations()).unwrap();
        migrator.migrate(&storage).unwrap();

        let reverted = migrator.rollback_last(&storage).unwrap();
        assert_eq!(reverted.as_deref(), Some("0002_AddTarget"));
        let schema = storage.schema("Goals").unwrap();
        assert!(schema.schema().get_column("Target").is_none());
        assert_eq!(migrator.pending(&storage).unwrap().len(), 1);

        migrator.rollback_last(&storage).unwrap();
        assert!(!storage.table_exists("Goals"));
        assert_eq!(migrator.rollback_last(&storage).unwrap(), None);
    }

    #[test]
    fn test_unknown_applied_migration_is_an_error() {
        let storage = InMemoryStorage::new();
        Migrator::new(migrations()).unwrap().migrate(&storage).unwrap();

        let shorter = Migrator::new(migrations().into_iter().take(1).collect()).unwrap();
        assert!(matches!(
            shorter.pending(&storage),
            Err(DbError::MigrationError(_))
        ));
    }
}
