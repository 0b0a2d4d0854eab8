use super::{Account, Institution, Transaction, UserSettings};
use crate::context::{ContextOptions, DbContext};
use crate::core::{Column, DataType, Result};
use crate::entity::{EntityDescriptor, EntityType};
use crate::migration::{Migrator, SchemaMigration, SchemaOperation};
use crate::settings::DateFormat;
use crate::storage::{StorageEngine, TableSchema};
use std::sync::Arc;

pub const INITIAL_CREATE: &str = "20250101000000_InitialCreate";
pub const ADD_DATE_FORMAT: &str = "20260214231905_AddDateFormat";

/// Schema of `descriptor` minus columns introduced by later migrations.
fn table_without(descriptor: &EntityDescriptor, later: &[&str]) -> TableSchema {
    let full = descriptor.table_schema();
    let columns = full
        .schema()
        .columns()
        .iter()
        .filter(|c| !later.contains(&c.name.as_str()))
        .cloned()
        .collect();
    TableSchema::new(descriptor.table_name, columns)
}

/// Ordered migration list for the BudgetBoard store.
pub fn budget_board_migrations() -> Vec<SchemaMigration> {
    let mut initial = SchemaMigration::new(INITIAL_CREATE);
    let tables = [
        table_without(Institution::entity_descriptor(), &[]),
        table_without(Account::entity_descriptor(), &[]),
        table_without(Transaction::entity_descriptor(), &[]),
        table_without(UserSettings::entity_descriptor(), &["DateFormat"]),
    ];
    for schema in tables.iter().rev() {
        initial = initial.down(SchemaOperation::DropTable(schema.name().to_string()));
    }
    for schema in tables {
        initial = initial.up(SchemaOperation::CreateTable(schema));
    }

    let add_date_format = SchemaMigration::new(ADD_DATE_FORMAT)
        .up(SchemaOperation::add_column(
            UserSettings::TABLE,
            Column::new("DateFormat", DataType::Text)
                .not_null()
                .default_value(DateFormat::Default.as_str()),
        ))
        .down(SchemaOperation::drop_column(UserSettings::TABLE, "DateFormat"));

    vec![initial, add_date_format]
}

/// Migrates `storage` to the latest schema and opens a context on it.
pub fn open_context(storage: Arc<dyn StorageEngine>) -> Result<DbContext> {
    open_context_with(ContextOptions::new(storage))
}

/// [`open_context`] with explicit options.
pub fn open_context_with(options: ContextOptions) -> Result<DbContext> {
    Migrator::new(budget_board_migrations())?.migrate(options.storage.as_ref())?;
    Ok(DbContext::new(options))
}
