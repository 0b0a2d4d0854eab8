use crate::core::{Column, DbError, Result, Row, Schema, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Name of the primary key column every table carries.
pub const KEY_COLUMN: &str = "Id";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    name: String,
    schema: Schema,
}

impl TableSchema {
    /// Builds a table schema. The `Id` key column is prepended when missing.
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        let mut all = Vec::with_capacity(columns.len() + 1);
        if !columns.iter().any(|c| c.name == KEY_COLUMN) {
            all.push(Column::new(KEY_COLUMN, crate::core::DataType::Uuid).not_null());
        }
        all.extend(columns);
        Self {
            name: name.into(),
            schema: Schema::new(all),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub(crate) fn schema_mut(&mut self) -> &mut Schema {
        &mut self.schema
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    schema: TableSchema,
    rows: BTreeMap<Uuid, Row>,
}

impl Table {
    pub fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            rows: BTreeMap::new(),
        }
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn get(&self, key: &Uuid) -> Option<&Row> {
        self.rows.get(key)
    }

    pub fn contains(&self, key: &Uuid) -> bool {
        self.rows.contains_key(key)
    }

    pub fn scan(&self) -> Vec<Row> {
        self.rows.values().cloned().collect()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Builds a full row for an insert, filling absent columns with their default.
    pub fn build_insert_row(&self, key: Uuid, values: &[(String, Value)]) -> Result<Row> {
        self.check_columns(values)?;

        let mut row = Vec::with_capacity(self.schema.schema().column_count());
        for column in self.schema.schema().columns() {
            let value = if column.name == KEY_COLUMN {
                Value::Uuid(key)
            } else {
                values
                    .iter()
                    .find(|(name, _)| *name == column.name)
                    .map(|(_, v)| v.clone())
                    .or_else(|| column.default.clone())
                    .unwrap_or(Value::Null)
            };
            column.validate(&value)?;
            row.push(value);
        }
        Ok(row)
    }

    /// Applies column updates on top of an existing row.
    pub fn build_update_row(&self, current: &Row, values: &[(String, Value)]) -> Result<Row> {
        self.check_columns(values)?;

        let mut row = current.clone();
        for (name, value) in values {
            if name == KEY_COLUMN {
                return Err(DbError::ConstraintViolation(format!(
                    "Primary key of table '{}' cannot be updated",
                    self.schema.name()
                )));
            }
            let idx = self.column_index(name)?;
            self.schema.schema().columns()[idx].validate(value)?;
            row[idx] = value.clone();
        }
        Ok(row)
    }

    pub fn put(&mut self, key: Uuid, row: Row) {
        self.rows.insert(key, row);
    }

    pub fn remove(&mut self, key: &Uuid) -> Option<Row> {
        self.rows.remove(key)
    }

    /// Adds a column, back-filling existing rows with its default.
    pub fn add_column(&mut self, column: Column) -> Result<()> {
        if self.schema.schema().find_column_index(&column.name).is_some() {
            return Err(DbError::ConstraintViolation(format!(
                "Column '{}' already exists in table '{}'",
                column.name,
                self.schema.name()
            )));
        }

        let fill = column.default.clone().unwrap_or(Value::Null);
        if !self.rows.is_empty() {
            column.validate(&fill)?;
        }

        for row in self.rows.values_mut() {
            row.push(fill.clone());
        }
        self.schema.schema_mut().push_column(column);
        Ok(())
    }

    pub fn drop_column(&mut self, name: &str) -> Result<()> {
        if name == KEY_COLUMN {
            return Err(DbError::ConstraintViolation(format!(
                "Primary key of table '{}' cannot be dropped",
                self.schema.name()
            )));
        }
        let idx = self.column_index(name)?;
        for row in self.rows.values_mut() {
            row.remove(idx);
        }
        self.schema.schema_mut().remove_column(idx);
        Ok(())
    }

    fn column_index(&self, name: &str) -> Result<usize> {
        self.schema
            .schema()
            .find_column_index(name)
            .ok_or_else(|| {
                DbError::ColumnNotFound(name.to_string(), self.schema.name().to_string())
            })
    }

    fn check_columns(&self, values: &[(String, Value)]) -> Result<()> {
        for (name, _) in values {
            self.column_index(name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DataType;

    fn settings_table() -> Table {
        Table::new(TableSchema::new(
            "UserSettings",
            vec![Column::new("Currency", DataType::Text).not_null()],
        ))
    }

    #[test]
    fn test_key_column_is_prepended() {
        let table = settings_table();
        let columns = table.schema().schema().columns();
        assert_eq!(columns[0].name, KEY_COLUMN);
        assert_eq!(columns.len(), 2);
    }

    #[test]
    fn test_add_column_backfills_default() {
        let mut table = settings_table();
        let key = Uuid::new_v4();
        let row = table
            .build_insert_row(key, &[("Currency".into(), Value::from("USD"))])
            .unwrap();
        table.put(key, row);

        table
            .add_column(
                Column::new("DateFormat", DataType::Text)
                    .not_null()
                    .default_value("default"),
            )
            .unwrap();

        let row = table.get(&key).unwrap();
        assert_eq!(row[2], Value::from("default"));
    }

    #[test]
    fn test_add_not_null_column_without_default_fails_on_rows() {
        let mut table = settings_table();
        let key = Uuid::new_v4();
        let row = table
            .build_insert_row(key, &[("Currency".into(), Value::from("USD"))])
            .unwrap();
        table.put(key, row);

        let result = table.add_column(Column::new("Language", DataType::Text).not_null());
        assert!(matches!(result, Err(DbError::ConstraintViolation(_))));
    }

    #[test]
    fn test_drop_column_removes_values() {
        let mut table = settings_table();
        let key = Uuid::new_v4();
        let row = table
            .build_insert_row(key, &[("Currency".into(), Value::from("EUR"))])
            .unwrap();
        table.put(key, row);

        table.drop_column("Currency").unwrap();
        assert_eq!(table.get(&key).unwrap().len(), 1);
        assert!(table.drop_column(KEY_COLUMN).is_err());
    }

    #[test]
    fn test_unknown_column_rejected() {
        let table = settings_table();
        let result = table.build_insert_row(Uuid::new_v4(), &[("Nope".into(), Value::Null)]);
        assert!(matches!(result, Err(DbError::ColumnNotFound(_, _))));
    }
}
