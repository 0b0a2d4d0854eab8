//! Entity introspection.
//!
//! Entities expose their columns through [`Entity::property`] and
//! [`Entity::set_property`], so save interceptors can walk any tracked
//! entity without knowing its concrete type. The [`entity_struct!`] macro
//! generates both the struct and this plumbing.
//!
//! [`entity_struct!`]: crate::entity_struct

use crate::core::{Column, DataType, DbError, Result, Row, Schema, Value};
use crate::storage::TableSchema;
use std::any::Any;
use uuid::Uuid;

mod field;
mod macros;

pub use field::PersistField;

/// Column-level metadata of an entity property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyDescriptor {
    /// Column name in storage
    pub name: &'static str,
    /// Rust field name
    pub field: &'static str,
    pub data_type: DataType,
    pub nullable: bool,
}

/// Static description of an entity type.
#[derive(Debug)]
pub struct EntityDescriptor {
    pub entity_name: &'static str,
    pub table_name: &'static str,
    pub properties: &'static [PropertyDescriptor],
}

impl EntityDescriptor {
    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn text_properties(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.properties.iter().filter(|p| p.data_type.is_text())
    }

    /// Table schema matching the current shape of the entity.
    pub fn table_schema(&self) -> TableSchema {
        let columns = self
            .properties
            .iter()
            .map(|p| {
                let column = Column::new(p.name, p.data_type);
                if p.nullable { column } else { column.not_null() }
            })
            .collect();
        TableSchema::new(self.table_name, columns)
    }
}

/// An object that can be tracked by a [`DbContext`](crate::DbContext).
pub trait Entity: Any + Send + Sync {
    fn descriptor(&self) -> &'static EntityDescriptor;

    /// Primary key.
    fn key(&self) -> Uuid;

    /// Current value of a column, `None` when the column is unknown.
    fn property(&self, name: &str) -> Option<Value>;

    /// Writes a column value back into the field it came from.
    fn set_property(&mut self, name: &str, value: Value) -> Result<()>;

    fn clone_entity(&self) -> Box<dyn Entity>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// All column values in descriptor order.
    fn values(&self) -> Vec<(String, Value)> {
        self.descriptor()
            .properties
            .iter()
            .map(|p| (p.name.to_string(), self.property(p.name).unwrap_or(Value::Null)))
            .collect()
    }
}

/// Statically known entity types, loadable from storage rows.
pub trait EntityType: Entity + Clone + Sized {
    fn entity_descriptor() -> &'static EntityDescriptor;

    /// Builds an entity from a stored row laid out by `schema`.
    fn from_row(schema: &Schema, row: &Row) -> Result<Self>;
}

/// Reads one column of a stored row for [`EntityType::from_row`].
pub fn column_value<T: PersistField>(
    table: &str,
    schema: &Schema,
    row: &Row,
    column: &str,
) -> Result<T> {
    let idx = schema
        .find_column_index(column)
        .ok_or_else(|| DbError::ColumnNotFound(column.to_string(), table.to_string()))?;
    let value = row.get(idx).cloned().unwrap_or(Value::Null);
    T::from_value(value).map_err(|err| match err {
        DbError::TypeMismatch(msg) => {
            DbError::TypeMismatch(format!("{}.{}: {}", table, column, msg))
        }
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use crate::entity::{Entity, EntityType};
    use crate::{DataType, Value};
    use uuid::Uuid;

    crate::entity_struct! {
        struct Note table = "Notes" {
            id: Uuid => "Id",
            title: String => "Title",
            body: Option<String> => "Body",
            pinned: bool => "Pinned",
        }
    }

    fn note() -> Note {
        Note {
            id: Uuid::new_v4(),
            title: "groceries".into(),
            body: None,
            pinned: false,
        }
    }

    #[test]
    fn test_descriptor_lists_columns() {
        let descriptor = Note::entity_descriptor();
        assert_eq!(descriptor.entity_name, "Note");
        assert_eq!(descriptor.table_name, "Notes");
        assert_eq!(descriptor.properties.len(), 4);
        assert_eq!(descriptor.property("Body").unwrap().field, "body");
        assert!(descriptor.property("Body").unwrap().nullable);
        assert!(!descriptor.property("Title").unwrap().nullable);
        let text: Vec<_> = descriptor.text_properties().map(|p| p.name).collect();
        assert_eq!(text, vec!["Title", "Body"]);
    }

    #[test]
    fn test_property_round_trip_through_setter() {
        let mut note = note();
        note.set_property("Body", Value::from("milk")).unwrap();
        assert_eq!(note.body.as_deref(), Some("milk"));
        note.set_property("Body", Value::Null).unwrap();
        assert_eq!(note.body, None);
        assert_eq!(note.property("Pinned"), Some(Value::Boolean(false)));
        assert_eq!(note.property("Missing"), None);
    }

    #[test]
    fn test_setter_rejects_wrong_type_and_unknown_column() {
        let mut note = note();
        assert!(note.set_property("Title", Value::Integer(1)).is_err());
        assert!(note.set_property("Title", Value::Null).is_err());
        assert!(note.set_property("Nope", Value::Null).is_err());
    }

    #[test]
    fn test_from_row_uses_schema_order() {
        let original = note();
        let schema = Note::entity_descriptor().table_schema();
        let row: Vec<Value> = schema
            .schema()
            .columns()
            .iter()
            .map(|c| original.property(&c.name).unwrap())
            .collect();
        let loaded = Note::from_row(schema.schema(), &row).unwrap();
        assert_eq!(loaded, original);
        assert_eq!(schema.schema().get_column("Pinned").unwrap().data_type, DataType::Boolean);
    }
}
