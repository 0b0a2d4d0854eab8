use crate::core::{DataType, DbError, Result, Value};
use crate::entity::{Entity, EntityDescriptor};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Pending write intent of a tracked entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityState {
    /// Not tracked by the context
    Detached,
    /// Tracked, matches what is stored
    Unchanged,
    /// Will be inserted on the next save
    Added,
    /// Will be updated on the next save
    Modified,
    /// Will be deleted on the next save
    Deleted,
}

impl EntityState {
    /// Insert or update: states whose values are written on save.
    pub fn is_write(&self) -> bool {
        matches!(self, Self::Added | Self::Modified)
    }
}

impl fmt::Display for EntityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Detached => "Detached",
            Self::Unchanged => "Unchanged",
            Self::Added => "Added",
            Self::Modified => "Modified",
            Self::Deleted => "Deleted",
        };
        write!(f, "{}", label)
    }
}

/// Snapshot of one property of a tracked entity.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyEntry {
    pub name: &'static str,
    pub data_type: DataType,
    pub current_value: Value,
    pub original_value: Value,
}

impl PropertyEntry {
    pub fn is_modified(&self) -> bool {
        !self.current_value.is_identical(&self.original_value)
    }
}

/// A tracked entity with its state and original-value snapshot.
pub struct EntityEntry {
    entity: Box<dyn Entity>,
    state: EntityState,
    original_values: Vec<Value>,
}

impl EntityEntry {
    pub(crate) fn new(entity: Box<dyn Entity>, state: EntityState) -> Self {
        let original_values = snapshot(entity.as_ref());
        Self {
            entity,
            state,
            original_values,
        }
    }

    pub fn key(&self) -> Uuid {
        self.entity.key()
    }

    pub fn state(&self) -> EntityState {
        self.state
    }

    pub fn set_state(&mut self, state: EntityState) {
        self.state = state;
    }

    pub fn descriptor(&self) -> &'static EntityDescriptor {
        self.entity.descriptor()
    }

    pub fn entity(&self) -> &dyn Entity {
        self.entity.as_ref()
    }

    pub fn entity_mut(&mut self) -> &mut dyn Entity {
        self.entity.as_mut()
    }

    /// All properties in descriptor order.
    pub fn properties(&self) -> Vec<PropertyEntry> {
        self.descriptor()
            .properties
            .iter()
            .zip(self.original_values.iter())
            .map(|(p, original)| PropertyEntry {
                name: p.name,
                data_type: p.data_type,
                current_value: self.entity.property(p.name).unwrap_or(Value::Null),
                original_value: original.clone(),
            })
            .collect()
    }

    pub fn property(&self, name: &str) -> Option<PropertyEntry> {
        self.properties().into_iter().find(|p| p.name == name)
    }

    /// Writes a new current value into the entity's field.
    pub fn set_current_value(&mut self, name: &str, value: Value) -> Result<()> {
        let descriptor = self.descriptor();
        let property = descriptor.property(name).ok_or_else(|| {
            DbError::ColumnNotFound(name.to_string(), descriptor.table_name.to_string())
        })?;
        if !property.data_type.is_compatible(&value) {
            return Err(DbError::TypeMismatch(format!(
                "{}.{} expects {}, got {}",
                descriptor.table_name,
                name,
                property.data_type,
                value.type_name()
            )));
        }
        self.entity.set_property(name, value)
    }

    pub fn is_modified(&self) -> bool {
        self.properties().iter().any(PropertyEntry::is_modified)
    }

    /// Columns whose current value differs from the snapshot.
    pub fn modified_values(&self) -> Vec<(String, Value)> {
        self.properties()
            .into_iter()
            .filter(PropertyEntry::is_modified)
            .map(|p| (p.name.to_string(), p.current_value))
            .collect()
    }

    /// Marks the current values as stored.
    pub(crate) fn accept_changes(&mut self) {
        self.original_values = snapshot(self.entity.as_ref());
        self.state = EntityState::Unchanged;
    }
}

impl fmt::Debug for EntityEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityEntry")
            .field("entity", &self.descriptor().entity_name)
            .field("key", &self.key())
            .field("state", &self.state)
            .finish()
    }
}

fn snapshot(entity: &dyn Entity) -> Vec<Value> {
    entity
        .descriptor()
        .properties
        .iter()
        .map(|p| entity.property(p.name).unwrap_or(Value::Null))
        .collect()
}
