// ============================================================================
// Flush Changes
// ============================================================================
//
// A Change is one row operation produced by the change tracker for a single
// flush. The storage engine applies a batch of them atomically.
//
// ============================================================================

use crate::core::Value;
use uuid::Uuid;

/// Represents a single row operation in a flush batch
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// Insert a new row. `values` holds every column of the entity.
    InsertRow {
        table: String,
        key: Uuid,
        values: Vec<(String, Value)>,
    },

    /// Update an existing row. `values` holds only the modified columns.
    UpdateRow {
        table: String,
        key: Uuid,
        values: Vec<(String, Value)>,
    },

    /// Delete an existing row
    DeleteRow { table: String, key: Uuid },
}

impl Change {
    /// Get the table name affected by this change
    pub fn table_name(&self) -> &str {
        match self {
            Change::InsertRow { table, .. } => table,
            Change::UpdateRow { table, .. } => table,
            Change::DeleteRow { table, .. } => table,
        }
    }

    /// Primary key of the affected row
    pub fn key(&self) -> Uuid {
        match self {
            Change::InsertRow { key, .. }
            | Change::UpdateRow { key, .. }
            | Change::DeleteRow { key, .. } => *key,
        }
    }

    /// Column values written by this change (empty for deletes)
    pub fn values(&self) -> &[(String, Value)] {
        match self {
            Change::InsertRow { values, .. } | Change::UpdateRow { values, .. } => values,
            Change::DeleteRow { .. } => &[],
        }
    }

    /// Short operation label used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Change::InsertRow { .. } => "insert",
            Change::UpdateRow { .. } => "update",
            Change::DeleteRow { .. } => "delete",
        }
    }
}
