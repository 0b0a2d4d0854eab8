use super::{EntityEntry, EntityState};
use crate::core::{DbError, Result};
use crate::entity::Entity;
use crate::transaction::Change;
use std::collections::HashMap;
use uuid::Uuid;

/// Per-context set of tracked entities.
///
/// Entries keep tracking order, which is also the order of the flush batch.
#[derive(Debug, Default)]
pub struct ChangeTracker {
    entries: Vec<EntityEntry>,
    index: HashMap<Uuid, usize>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking an entity in the given state.
    pub fn track(&mut self, entity: Box<dyn Entity>, state: EntityState) -> Result<Uuid> {
        let key = entity.key();
        if self.index.contains_key(&key) {
            return Err(DbError::AlreadyTracked(format!(
                "{}({})",
                entity.descriptor().entity_name,
                key
            )));
        }
        self.index.insert(key, self.entries.len());
        self.entries.push(EntityEntry::new(entity, state));
        Ok(key)
    }

    pub fn entry(&self, key: &Uuid) -> Option<&EntityEntry> {
        self.index.get(key).map(|idx| &self.entries[*idx])
    }

    pub fn entry_mut(&mut self, key: &Uuid) -> Option<&mut EntityEntry> {
        self.index.get(key).map(|idx| &mut self.entries[*idx])
    }

    pub fn entries(&self) -> impl Iterator<Item = &EntityEntry> {
        self.entries.iter()
    }

    pub fn entries_mut(&mut self) -> impl Iterator<Item = &mut EntityEntry> {
        self.entries.iter_mut()
    }

    pub fn state(&self, key: &Uuid) -> EntityState {
        self.entry(key)
            .map(EntityEntry::state)
            .unwrap_or(EntityState::Detached)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Marks unchanged entries whose values drifted from their snapshot as
    /// modified. Returns how many entries changed state.
    pub fn detect_changes(&mut self) -> usize {
        let mut detected = 0;
        for entry in &mut self.entries {
            if entry.state() == EntityState::Unchanged && entry.is_modified() {
                entry.set_state(EntityState::Modified);
                detected += 1;
            }
        }
        detected
    }

    pub fn has_changes(&self) -> bool {
        self.entries.iter().any(|entry| match entry.state() {
            EntityState::Added | EntityState::Deleted => true,
            EntityState::Modified => entry.is_modified(),
            EntityState::Unchanged => entry.is_modified(),
            EntityState::Detached => false,
        })
    }

    /// Builds the flush batch for every pending entry.
    ///
    /// Modified entries whose values ended up equal to the snapshot produce
    /// no change.
    pub fn pending_changes(&self) -> Vec<Change> {
        let mut batch = Vec::new();
        for entry in &self.entries {
            let table = entry.descriptor().table_name.to_string();
            let key = entry.key();
            match entry.state() {
                EntityState::Added => batch.push(Change::InsertRow {
                    table,
                    key,
                    values: entry.entity().values(),
                }),
                EntityState::Modified => {
                    let values = entry.modified_values();
                    if !values.is_empty() {
                        batch.push(Change::UpdateRow { table, key, values });
                    }
                }
                EntityState::Deleted => batch.push(Change::DeleteRow { table, key }),
                EntityState::Unchanged | EntityState::Detached => {}
            }
        }
        batch
    }

    /// Called after a successful flush: written entries become unchanged and
    /// deleted entries stop being tracked.
    ///
    /// Unchanged entries keep their snapshot, so edits not yet picked up by
    /// [`detect_changes`](Self::detect_changes) stay pending.
    pub fn accept_all_changes(&mut self) {
        self.entries
            .retain(|entry| !matches!(entry.state(), EntityState::Deleted | EntityState::Detached));
        for entry in self.entries.iter_mut().filter(|e| e.state().is_write()) {
            entry.accept_changes();
        }
        self.reindex();
    }

    /// Stops tracking an entity, returning its entry.
    pub fn detach(&mut self, key: &Uuid) -> Option<EntityEntry> {
        let idx = self.index.remove(key)?;
        let entry = self.entries.remove(idx);
        self.reindex();
        Some(entry)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    fn reindex(&mut self) {
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| (entry.key(), idx))
            .collect();
    }
}
