// ============================================================================
// DbContext
// ============================================================================
//
// Unit of work over a shared store. A context tracks entities, and on save
// runs change detection, the interceptor chain, and one atomic flush.
// Contexts are cheap and independent; only the store is shared.
//
// ============================================================================

mod options;

pub use options::ContextOptions;

use crate::core::{DbError, Result};
use crate::entity::EntityType;
use crate::interceptor::{DbContextEventData, InterceptionResult, InterceptorRegistry};
use crate::storage::StorageEngine;
use crate::tracking::{ChangeTracker, EntityState};
use std::sync::Arc;
use tracing::{Instrument, Level, event, info_span};
use uuid::Uuid;

pub struct DbContext {
    storage: Arc<dyn StorageEngine>,
    interceptors: InterceptorRegistry,
    tracker: ChangeTracker,
    auto_detect_changes: bool,
}

impl DbContext {
    pub fn new(options: ContextOptions) -> Self {
        let mut interceptors = if options.sanitize_strings {
            InterceptorRegistry::with_default_interceptors()
        } else {
            InterceptorRegistry::new()
        };
        for interceptor in options.interceptors {
            interceptors.register(interceptor);
        }

        Self {
            storage: options.storage,
            interceptors,
            tracker: ChangeTracker::new(),
            auto_detect_changes: options.auto_detect_changes,
        }
    }

    /// Context over `storage` with the default options.
    pub fn with_storage(storage: Arc<dyn StorageEngine>) -> Self {
        Self::new(ContextOptions::new(storage))
    }

    pub fn storage(&self) -> &Arc<dyn StorageEngine> {
        &self.storage
    }

    pub fn interceptors(&self) -> &InterceptorRegistry {
        &self.interceptors
    }

    pub fn change_tracker(&self) -> &ChangeTracker {
        &self.tracker
    }

    pub fn change_tracker_mut(&mut self) -> &mut ChangeTracker {
        &mut self.tracker
    }

    /// Tracks a new entity; it is inserted on the next save.
    pub fn add<T: EntityType>(&mut self, entity: T) -> Result<Uuid> {
        self.tracker.track(Box::new(entity), EntityState::Added)
    }

    /// Tracks an entity that already exists in the store.
    pub fn attach<T: EntityType>(&mut self, entity: T) -> Result<Uuid> {
        self.tracker.track(Box::new(entity), EntityState::Unchanged)
    }

    /// Mutates a tracked entity in place. The new state is picked up by
    /// change detection on the next save.
    pub fn update<T, F>(&mut self, key: Uuid, mutate: F) -> Result<()>
    where
        T: EntityType,
        F: FnOnce(&mut T),
    {
        let entry = self
            .tracker
            .entry_mut(&key)
            .ok_or_else(|| DbError::EntityNotFound(key.to_string()))?;
        let entity_name = entry.descriptor().entity_name;
        let typed = entry
            .entity_mut()
            .as_any_mut()
            .downcast_mut::<T>()
            .ok_or_else(|| {
                DbError::TypeMismatch(format!(
                    "entity {} is a {}, not a {}",
                    key,
                    entity_name,
                    T::entity_descriptor().entity_name
                ))
            })?;
        mutate(typed);
        Ok(())
    }

    /// Schedules a delete. An entity added in this context is simply dropped.
    pub fn remove(&mut self, key: Uuid) -> Result<()> {
        let entry = self
            .tracker
            .entry_mut(&key)
            .ok_or_else(|| DbError::EntityNotFound(key.to_string()))?;
        if entry.state() == EntityState::Added {
            self.tracker.detach(&key);
        } else {
            entry.set_state(EntityState::Deleted);
        }
        Ok(())
    }

    /// Looks an entity up in the tracker, then in the store. Loaded entities
    /// are tracked as unchanged.
    pub fn find<T: EntityType>(&mut self, key: Uuid) -> Result<Option<T>> {
        if let Some(entry) = self.tracker.entry(&key) {
            if entry.state() == EntityState::Deleted {
                return Ok(None);
            }
            return Ok(entry.entity().as_any().downcast_ref::<T>().cloned());
        }

        let table = T::entity_descriptor().table_name;
        let Some(row) = self.storage.get_row(table, key)? else {
            return Ok(None);
        };
        let schema = self.storage.schema(table)?;
        let entity = T::from_row(schema.schema(), &row)?;
        self.tracker.track(Box::new(entity.clone()), EntityState::Unchanged)?;
        Ok(Some(entity))
    }

    /// Reads every stored row of `T` without tracking.
    pub fn query<T: EntityType>(&self) -> Result<Vec<T>> {
        let table = T::entity_descriptor().table_name;
        let schema = self.storage.schema(table)?;
        self.storage
            .scan(table)?
            .iter()
            .map(|row| T::from_row(schema.schema(), row))
            .collect()
    }

    pub fn entry_state(&self, key: Uuid) -> EntityState {
        self.tracker.state(&key)
    }

    pub fn has_changes(&self) -> bool {
        self.tracker.has_changes()
    }

    /// Flushes pending changes, returning the affected row count.
    pub fn save_changes(&mut self) -> Result<usize> {
        let span = info_span!("save_changes", mode = "sync");
        let _guard = span.enter();

        if self.auto_detect_changes {
            self.tracker.detect_changes();
        }

        let mut result = InterceptionResult::Continue;
        {
            let mut event_data = DbContextEventData::new(&mut self.tracker);
            for interceptor in self.interceptors.iter() {
                result = interceptor.saving_changes(&mut event_data, result)?;
            }
        }
        if let InterceptionResult::Suppress(affected) = result {
            event!(Level::DEBUG, affected, "save suppressed by interceptor");
            return Ok(affected);
        }

        let batch = self.tracker.pending_changes();
        let outcome = if batch.is_empty() {
            Ok(0)
        } else {
            self.storage.apply(&batch)
        };
        self.finish_save(outcome)
    }

    /// Asynchronous flush; runs the same pipeline through the async hooks.
    ///
    /// ```
    /// # use budgetboard_persist::model::{Institution, open_context};
    /// # use budgetboard_persist::InMemoryStorage;
    /// # use std::sync::Arc;
    /// # tokio_test::block_on(async {
    /// let mut ctx = open_context(Arc::new(InMemoryStorage::new())).unwrap();
    /// ctx.add(Institution::new("Credit\0 Union", uuid::Uuid::new_v4())).unwrap();
    /// assert_eq!(ctx.save_changes_async().await.unwrap(), 1);
    /// # });
    /// ```
    pub async fn save_changes_async(&mut self) -> Result<usize> {
        let span = info_span!("save_changes", mode = "async");
        self.save_changes_inner_async().instrument(span).await
    }

    async fn save_changes_inner_async(&mut self) -> Result<usize> {
        if self.auto_detect_changes {
            self.tracker.detect_changes();
        }

        let mut result = InterceptionResult::Continue;
        {
            let mut event_data = DbContextEventData::new(&mut self.tracker);
            for interceptor in self.interceptors.iter() {
                result = interceptor
                    .saving_changes_async(&mut event_data, result)
                    .await?;
            }
        }
        if let InterceptionResult::Suppress(affected) = result {
            event!(Level::DEBUG, affected, "save suppressed by interceptor");
            return Ok(affected);
        }

        let batch = self.tracker.pending_changes();
        let outcome = if batch.is_empty() {
            Ok(0)
        } else {
            self.storage.apply_async(&batch).await
        };
        self.finish_save(outcome)
    }

    fn finish_save(&mut self, outcome: Result<usize>) -> Result<usize> {
        match outcome {
            Ok(mut affected) => {
                self.tracker.accept_all_changes();
                let event_data = DbContextEventData::new(&mut self.tracker);
                for interceptor in self.interceptors.iter() {
                    affected = interceptor.saved_changes(&event_data, affected);
                }
                event!(Level::DEBUG, affected, "changes saved");
                Ok(affected)
            }
            Err(err) => {
                // Entry states are kept so the caller can fix up and retry.
                let event_data = DbContextEventData::new(&mut self.tracker);
                for interceptor in self.interceptors.iter() {
                    interceptor.save_changes_failed(&event_data, &err);
                }
                event!(Level::WARN, error = %err, sqlstate = ?err.sqlstate(), "save failed");
                Err(err)
            }
        }
    }
}
