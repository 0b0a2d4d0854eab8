// ============================================================================
// BudgetBoard persistence library
// ============================================================================

pub mod context;
pub mod core;
pub mod entity;
pub mod interceptor;
pub mod migration;
pub mod model;
pub mod prelude;
pub mod sanitize;
pub mod settings;
pub mod storage;
pub mod tracking;
pub mod transaction;

#[doc(hidden)]
pub use uuid;

// Re-export main types for convenience
pub use context::{ContextOptions, DbContext};
pub use core::{DataType, DbError, Result, Value};
pub use entity::{Entity, EntityType};
pub use interceptor::{
    DbContextEventData, InterceptionResult, InterceptorRegistry, SaveChangesInterceptor,
};
pub use migration::{Migrator, SchemaMigration, SchemaOperation};
pub use sanitize::{StringSanitizationInterceptor, strip_nul};
pub use storage::{InMemoryStorage, StorageConfig, StorageEngine};
pub use tracking::{ChangeTracker, EntityState};
