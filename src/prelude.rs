//! Common imports for application code.
//!
//! ```
//! use budgetboard_persist::prelude::*;
//! ```

pub use crate::context::{ContextOptions, DbContext};
pub use crate::core::{DbError, Result, Value};
pub use crate::entity::{Entity, EntityType};
pub use crate::entity_struct;
pub use crate::interceptor::{DbContextEventData, InterceptionResult, SaveChangesInterceptor};
pub use crate::model::{Account, Institution, Transaction, UserSettings, open_context};
pub use crate::settings::{DateFormat, Language, LocalePreferences};
pub use crate::storage::{InMemoryStorage, StorageConfig, StorageEngine};
pub use crate::tracking::EntityState;
