//! NUL stripping for text columns.
//!
//! PostgreSQL rejects U+0000 in text values (SQLSTATE 22021) and aborts the
//! whole transaction. [`StringSanitizationInterceptor`] removes NUL
//! characters from every text property of inserted and updated entities
//! right before the flush, so that error never reaches callers.

use crate::core::{Result, Value};
use crate::interceptor::{DbContextEventData, InterceptionResult, SaveChangesInterceptor};
use crate::tracking::ChangeTracker;
use async_trait::async_trait;
use std::borrow::Cow;
use tracing::{Level, event};

pub fn contains_nul(text: &str) -> bool {
    text.contains('\0')
}

/// Removes every NUL character, borrowing when there is nothing to remove.
pub fn strip_nul(text: &str) -> Cow<'_, str> {
    if contains_nul(text) {
        Cow::Owned(text.chars().filter(|c| *c != '\0').collect())
    } else {
        Cow::Borrowed(text)
    }
}

/// Save interceptor that strips NUL characters from pending text values.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringSanitizationInterceptor;

impl StringSanitizationInterceptor {
    /// Sanitizes every Added or Modified entry. Returns the number of
    /// rewritten fields. An absent context is a no-op.
    pub fn sanitize(context: Option<&mut ChangeTracker>) -> usize {
        let Some(tracker) = context else {
            return 0;
        };

        let mut repaired = 0;
        for entry in tracker.entries_mut().filter(|e| e.state().is_write()) {
            let entity_name = entry.descriptor().entity_name;
            let dirty: Vec<(&'static str, String)> = entry
                .properties()
                .into_iter()
                .filter(|p| p.data_type.is_text())
                .filter_map(|p| match p.current_value {
                    Value::Text(text) if contains_nul(&text) => Some((p.name, text)),
                    _ => None,
                })
                .collect();

            for (column, text) in dirty {
                let cleaned = strip_nul(&text).into_owned();
                let removed = text.len() - cleaned.len();
                match entry.set_current_value(column, Value::Text(cleaned)) {
                    Ok(()) => {
                        repaired += 1;
                        event!(
                            Level::DEBUG,
                            entity = entity_name,
                            column,
                            removed,
                            "stripped NUL characters"
                        );
                    }
                    Err(err) => {
                        event!(
                            Level::WARN,
                            entity = entity_name,
                            column,
                            error = %err,
                            "could not write sanitized value"
                        );
                    }
                }
            }
        }
        repaired
    }
}

#[async_trait]
impl SaveChangesInterceptor for StringSanitizationInterceptor {
    fn name(&self) -> &'static str {
        "string_sanitization"
    }

    fn saving_changes(
        &self,
        event: &mut DbContextEventData<'_>,
        result: InterceptionResult,
    ) -> Result<InterceptionResult> {
        Self::sanitize(event.context_mut());
        Ok(result)
    }

    async fn saving_changes_async(
        &self,
        event: &mut DbContextEventData<'_>,
        result: InterceptionResult,
    ) -> Result<InterceptionResult> {
        Self::sanitize(event.context_mut());
        Ok(result)
    }
}
