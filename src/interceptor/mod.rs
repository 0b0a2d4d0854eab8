//! Save interceptors.
//!
//! Interceptors are stateless objects registered on a context. They see the
//! change tracker right before the flush and may rewrite pending values or
//! suppress the store call.

use crate::core::{DbError, Result};
use crate::tracking::ChangeTracker;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{Level, event};

/// Outcome of a `saving_changes` hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterceptionResult {
    /// Proceed with the flush
    Continue,
    /// Skip the store call and report this many affected rows
    Suppress(usize),
}

impl InterceptionResult {
    pub fn is_suppressed(&self) -> bool {
        matches!(self, Self::Suppress(_))
    }
}

/// Data handed to interceptors for one save.
///
/// The context is optional: an event built with [`detached`](Self::detached)
/// carries no change tracker.
pub struct DbContextEventData<'a> {
    context: Option<&'a mut ChangeTracker>,
}

impl<'a> DbContextEventData<'a> {
    pub fn new(context: &'a mut ChangeTracker) -> Self {
        Self {
            context: Some(context),
        }
    }

    pub fn detached() -> Self {
        Self { context: None }
    }

    pub fn context(&self) -> Option<&ChangeTracker> {
        self.context.as_deref()
    }

    pub fn context_mut(&mut self) -> Option<&mut ChangeTracker> {
        self.context.as_deref_mut()
    }
}

/// Hooks around `DbContext::save_changes` and `save_changes_async`.
#[async_trait]
pub trait SaveChangesInterceptor: Send + Sync {
    /// Name for logs and errors
    fn name(&self) -> &'static str;

    /// Called before a synchronous flush
    fn saving_changes(
        &self,
        _event: &mut DbContextEventData<'_>,
        result: InterceptionResult,
    ) -> Result<InterceptionResult> {
        Ok(result)
    }

    /// Called before an asynchronous flush
    async fn saving_changes_async(
        &self,
        event: &mut DbContextEventData<'_>,
        result: InterceptionResult,
    ) -> Result<InterceptionResult> {
        self.saving_changes(event, result)
    }

    /// Called after a successful flush with the affected row count
    fn saved_changes(&self, _event: &DbContextEventData<'_>, affected: usize) -> usize {
        affected
    }

    /// Called when the store rejected the flush. The error still reaches the caller.
    fn save_changes_failed(&self, _event: &DbContextEventData<'_>, _error: &DbError) {}
}

/// Ordered set of interceptors of one context
#[derive(Clone, Default)]
pub struct InterceptorRegistry {
    interceptors: Vec<Arc<dyn SaveChangesInterceptor>>,
}

impl InterceptorRegistry {
    pub fn new() -> Self {
        Self {
            interceptors: Vec::new(),
        }
    }

    /// Register an interceptor; hooks run in registration order
    pub fn register(&mut self, interceptor: Arc<dyn SaveChangesInterceptor>) {
        event!(Level::DEBUG, interceptor = interceptor.name(), "registered save interceptor");
        self.interceptors.push(interceptor);
    }

    /// Registry with the built-in string sanitization interceptor
    pub fn with_default_interceptors() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(crate::sanitize::StringSanitizationInterceptor));
        registry
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn SaveChangesInterceptor>> {
        self.interceptors.iter()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.interceptors.iter().map(|i| i.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }
}
