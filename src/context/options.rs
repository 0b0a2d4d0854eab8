use crate::interceptor::SaveChangesInterceptor;
use crate::storage::StorageEngine;
use crate::storage::config::parse_flag;
use std::fmt;
use std::sync::Arc;

/// Context configuration
///
/// Built like a connection config: start from [`ContextOptions::new`] and
/// chain setters.
#[derive(Clone)]
pub struct ContextOptions {
    /// Store the context flushes into
    pub storage: Arc<dyn StorageEngine>,

    /// Custom interceptors, run after the built-in ones
    pub interceptors: Vec<Arc<dyn SaveChangesInterceptor>>,

    /// Run change detection at the start of every save
    pub auto_detect_changes: bool,

    /// Register the NUL-stripping interceptor
    pub sanitize_strings: bool,
}

impl ContextOptions {
    /// Create options for a store with the default interceptors
    pub fn new(storage: Arc<dyn StorageEngine>) -> Self {
        Self {
            storage,
            interceptors: Vec::new(),
            auto_detect_changes: true,
            sanitize_strings: true,
        }
    }

    /// Add a custom interceptor
    pub fn interceptor(mut self, interceptor: Arc<dyn SaveChangesInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Enable or disable change detection on save
    pub fn auto_detect_changes(mut self, enabled: bool) -> Self {
        self.auto_detect_changes = enabled;
        self
    }

    /// Enable or disable the string sanitization interceptor
    pub fn sanitize_strings(mut self, enabled: bool) -> Self {
        self.sanitize_strings = enabled;
        self
    }

    /// Apply overrides from `BUDGETBOARD_SANITIZE_STRINGS` and
    /// `BUDGETBOARD_AUTO_DETECT_CHANGES`
    pub fn from_env(storage: Arc<dyn StorageEngine>) -> Self {
        Self::from_vars(storage, |key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`
    pub fn from_vars(
        storage: Arc<dyn StorageEngine>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let mut options = Self::new(storage);
        if let Some(raw) = lookup("BUDGETBOARD_SANITIZE_STRINGS")
            && let Some(flag) = parse_flag(&raw)
        {
            options.sanitize_strings = flag;
        }
        if let Some(raw) = lookup("BUDGETBOARD_AUTO_DETECT_CHANGES")
            && let Some(flag) = parse_flag(&raw)
        {
            options.auto_detect_changes = flag;
        }
        options
    }
}

impl fmt::Debug for ContextOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.interceptors.iter().map(|i| i.name()).collect();
        f.debug_struct("ContextOptions")
            .field("interceptors", &names)
            .field("auto_detect_changes", &self.auto_detect_changes)
            .field("sanitize_strings", &self.sanitize_strings)
            .finish()
    }
}
