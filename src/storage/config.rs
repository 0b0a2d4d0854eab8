/// Storage configuration
///
/// Mirrors the knobs of the PostgreSQL database BudgetBoard runs on that
/// matter for persistence behaviour.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Database name, used in log output
    pub name: String,

    /// Reject text values the server encoding cannot hold (NUL characters),
    /// the way PostgreSQL does for UTF8 databases
    pub strict_text_encoding: bool,
}

impl StorageConfig {
    /// Create a new storage configuration with strict text validation
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            strict_text_encoding: true,
        }
    }

    /// Set the database name
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Enable or disable strict text encoding validation
    pub fn strict_text_encoding(mut self, strict: bool) -> Self {
        self.strict_text_encoding = strict;
        self
    }

    /// Apply overrides from `BUDGETBOARD_DB_NAME` and `BUDGETBOARD_STRICT_TEXT`
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(name) = lookup("BUDGETBOARD_DB_NAME") {
            config.name = name;
        }
        if let Some(flag) = lookup("BUDGETBOARD_STRICT_TEXT")
            && let Some(strict) = parse_flag(&flag)
        {
            config.strict_text_encoding = strict;
        }
        config
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new("budgetboard")
    }
}

/// Parses the boolean spellings accepted in environment overrides.
pub(crate) fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
