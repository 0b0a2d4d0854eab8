use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Table '{0}' already exists")]
    TableExists(String),

    #[error("Table '{0}' not found")]
    TableNotFound(String),

    #[error("Column '{0}' not found in table '{1}'")]
    ColumnNotFound(String, String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Mirrors PostgreSQL SQLSTATE 22021 (`character_not_in_repertoire`).
    #[error("invalid byte sequence for encoding \"UTF8\": 0x00 in column '{column}' of table '{table}'")]
    InvalidTextEncoding { table: String, column: String },

    #[error("Entity '{0}' not found")]
    EntityNotFound(String),

    #[error("Entity '{0}' is already tracked by this context")]
    AlreadyTracked(String),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Interceptor '{name}' failed: {message}")]
    InterceptorError { name: String, message: String },

    #[error("Execution error: {0}")]
    ExecutionError(String),

    #[error("Lock error: {0}")]
    LockError(String),
}

impl DbError {
    /// SQLSTATE code of the equivalent PostgreSQL error, when one exists.
    pub fn sqlstate(&self) -> Option<&'static str> {
        match self {
            Self::InvalidTextEncoding { .. } => Some("22021"),
            Self::TableExists(_) => Some("42P07"),
            Self::TableNotFound(_) => Some("42P01"),
            Self::ColumnNotFound(_, _) => Some("42703"),
            Self::TypeMismatch(_) => Some("42804"),
            Self::ConstraintViolation(_) => Some("23000"),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, DbError>;

impl<T> From<std::sync::PoisonError<T>> for DbError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_error_carries_sqlstate() {
        let err = DbError::InvalidTextEncoding {
            table: "Transactions".into(),
            column: "MerchantName".into(),
        };
        assert_eq!(err.sqlstate(), Some("22021"));
        assert!(err.to_string().contains("MerchantName"));
        assert_eq!(DbError::ExecutionError("x".into()).sqlstate(), None);
    }
}
