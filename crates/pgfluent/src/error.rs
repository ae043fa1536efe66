//! Error types for pgfluent

use thiserror::Error;

/// Result type alias for pgfluent operations
pub type FluentResult<T> = Result<T, FluentError>;

/// Error types for database operations
#[derive(Debug, Error)]
pub enum FluentError {
    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// A terminal operation failed against the driver.
    ///
    /// Wraps the underlying error with the operation and table so callers can
    /// tell which statement failed without losing the original message.
    #[error("{op} on `{table}` failed: {source}")]
    Operation {
        op: &'static str,
        table: String,
        #[source]
        source: Box<FluentError>,
    },

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique constraint violation
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Check constraint violation: {0}")]
    CheckViolation(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Caller-contract violation, detected before any I/O
    #[error("Validation error: {0}")]
    Validation(String),

    /// Pool error
    #[error("Pool error: {0}")]
    Pool(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl FluentError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Wrap a driver failure with the terminal operation and target table.
    ///
    /// Validation errors are caller bugs resolved before I/O and pass through
    /// unwrapped.
    pub fn operation(op: &'static str, table: impl Into<String>, source: FluentError) -> Self {
        match source {
            err @ Self::Validation(_) => err,
            source => Self::Operation {
                op,
                table: table.into(),
                source: Box::new(source),
            },
        }
    }

    /// Check if this is a validation (caller-contract) error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Parse a tokio_postgres error into a more specific FluentError
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let constraint = db_err.constraint().unwrap_or("unknown");
            let message = db_err.message();

            match db_err.code().code() {
                "23505" => return Self::UniqueViolation(format!("{}: {}", constraint, message)),
                "23503" => {
                    return Self::ForeignKeyViolation(format!("{}: {}", constraint, message));
                }
                "23514" => return Self::CheckViolation(format!("{}: {}", constraint, message)),
                _ => {}
            }
        }
        Self::Query(err)
    }
}

impl From<deadpool_postgres::PoolError> for FluentError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_wrap_keeps_source_message() {
        let err = FluentError::operation("GET", "users", FluentError::Other("boom".to_string()));
        assert_eq!(err.to_string(), "GET on `users` failed: boom");
    }

    #[test]
    fn operation_wrap_passes_validation_through() {
        let err = FluentError::operation(
            "UPDATE",
            "users",
            FluentError::validation("UPDATE requires at least one predicate"),
        );
        assert!(err.is_validation());
        assert_eq!(
            err.to_string(),
            "Validation error: UPDATE requires at least one predicate"
        );
    }
}
