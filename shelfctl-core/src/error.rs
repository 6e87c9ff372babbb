/// Structured error types for shelfctl-core.
///
/// Uses `thiserror` for better API surface and error composition.
/// The binary crate (shelfctl-cli) can still use `anyhow` for convenience,
/// but library consumers get structured, composable errors.

use thiserror::Error;
use uuid::Uuid;

/// Main error type for shelfctl-core operations
#[derive(Error, Debug)]
pub enum ShelfError {
    /// Configuration error (missing or malformed environment variable)
    #[error("Configuration error: {reason}")]
    Config { reason: String },

    /// Query execution or connection failure, straight from sqlx
    #[error("Database error: {source}")]
    Database {
        #[from]
        source: sqlx::Error,
    },

    /// Single-row lookup matched nothing
    #[error("Book not found: {book_id}")]
    BookNotFound { book_id: Uuid },
}

/// Result type alias for shelfctl-core operations
pub type Result<T> = std::result::Result<T, ShelfError>;

impl ShelfError {
    /// Create a config error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Create a book-not-found error
    pub fn book_not_found(book_id: Uuid) -> Self {
        Self::BookNotFound { book_id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::uuid;

    #[test]
    fn test_error_display() {
        let err = ShelfError::config("POSTGRES_PORT is not a number");
        assert_eq!(
            err.to_string(),
            "Configuration error: POSTGRES_PORT is not a number"
        );

        let err = ShelfError::book_not_found(uuid!("1fb112d1-54c9-4308-99c6-0163bfd0172d"));
        assert!(err.to_string().contains("Book not found"));
        assert!(err.to_string().contains("1fb112d1"));
    }

    #[test]
    fn test_sqlx_error_conversion() {
        let shelf_err: ShelfError = sqlx::Error::RowNotFound.into();
        assert!(matches!(shelf_err, ShelfError::Database { .. }));
    }
}
