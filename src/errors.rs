//! Error handling for the pagination core
//!
//! A small closed set of error kinds. `NotFound` is the only one callers are
//! expected to recover from locally (by falling back to the first page);
//! everything else propagates to the boundary as a user-visible failure.

use thiserror::Error;

/// Main error type for pagination operations
#[derive(Error, Debug)]
pub enum PageError {
    #[error("Invalid sort: {message}")]
    InvalidSort { message: String },

    #[error("Invalid filter: {field} - {message}")]
    InvalidFilter { field: String, message: String },

    #[error("Invalid cursor '{value}': {message}")]
    InvalidCursor { value: String, message: String },

    #[error("Logs not found: {resource}")]
    NotFound { resource: String },

    #[error("Query failed: {operation} - {source}")]
    QueryFailed {
        operation: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Type alias for Result with PageError
pub type PageResult<T> = Result<T, PageError>;

impl PageError {
    /// Create an invalid sort error
    pub fn invalid_sort(message: impl Into<String>) -> Self {
        Self::InvalidSort {
            message: message.into(),
        }
    }

    /// Create an invalid filter error
    pub fn invalid_filter(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidFilter {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an invalid cursor error
    pub fn invalid_cursor(value: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidCursor {
            value: value.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Wrap a store failure with the name of the operation that issued it
    pub fn query_failed(
        operation: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::QueryFailed {
            operation: operation.into(),
            source: Box::new(source),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PageError::NotFound { .. })
    }
}

/// Errors raised by a `LogStore` backend
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("failed to decode column {column}: {message}")]
    Decode { column: String, message: String },
}

impl StoreError {
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }
}
