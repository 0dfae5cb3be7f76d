//! # Query Errors
//!
//! Validation errors are detected before any store access. Store errors come
//! from the query source and are never retried here.

use thiserror::Error;

/// Result type for pipeline operations
pub type QueryResult<T> = Result<T, QueryError>;

/// A malformed list request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Page below 1 or not a number
    #[error("Invalid page: {0}")]
    InvalidPage(String),

    /// Page size outside [1, max] or not a number
    #[error("Invalid page size {value}: must be between 1 and {max}")]
    InvalidPageSize { value: String, max: u32 },

    /// Sort names not present in the sort mapping table
    #[error("Invalid sort field(s): {}", .0.join(", "))]
    InvalidSortField(Vec<String>),

    /// Selected names not present in the projection table
    #[error("Invalid field(s) in selection: {}", .0.join(", "))]
    InvalidShapeField(Vec<String>),

    /// Search text longer than allowed
    #[error("Search term is {len} characters long, maximum is {max}")]
    SearchTermTooLong { len: usize, max: usize },
}

impl ValidationError {
    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::InvalidPage(_) => "SHELF_INVALID_PAGE",
            ValidationError::InvalidPageSize { .. } => "SHELF_INVALID_PAGE_SIZE",
            ValidationError::InvalidSortField(_) => "SHELF_INVALID_SORT_FIELD",
            ValidationError::InvalidShapeField(_) => "SHELF_INVALID_SHAPE_FIELD",
            ValidationError::SearchTermTooLong { .. } => "SHELF_SEARCH_TERM_TOO_LONG",
        }
    }

    /// Request parameter the error refers to
    pub fn parameter(&self) -> &'static str {
        match self {
            ValidationError::InvalidPage(_) => "page",
            ValidationError::InvalidPageSize { .. } => "pageSize",
            ValidationError::InvalidSortField(_) => "sort",
            ValidationError::InvalidShapeField(_) => "fields",
            ValidationError::SearchTermTooLong { .. } => "search",
        }
    }

    /// Offending values, for field-level detail
    pub fn invalid_values(&self) -> Vec<String> {
        match self {
            ValidationError::InvalidPage(value) => vec![value.clone()],
            ValidationError::InvalidPageSize { value, .. } => vec![value.clone()],
            ValidationError::InvalidSortField(names) => names.clone(),
            ValidationError::InvalidShapeField(names) => names.clone(),
            ValidationError::SearchTermTooLong { .. } => Vec::new(),
        }
    }
}

/// Infrastructure failure reported by a query source
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store query timed out after {0} ms")]
    Timeout(u64),
}

/// Any failure of a list query
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The caller cancelled; no partial result exists
    #[error("Query cancelled")]
    Cancelled,
}

impl QueryError {
    /// True when the request itself was malformed
    pub fn is_client_error(&self) -> bool {
        matches!(self, QueryError::Validation(_))
    }

    pub fn code(&self) -> &'static str {
        match self {
            QueryError::Validation(err) => err.code(),
            QueryError::Store(StoreError::Unavailable(_)) => "SHELF_STORE_UNAVAILABLE",
            QueryError::Store(StoreError::Timeout(_)) => "SHELF_STORE_TIMEOUT",
            QueryError::Cancelled => "SHELF_QUERY_CANCELLED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_error_lists_every_field() {
        let err = ValidationError::InvalidSortField(vec!["bogus".into(), "nope".into()]);
        assert_eq!(err.to_string(), "Invalid sort field(s): bogus, nope");
        assert_eq!(err.parameter(), "sort");
        assert_eq!(err.invalid_values(), vec!["bogus", "nope"]);
    }

    #[test]
    fn test_client_vs_infrastructure() {
        let validation = QueryError::from(ValidationError::InvalidPage("0".into()));
        let store = QueryError::from(StoreError::Timeout(500));

        assert!(validation.is_client_error());
        assert!(!store.is_client_error());
        assert!(!QueryError::Cancelled.is_client_error());
        assert_eq!(validation.code(), "SHELF_INVALID_PAGE");
        assert_eq!(store.code(), "SHELF_STORE_TIMEOUT");
    }
}
