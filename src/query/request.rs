//! # List Request Parsing
//!
//! Turns raw list parameters (`page`, `pageSize`, `search`/`q`, `sort`,
//! `fields`) into an immutable [`QueryRequest`]. Page, page size and search
//! length are checked here; sort and field names need the result type's
//! tables and are checked when the pipeline plans the query.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::errors::ValidationError;

/// Hard upper bound for any configured page size
pub const MAX_PAGE_SIZE: u32 = 200;

/// Page size used when the request does not name one
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Longest accepted search text, in characters
pub const DEFAULT_MAX_SEARCH_LENGTH: usize = 100;

/// Per-deployment request bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryLimits {
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,

    #[serde(default = "default_max_search_length")]
    pub max_search_length: usize,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_max_page_size() -> u32 {
    MAX_PAGE_SIZE
}

fn default_max_search_length() -> usize {
    DEFAULT_MAX_SEARCH_LENGTH
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            max_search_length: DEFAULT_MAX_SEARCH_LENGTH,
        }
    }
}

/// Unvalidated list parameters as received from a caller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawQuery {
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub fields: Option<String>,
}

impl RawQuery {
    /// Collect list parameters from an HTTP query map.
    ///
    /// `search` also answers to `q` and `Q`; unrelated keys are ignored.
    pub fn from_map(params: &HashMap<String, String>) -> Self {
        let mut raw = RawQuery::default();

        for (key, value) in params {
            match key.as_str() {
                "page" => raw.page = Some(value.clone()),
                "pageSize" => raw.page_size = Some(value.clone()),
                "search" | "q" | "Q" => {
                    // An explicit `search` wins over its aliases
                    if key == "search" || raw.search.is_none() {
                        raw.search = Some(value.clone());
                    }
                }
                "sort" => raw.sort = Some(value.clone()),
                "fields" => raw.fields = Some(value.clone()),
                _ => {}
            }
        }

        raw
    }

    pub fn page(mut self, page: impl Into<String>) -> Self {
        self.page = Some(page.into());
        self
    }

    pub fn page_size(mut self, page_size: impl Into<String>) -> Self {
        self.page_size = Some(page_size.into());
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = Some(fields.into());
        self
    }
}

/// A list request whose page, page size and search text are valid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    page: u32,
    page_size: u32,
    search: Option<String>,
    sort: Option<String>,
    fields: Option<String>,
}

impl QueryRequest {
    /// Validate raw parameters against the configured limits.
    ///
    /// Checks run in order page, page size, search; the first failure wins.
    pub fn parse(raw: &RawQuery, limits: &QueryLimits) -> Result<Self, ValidationError> {
        let page = parse_page(raw.page.as_deref())?;
        let page_size = parse_page_size(raw.page_size.as_deref(), limits)?;
        let search = parse_search(raw.search.as_deref(), limits.max_search_length)?;

        Ok(Self {
            page,
            page_size,
            search,
            sort: non_blank(raw.sort.as_deref()),
            fields: non_blank(raw.fields.as_deref()),
        })
    }

    /// Shortcut for HTTP handlers
    pub fn from_params(
        params: &HashMap<String, String>,
        limits: &QueryLimits,
    ) -> Result<Self, ValidationError> {
        Self::parse(&RawQuery::from_map(params), limits)
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Trimmed search text, `None` when absent or blank
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn sort(&self) -> Option<&str> {
        self.sort.as_deref()
    }

    pub fn fields(&self) -> Option<&str> {
        self.fields.as_deref()
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_page(value: Option<&str>) -> Result<u32, ValidationError> {
    let Some(raw) = non_blank(value) else {
        return Ok(1);
    };

    match raw.parse::<i64>() {
        Ok(page) if page >= 1 && page <= i64::from(u32::MAX) => Ok(page as u32),
        _ => Err(ValidationError::InvalidPage(raw)),
    }
}

fn parse_page_size(value: Option<&str>, limits: &QueryLimits) -> Result<u32, ValidationError> {
    let Some(raw) = non_blank(value) else {
        return Ok(limits.default_page_size);
    };

    match raw.parse::<i64>() {
        Ok(size) if size >= 1 && size <= i64::from(limits.max_page_size) => Ok(size as u32),
        _ => Err(ValidationError::InvalidPageSize {
            value: raw,
            max: limits.max_page_size,
        }),
    }
}

fn parse_search(value: Option<&str>, max_len: usize) -> Result<Option<String>, ValidationError> {
    let Some(term) = non_blank(value) else {
        return Ok(None);
    };

    let len = term.chars().count();
    if len > max_len {
        return Err(ValidationError::SearchTermTooLong { len, max: max_len });
    }

    Ok(Some(term))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> QueryLimits {
        QueryLimits::default()
    }

    #[test]
    fn test_defaults() {
        let request = QueryRequest::parse(&RawQuery::default(), &limits()).unwrap();
        assert_eq!(request.page(), 1);
        assert_eq!(request.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(request.search(), None);
        assert_eq!(request.sort(), None);
        assert_eq!(request.fields(), None);
    }

    #[test]
    fn test_full_params_from_map() {
        let mut params = HashMap::new();
        params.insert("page".to_string(), "3".to_string());
        params.insert("pageSize".to_string(), "20".to_string());
        params.insert("q".to_string(), "  dragons ".to_string());
        params.insert("sort".to_string(), "title desc".to_string());
        params.insert("fields".to_string(), "id,title".to_string());
        params.insert("unrelated".to_string(), "ignored".to_string());

        let request = QueryRequest::from_params(&params, &limits()).unwrap();

        assert_eq!(request.page(), 3);
        assert_eq!(request.page_size(), 20);
        assert_eq!(request.search(), Some("dragons"));
        assert_eq!(request.sort(), Some("title desc"));
        assert_eq!(request.fields(), Some("id,title"));
    }

    #[test]
    fn test_search_aliases() {
        let mut params = HashMap::new();
        params.insert("Q".to_string(), "elves".to_string());
        assert_eq!(RawQuery::from_map(&params).search.as_deref(), Some("elves"));

        params.insert("search".to_string(), "orcs".to_string());
        assert_eq!(RawQuery::from_map(&params).search.as_deref(), Some("orcs"));
    }

    #[test]
    fn test_invalid_page() {
        for page in ["0", "-1", "abc", "1.5"] {
            let result = QueryRequest::parse(&RawQuery::default().page(page), &limits());
            assert_eq!(result, Err(ValidationError::InvalidPage(page.to_string())));
        }
    }

    #[test]
    fn test_page_size_bounds() {
        for size in ["0", "201", "-5", "ten"] {
            let result = QueryRequest::parse(&RawQuery::default().page_size(size), &limits());
            assert!(matches!(result, Err(ValidationError::InvalidPageSize { max: 200, .. })));
        }

        for size in ["1", "200"] {
            let result = QueryRequest::parse(&RawQuery::default().page_size(size), &limits());
            assert!(result.is_ok());
        }
    }

    #[test]
    fn test_configured_max_page_size() {
        let limits = QueryLimits {
            max_page_size: 25,
            default_page_size: 10,
            ..QueryLimits::default()
        };
        let result = QueryRequest::parse(&RawQuery::default().page_size("26"), &limits);
        assert!(matches!(result, Err(ValidationError::InvalidPageSize { max: 25, .. })));
    }

    #[test]
    fn test_search_too_long() {
        let long = "x".repeat(DEFAULT_MAX_SEARCH_LENGTH + 1);
        let result = QueryRequest::parse(&RawQuery::default().search(long), &limits());
        assert_eq!(
            result,
            Err(ValidationError::SearchTermTooLong {
                len: DEFAULT_MAX_SEARCH_LENGTH + 1,
                max: DEFAULT_MAX_SEARCH_LENGTH
            })
        );
    }

    #[test]
    fn test_search_length_counts_characters() {
        let term = "é".repeat(DEFAULT_MAX_SEARCH_LENGTH);
        assert!(QueryRequest::parse(&RawQuery::default().search(term), &limits()).is_ok());
    }

    #[test]
    fn test_blank_search_is_absent() {
        let request = QueryRequest::parse(&RawQuery::default().search("   "), &limits()).unwrap();
        assert_eq!(request.search(), None);
    }

    #[test]
    fn test_page_checked_before_page_size() {
        let raw = RawQuery::default().page("0").page_size("0");
        let result = QueryRequest::parse(&raw, &limits());
        assert!(matches!(result, Err(ValidationError::InvalidPage(_))));
    }
}
