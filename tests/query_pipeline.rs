//! Query Pipeline Tests
//!
//! End-to-end list queries over the in-memory catalog:
//! - Pages partition the filtered, sorted sequence exactly
//! - Sort resolution (defaults, reverse, duplicates, tiebreaker)
//! - Validation order and batched error reporting
//! - Cancellation

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use storyshelf::catalog::{Catalog, CatalogSeed, Tag};
use storyshelf::markdown::MarkdownValidator;
use storyshelf::observability::MetricsRegistry;
use storyshelf::query::{
    PagedResult, QueryError, QueryLimits, QueryPipeline, QueryRequest, RawQuery, ValidationError,
};

// =============================================================================
// Helper Functions
// =============================================================================

fn tag_catalog(tags: &[(&str, &str, u64)]) -> Catalog {
    let base = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let seed = CatalogSeed {
        tags: tags
            .iter()
            .enumerate()
            .map(|(i, (category, value, usage))| Tag {
                id: Uuid::new_v4(),
                category: category.to_string(),
                value: value.to_string(),
                usage_count: *usage,
                created_at: base + Duration::minutes(i as i64),
            })
            .collect(),
        ..CatalogSeed::default()
    };
    Catalog::from_seed(seed, MarkdownValidator::default()).unwrap()
}

fn numbered_tags(count: usize) -> Catalog {
    let values: Vec<String> = (0..count).map(|i| format!("tag {:03}", i)).collect();
    let tags: Vec<(&str, &str, u64)> = values
        .iter()
        .map(|v| ("genre", v.as_str(), 1))
        .collect();
    tag_catalog(&tags)
}

fn pipeline() -> QueryPipeline {
    QueryPipeline::new(Arc::new(MetricsRegistry::new()))
}

async fn list_tags(catalog: &Catalog, raw: RawQuery) -> Result<PagedResult<Value>, QueryError> {
    let request = QueryRequest::parse(&raw, &QueryLimits::default())?;
    pipeline()
        .execute(catalog.tags(), &request, &CancellationToken::new())
        .await
}

fn values(page: &PagedResult<Value>) -> Vec<String> {
    page.items
        .iter()
        .map(|item| item["value"].as_str().unwrap().to_string())
        .collect()
}

// =============================================================================
// Pagination Tests
// =============================================================================

/// Walking every page yields each record exactly once, in order.
#[tokio::test]
async fn test_pages_partition_the_sequence() {
    let catalog = numbered_tags(23);
    let mut seen = Vec::new();

    for page in 1..=3 {
        let raw = RawQuery::default().page(page.to_string()).page_size("10");
        let result = list_tags(&catalog, raw).await.unwrap();
        assert_eq!(result.total_count, 23);
        assert_eq!(result.total_pages, 3);
        seen.extend(values(&result));
    }

    let expected: Vec<String> = (0..23).map(|i| format!("tag {:03}", i)).collect();
    assert_eq!(seen, expected);
    assert_eq!(seen.iter().collect::<HashSet<_>>().len(), 23);
}

#[tokio::test]
async fn test_empty_catalog() {
    let catalog = tag_catalog(&[]);
    let result = list_tags(&catalog, RawQuery::default()).await.unwrap();

    assert!(result.items.is_empty());
    assert_eq!(result.total_count, 0);
    assert_eq!(result.total_pages, 0);
    assert!(!result.has_next);
}

// =============================================================================
// Sort Tests
// =============================================================================

fn mixed_tags() -> Catalog {
    tag_catalog(&[
        ("warning", "gore", 4),
        ("genre", "Horror", 30),
        ("Genre", "fantasy", 9),
        ("character", "Ari", 30),
    ])
}

/// No sort: category then value, case-insensitively.
#[tokio::test]
async fn test_default_tag_order() {
    let result = list_tags(&mixed_tags(), RawQuery::default()).await.unwrap();
    assert_eq!(values(&result), vec!["Ari", "fantasy", "Horror", "gore"]);
}

/// `usage desc` on a reversed mapping means least used first.
#[tokio::test]
async fn test_reversed_mapping_direction() {
    let result = list_tags(&mixed_tags(), RawQuery::default().sort("usage desc, value"))
        .await
        .unwrap();
    assert_eq!(values(&result), vec!["gore", "fantasy", "Ari", "Horror"]);
}

/// A repeated field keeps its first direction.
#[tokio::test]
async fn test_duplicate_sort_field_keeps_first() {
    let result = list_tags(&mixed_tags(), RawQuery::default().sort("VALUE desc, value asc"))
        .await
        .unwrap();
    assert_eq!(values(&result), vec!["Horror", "gore", "fantasy", "Ari"]);
}

/// Equal sort keys still produce a stable order across requests.
#[tokio::test]
async fn test_tiebreaker_makes_order_total() {
    let catalog = tag_catalog(&[("genre", "same", 1), ("genre", "same", 1), ("genre", "same", 1)]);
    let raw = RawQuery::default().sort("value").fields("id");

    let first = list_tags(&catalog, raw.clone()).await.unwrap();
    let second = list_tags(&catalog, raw).await.unwrap();
    assert_eq!(first.items, second.items);
}

// =============================================================================
// Validation Tests
// =============================================================================

/// Every bad sort token is reported together, sorted and de-duplicated.
#[tokio::test]
async fn test_sort_errors_are_batched() {
    let err = list_tags(
        &mixed_tags(),
        RawQuery::default().sort("zeta, value sideways, alpha, zeta"),
    )
    .await
    .unwrap_err();

    assert_eq!(
        err,
        QueryError::Validation(ValidationError::InvalidSortField(vec![
            "alpha".to_string(),
            "value sideways".to_string(),
            "zeta".to_string(),
        ]))
    );
}

/// Page errors win over every later check.
#[test]
fn test_first_failing_kind_wins() {
    let mut params = HashMap::new();
    params.insert("page".to_string(), "0".to_string());
    params.insert("pageSize".to_string(), "0".to_string());
    params.insert("sort".to_string(), "bogus".to_string());

    let err = QueryRequest::from_params(&params, &QueryLimits::default()).unwrap_err();
    assert_eq!(err, ValidationError::InvalidPage("0".to_string()));

    params.remove("page");
    let err = QueryRequest::from_params(&params, &QueryLimits::default()).unwrap_err();
    assert!(matches!(err, ValidationError::InvalidPageSize { .. }));
}

#[test]
fn test_search_term_length_counted_in_characters() {
    let limits = QueryLimits::default();

    let at_limit = RawQuery::default().search("é".repeat(100));
    assert!(QueryRequest::parse(&at_limit, &limits).is_ok());

    let over = RawQuery::default().search("é".repeat(101));
    assert_eq!(
        QueryRequest::parse(&over, &limits).unwrap_err(),
        ValidationError::SearchTermTooLong { len: 101, max: 100 }
    );
}

// =============================================================================
// Search and Shape Tests
// =============================================================================

#[tokio::test]
async fn test_search_folds_unicode_case() {
    let catalog = tag_catalog(&[("style", "Éclat", 1), ("style", "plain", 1)]);
    let result = list_tags(&catalog, RawQuery::default().search("éCLAT")).await.unwrap();
    assert_eq!(values(&result), vec!["Éclat"]);
}

#[tokio::test]
async fn test_full_field_list_matches_unshaped_output() {
    let catalog = mixed_tags();
    let all = list_tags(&catalog, RawQuery::default()).await.unwrap();
    let listed = list_tags(
        &catalog,
        RawQuery::default().fields("id,category,value,usageCount,createdAt"),
    )
    .await
    .unwrap();

    assert_eq!(all.items, listed.items);
    assert_eq!(
        all.items[0].as_object().unwrap().keys().collect::<Vec<_>>(),
        vec!["id", "category", "value", "usageCount", "createdAt"]
    );
}

// =============================================================================
// Cancellation Tests
// =============================================================================

#[tokio::test]
async fn test_cancelled_query_returns_no_page() {
    let catalog = mixed_tags();
    let request = QueryRequest::parse(&RawQuery::default(), &QueryLimits::default()).unwrap();
    let pipeline = pipeline();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = pipeline
        .execute(catalog.tags(), &request, &cancel)
        .await
        .unwrap_err();

    assert_eq!(err, QueryError::Cancelled);
    assert!(!err.is_client_error());
    assert_eq!(pipeline.metrics().snapshot().queries_cancelled, 1);
    assert_eq!(err.code(), "SHELF_QUERY_CANCELLED");
}

// =============================================================================
// Demo Fixture Tests
// =============================================================================

/// The shipped demo config and seed load cleanly.
#[tokio::test]
async fn test_demo_catalog_loads() {
    let config = storyshelf::config::AppConfig::load(std::path::Path::new("demos/storyshelf.json"))
        .unwrap();
    let seed_path = config.seed_path.clone().unwrap();
    let catalog = Catalog::load(&seed_path, MarkdownValidator::new(config.markdown)).unwrap();

    let request = QueryRequest::parse(&RawQuery::default().sort("title"), &config.query).unwrap();
    let stories = pipeline()
        .execute(catalog.stories(), &request, &CancellationToken::new())
        .await
        .unwrap();

    // the draft is hidden
    assert_eq!(stories.total_count, 2);
    assert_eq!(stories.page_size, 20);
    assert_eq!(stories.items[0]["title"], "Salt and Iron");
}
