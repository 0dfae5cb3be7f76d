//! # Catalog Query
//!
//! [`QuerySource`] over one in-memory record table. Builder calls only
//! record intent; `count` and `fetch` take the read lock, evaluate against
//! the records present at that moment and release it before returning.

use std::cmp::Ordering;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::query::{QuerySchema, QuerySource, SearchFilter, SortClause, SortDirection, StoreError};

/// Comparable value of one storage field
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortValue {
    Missing,
    /// Counts and ordinals, all unsigned
    Int(u64),
    /// Lowercased, so text orders case-insensitively
    Text(String),
    Time(DateTime<Utc>),
    Id(Uuid),
}

impl SortValue {
    pub fn text(value: &str) -> Self {
        SortValue::Text(value.to_lowercase())
    }
}

/// A catalog record addressable by id and sortable by storage path
pub trait Record: Clone + Send + Sync + 'static {
    fn id(&self) -> Uuid;

    fn sort_value(&self, path: &str) -> SortValue;
}

pub(crate) type Table<T> = Arc<RwLock<Vec<T>>>;

type Scope<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

pub struct CatalogQuery<T: QuerySchema + Record> {
    table: Table<T>,
    scope: Option<Scope<T>>,
    search: Option<SearchFilter<T>>,
    order: Vec<SortClause>,
    skip: u64,
    take: Option<u64>,
}

impl<T: QuerySchema + Record> CatalogQuery<T> {
    pub(crate) fn new(table: Table<T>) -> Self {
        Self {
            table,
            scope: None,
            search: None,
            order: Vec::new(),
            skip: 0,
            take: None,
        }
    }

    /// Restrict the query to records passing `predicate`, before search.
    /// Repeated scopes must all pass.
    pub(crate) fn scoped(mut self, predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        let scope: Scope<T> = match self.scope.take() {
            Some(outer) => Arc::new(move |record: &T| outer(record) && predicate(record)),
            None => Arc::new(predicate),
        };
        self.scope = Some(scope);
        self
    }

    fn includes(&self, record: &T) -> bool {
        self.scope.as_ref().map_or(true, |scope| scope(record))
            && self.search.as_ref().map_or(true, |search| search.matches(record))
    }

    fn compare(&self, a: &T, b: &T) -> Ordering {
        for clause in &self.order {
            let ordering = a.sort_value(clause.path).cmp(&b.sort_value(clause.path));
            let ordering = match clause.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

fn poisoned(resource: &str) -> StoreError {
    StoreError::Unavailable(format!("{} table lock poisoned", resource))
}

#[async_trait]
impl<T: QuerySchema + Record> QuerySource for CatalogQuery<T> {
    type Item = T;

    fn search(mut self, filter: SearchFilter<T>) -> Self {
        self.search = Some(filter);
        self
    }

    fn order_by(mut self, clauses: Vec<SortClause>) -> Self {
        self.order = clauses;
        self
    }

    fn skip(mut self, count: u64) -> Self {
        self.skip = count;
        self
    }

    fn take(mut self, count: u64) -> Self {
        self.take = Some(count);
        self
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let records = self.table.read().map_err(|_| poisoned(T::RESOURCE))?;
        Ok(records.iter().filter(|r| self.includes(r)).count() as u64)
    }

    async fn fetch(self) -> Result<Vec<T>, StoreError> {
        let mut matching: Vec<T> = {
            let records = self.table.read().map_err(|_| poisoned(T::RESOURCE))?;
            records.iter().filter(|r| self.includes(r)).cloned().collect()
        };

        matching.sort_by(|a, b| self.compare(a, b));

        let skip = usize::try_from(self.skip).unwrap_or(usize::MAX);
        let take = self
            .take
            .map_or(usize::MAX, |t| usize::try_from(t).unwrap_or(usize::MAX));
        Ok(matching.into_iter().skip(skip).take(take).collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::catalog::model::Tag;

    fn tag(category: &str, value: &str, usage: u64, day: i64) -> Tag {
        Tag {
            id: Uuid::new_v4(),
            category: category.to_string(),
            value: value.to_string(),
            usage_count: usage,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(day),
        }
    }

    fn table() -> Table<Tag> {
        Arc::new(RwLock::new(vec![
            tag("genre", "Fantasy", 40, 0),
            tag("genre", "horror", 12, 1),
            tag("Character", "Ari", 3, 2),
            tag("genre", "fantasy romance", 7, 3),
            tag("warning", "violence", 40, 4),
        ]))
    }

    fn values(tags: &[Tag]) -> Vec<&str> {
        tags.iter().map(|t| t.value.as_str()).collect()
    }

    #[tokio::test]
    async fn test_default_order_is_case_insensitive() {
        let clauses = Tag::sort_table().resolve(None).unwrap();
        let tags = CatalogQuery::new(table()).order_by(clauses).fetch().await.unwrap();

        assert_eq!(values(&tags), vec![
            "Ari",
            "Fantasy",
            "fantasy romance",
            "horror",
            "violence"
        ]);
    }

    #[tokio::test]
    async fn test_usage_sorts_most_used_first() {
        let clauses = Tag::sort_table().resolve(Some("usage, value")).unwrap();
        let tags = CatalogQuery::new(table()).order_by(clauses).fetch().await.unwrap();

        assert_eq!(values(&tags), vec![
            "Fantasy",
            "violence",
            "horror",
            "fantasy romance",
            "Ari"
        ]);
    }

    #[tokio::test]
    async fn test_count_ignores_skip_and_take() {
        let search = SearchFilter::new(Some("fantasy"), Tag::search_fields());
        let query = CatalogQuery::new(table()).search(search).skip(1).take(1);

        assert_eq!(query.count().await.unwrap(), 2);
        assert_eq!(query.fetch().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_scope_applies_before_search() {
        let search = SearchFilter::new(Some("o"), Tag::search_fields());
        let query = CatalogQuery::new(table())
            .scoped(|t: &Tag| t.category == "genre")
            .search(search);

        // horror, fantasy romance; "violence" matches but is out of scope
        assert_eq!(query.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_repeated_scopes_all_apply() {
        let query = CatalogQuery::new(table())
            .scoped(|t: &Tag| t.category == "genre")
            .scoped(|t: &Tag| t.usage_count > 10);

        let tags = query.fetch().await.unwrap();
        let mut found = values(&tags);
        found.sort();
        assert_eq!(found, vec!["Fantasy", "horror"]);
    }
}
