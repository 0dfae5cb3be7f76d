//! # Query Sources
//!
//! The pipeline never touches storage. It composes operations on a
//! [`QuerySource`], a lazily evaluated builder each store implements, and
//! reads per-type tables through [`QuerySchema`].

use async_trait::async_trait;

use super::errors::StoreError;
use super::search::{SearchField, SearchFilter};
use super::shape::Projection;
use super::sort::{SortClause, SortMappingTable};

/// Static query tables of a result type
pub trait QuerySchema: Sized + Send + Sync + 'static {
    /// Resource name used in logs
    const RESOURCE: &'static str;

    fn sort_table() -> &'static SortMappingTable;

    fn projection() -> &'static Projection<Self>;

    fn search_fields() -> &'static [SearchField<Self>];
}

/// Composable filter/sort/skip/take/count over some store.
///
/// Builder methods only record intent; nothing runs until `count` or
/// `fetch` is awaited. `count` must honour the search filter and ignore
/// skip/take so it reports the pre-pagination total.
#[async_trait]
pub trait QuerySource: Send + Sync + Sized {
    type Item: QuerySchema;

    fn search(self, filter: SearchFilter<Self::Item>) -> Self;

    fn order_by(self, clauses: Vec<SortClause>) -> Self;

    fn skip(self, count: u64) -> Self;

    fn take(self, count: u64) -> Self;

    async fn count(&self) -> Result<u64, StoreError>;

    async fn fetch(self) -> Result<Vec<Self::Item>, StoreError>;
}
