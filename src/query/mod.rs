//! # Query Pipeline
//!
//! Paginated, sorted, searchable and shaped list queries over any store
//! that implements [`QuerySource`].
//!
//! ```ignore
//! let request = QueryRequest::from_params(&params, &limits)?;
//! let page = pipeline.execute(catalog.tags()?, &request, &cancel).await?;
//! ```

pub mod errors;
pub mod paginate;
pub mod pipeline;
pub mod request;
pub mod search;
pub mod shape;
pub mod sort;
pub mod source;

pub use errors::{QueryError, QueryResult, StoreError, ValidationError};
pub use paginate::{total_pages, PageWindow, PagedResult};
pub use pipeline::{QueryPipeline, QueryPlan};
pub use request::{QueryLimits, QueryRequest, RawQuery, MAX_PAGE_SIZE};
pub use search::{SearchField, SearchFilter};
pub use shape::{FieldAccessor, FieldSelection, Projection};
pub use sort::{SortClause, SortDirection, SortMapping, SortMappingTable};
pub use source::{QuerySchema, QuerySource};
