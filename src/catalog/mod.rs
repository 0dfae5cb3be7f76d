//! # Catalog
//!
//! Stories, books, chapters and tags, each exposed to the query pipeline
//! through its own projection, sort and search tables.

pub mod errors;
pub mod model;
pub mod query;
mod schema;
pub mod seed;
pub mod store;

pub use errors::{CatalogError, CatalogResult};
pub use model::{count_words, Book, Chapter, NewChapter, Rating, Story, StoryStatus, Tag};
pub use query::{CatalogQuery, Record, SortValue};
pub use seed::CatalogSeed;
pub use store::{Catalog, CatalogStats};
