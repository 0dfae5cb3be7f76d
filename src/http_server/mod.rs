//! # storyshelf HTTP Server Module
//!
//! # Endpoints
//!
//! - `/health` - Health check with catalog counts
//! - `/metrics` - Service counters
//! - `/api/v1/{stories,books,chapters,tags}` - Paginated lists
//!   (`page`, `pageSize`, `search`/`q`, `sort`, `fields`)
//! - `/api/v1/{resource}/:id` - Single records
//! - `/api/v1/stories/:id/books`, `/api/v1/books/:id/chapters` - Scoped lists
//! - `POST /api/v1/books/:id/chapters` - Chapter submission

pub mod catalog_routes;
pub mod config;
pub mod errors;
pub mod observability_routes;
pub mod server;

pub use config::HttpServerConfig;
pub use errors::{ApiError, ApiResult, ErrorResponse};
pub use server::{build_router, AppState, HttpServer};
