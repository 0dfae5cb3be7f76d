//! storyshelf - a paginated, searchable story catalog
//!
//! - `query`: list request validation, search, sort mapping, pagination, shaping
//! - `catalog`: stories, books, chapters and tags held in memory
//! - `markdown`: denylist validation of submitted markdown
//! - `http_server`: axum REST API over the catalog
//! - `cli`: `serve`, `query` and `check` commands

pub mod catalog;
pub mod cli;
pub mod config;
pub mod http_server;
pub mod markdown;
pub mod observability;
pub mod query;
