//! Catalog errors

use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

use crate::markdown::MarkdownViolation;
use crate::query::StoreError;

pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: Uuid },

    /// Submitted markdown failed validation
    #[error("Markdown rejected with {} violation(s)", .0.len())]
    Rejected(Vec<MarkdownViolation>),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to read seed file {path}: {source}")]
    SeedIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid seed data: {0}")]
    Seed(String),
}

impl CatalogError {
    pub fn code(&self) -> &'static str {
        match self {
            CatalogError::NotFound { .. } => "SHELF_NOT_FOUND",
            CatalogError::Rejected(_) => "SHELF_MARKDOWN_REJECTED",
            CatalogError::Store(_) => "SHELF_STORE_UNAVAILABLE",
            CatalogError::SeedIo { .. } => "SHELF_SEED_IO",
            CatalogError::Seed(_) => "SHELF_SEED_INVALID",
        }
    }
}
