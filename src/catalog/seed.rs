//! Seed file format

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::{CatalogError, CatalogResult};
use super::model::{Book, Chapter, Story, Tag};

/// Initial catalog contents, `{ stories, books, chapters, tags }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub stories: Vec<Story>,
    #[serde(default)]
    pub books: Vec<Book>,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl CatalogSeed {
    pub fn read(path: &Path) -> CatalogResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::SeedIo {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content)
            .map_err(|e| CatalogError::Seed(format!("{}: {}", path.display(), e)))
    }
}
