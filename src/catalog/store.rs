//! # Catalog Store
//!
//! Stories, books, chapters and tags held in memory, one `RwLock` per
//! table. List operations hand out [`CatalogQuery`] builders for the query
//! pipeline; lookups and chapter submission work on the tables directly.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::markdown::{MarkdownValidator, MarkdownViolation};
use crate::observability::{Event, Logger, ObservationScope};
use crate::query::{QuerySchema, StoreError};

use super::errors::{CatalogError, CatalogResult};
use super::model::{count_words, Book, Chapter, NewChapter, Story, Tag};
use super::query::{CatalogQuery, Record, Table};
use super::seed::CatalogSeed;

/// Record counts per table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub stories: usize,
    pub books: usize,
    pub chapters: usize,
    pub tags: usize,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    stories: Table<Story>,
    books: Table<Book>,
    chapters: Table<Chapter>,
    tags: Table<Tag>,
    validator: MarkdownValidator,
}

impl Catalog {
    /// An empty catalog
    pub fn new(validator: MarkdownValidator) -> Self {
        Self::from_parts(CatalogSeed::default(), validator)
    }

    fn from_parts(seed: CatalogSeed, validator: MarkdownValidator) -> Self {
        Self {
            stories: Arc::new(RwLock::new(seed.stories)),
            books: Arc::new(RwLock::new(seed.books)),
            chapters: Arc::new(RwLock::new(seed.chapters)),
            tags: Arc::new(RwLock::new(seed.tags)),
            validator,
        }
    }

    /// Build a catalog from seed data.
    ///
    /// Story summaries and chapter bodies must pass markdown validation,
    /// and every book and chapter must reference an existing parent.
    /// Chapter word counts are recomputed from their bodies.
    pub fn from_seed(mut seed: CatalogSeed, validator: MarkdownValidator) -> CatalogResult<Self> {
        for story in &seed.stories {
            validator
                .check(&story.summary)
                .map_err(|v| seed_violation("story", story.id, &v))?;
        }

        for book in &seed.books {
            if !seed.stories.iter().any(|s| s.id == book.story_id) {
                return Err(CatalogError::Seed(format!(
                    "book {} references unknown story {}",
                    book.id, book.story_id
                )));
            }
        }

        for chapter in &mut seed.chapters {
            if !seed.books.iter().any(|b| b.id == chapter.book_id) {
                return Err(CatalogError::Seed(format!(
                    "chapter {} references unknown book {}",
                    chapter.id, chapter.book_id
                )));
            }
            validator
                .check(&chapter.body)
                .map_err(|v| seed_violation("chapter", chapter.id, &v))?;
            chapter.word_count = count_words(&chapter.body);
        }

        Ok(Self::from_parts(seed, validator))
    }

    /// Read and validate a seed file
    pub fn load(path: &Path, validator: MarkdownValidator) -> CatalogResult<Self> {
        let path_text = path.display().to_string();
        let scope = ObservationScope::with_fields("CATALOG_LOAD", &[("path", &path_text)]);

        let result = CatalogSeed::read(path).and_then(|seed| Self::from_seed(seed, validator));
        match &result {
            Ok(catalog) => {
                let stats = catalog.stats()?;
                scope.complete(&[
                    ("stories", &stats.stories.to_string()),
                    ("books", &stats.books.to_string()),
                    ("chapters", &stats.chapters.to_string()),
                    ("tags", &stats.tags.to_string()),
                ]);
            }
            Err(err) => scope.fail(&err.to_string()),
        }
        result
    }

    pub fn stats(&self) -> CatalogResult<CatalogStats> {
        Ok(CatalogStats {
            stories: read(&self.stories)?.len(),
            books: read(&self.books)?.len(),
            chapters: read(&self.chapters)?.len(),
            tags: read(&self.tags)?.len(),
        })
    }

    // ==================
    // Listing
    // ==================

    /// Published stories only
    pub fn stories(&self) -> CatalogQuery<Story> {
        CatalogQuery::new(Arc::clone(&self.stories)).scoped(Story::is_published)
    }

    /// Books of published stories
    pub fn books(&self) -> CatalogResult<CatalogQuery<Book>> {
        let stories = self.published_story_ids()?;
        Ok(CatalogQuery::new(Arc::clone(&self.books))
            .scoped(move |b| stories.contains(&b.story_id)))
    }

    /// Chapters of books of published stories
    pub fn chapters(&self) -> CatalogResult<CatalogQuery<Chapter>> {
        let books = self.visible_book_ids()?;
        Ok(CatalogQuery::new(Arc::clone(&self.chapters))
            .scoped(move |c| books.contains(&c.book_id)))
    }

    pub fn tags(&self) -> CatalogQuery<Tag> {
        CatalogQuery::new(Arc::clone(&self.tags))
    }

    /// Books of a published story
    pub fn books_of_story(&self, story_id: Uuid) -> CatalogResult<CatalogQuery<Book>> {
        self.story(story_id)?;
        Ok(self.books()?.scoped(move |b| b.story_id == story_id))
    }

    pub fn chapters_of_book(&self, book_id: Uuid) -> CatalogResult<CatalogQuery<Chapter>> {
        self.book(book_id)?;
        Ok(self.chapters()?.scoped(move |c| c.book_id == book_id))
    }

    fn published_story_ids(&self) -> CatalogResult<HashSet<Uuid>> {
        Ok(read(&self.stories)?
            .iter()
            .filter(|s| s.is_published())
            .map(|s| s.id)
            .collect())
    }

    fn visible_book_ids(&self) -> CatalogResult<HashSet<Uuid>> {
        let stories = self.published_story_ids()?;
        Ok(read(&self.books)?
            .iter()
            .filter(|b| stories.contains(&b.story_id))
            .map(|b| b.id)
            .collect())
    }

    // ==================
    // Lookup
    // ==================

    /// A published story; drafts are reported as not found
    pub fn story(&self, id: Uuid) -> CatalogResult<Story> {
        find(&self.stories, id)
            .map(|story| story.filter(Story::is_published))
            .transpose_found(id)
    }

    /// A book of a published story
    pub fn book(&self, id: Uuid) -> CatalogResult<Book> {
        let book = find(&self.books, id).transpose_found(id)?;
        self.story(book.story_id).map_err(|err| hidden_as::<Book>(err, id))?;
        Ok(book)
    }

    /// A chapter whose book is visible
    pub fn chapter(&self, id: Uuid) -> CatalogResult<Chapter> {
        let chapter = find(&self.chapters, id).transpose_found(id)?;
        self.book(chapter.book_id)
            .map_err(|err| hidden_as::<Chapter>(err, id))?;
        Ok(chapter)
    }

    pub fn tag(&self, id: Uuid) -> CatalogResult<Tag> {
        find(&self.tags, id).transpose_found(id)
    }

    // ==================
    // Submission
    // ==================

    /// Append a chapter to a book.
    ///
    /// The body is validated before anything is written. The chapter gets
    /// the next order in its book, and the owning story's word count and
    /// update time follow.
    pub fn submit_chapter(&self, book_id: Uuid, submission: NewChapter) -> CatalogResult<Chapter> {
        let book = self.book(book_id)?;
        let book_text = book_id.to_string();

        let mut violations = self.validator.check(&submission.title).err().unwrap_or_default();
        if let Err(found) = self.validator.check(&submission.body) {
            violations.extend(found);
        }
        if !violations.is_empty() {
            let kinds = violation_kinds(&violations);
            Logger::warn(
                Event::ChapterRejected.as_str(),
                &[("book_id", &book_text), ("violations", &kinds)],
            );
            return Err(CatalogError::Rejected(violations));
        }

        let word_count = count_words(&submission.body);
        let chapter = {
            let mut chapters = write(&self.chapters)?;
            let order = chapters
                .iter()
                .filter(|c| c.book_id == book_id)
                .map(|c| c.order)
                .max()
                .unwrap_or(0)
                + 1;
            let chapter = Chapter {
                id: Uuid::new_v4(),
                book_id,
                title: submission.title.trim().to_string(),
                body: submission.body,
                order,
                word_count,
                published_at: Utc::now(),
            };
            chapters.push(chapter.clone());
            chapter
        };

        {
            let mut stories = write(&self.stories)?;
            if let Some(story) = stories.iter_mut().find(|s| s.id == book.story_id) {
                story.word_count += word_count;
                story.updated_at = chapter.published_at;
            }
        }

        Logger::info(
            Event::ChapterSubmitted.as_str(),
            &[
                ("book_id", &book_text),
                ("chapter_id", &chapter.id.to_string()),
                ("order", &chapter.order.to_string()),
                ("word_count", &word_count.to_string()),
            ],
        );

        Ok(chapter)
    }
}

fn read<T: QuerySchema>(table: &Table<T>) -> CatalogResult<RwLockReadGuard<'_, Vec<T>>> {
    table.read().map_err(|_| lock_poisoned::<T>())
}

fn write<T: QuerySchema>(table: &Table<T>) -> CatalogResult<RwLockWriteGuard<'_, Vec<T>>> {
    table.write().map_err(|_| lock_poisoned::<T>())
}

fn lock_poisoned<T: QuerySchema>() -> CatalogError {
    CatalogError::Store(StoreError::Unavailable(format!(
        "{} table lock poisoned",
        T::RESOURCE
    )))
}

fn find<T: QuerySchema + Record>(table: &Table<T>, id: Uuid) -> CatalogResult<Option<T>> {
    Ok(read(table)?.iter().find(|r| r.id() == id).cloned())
}

/// A hidden parent reports the child itself as not found
fn hidden_as<T: QuerySchema>(err: CatalogError, id: Uuid) -> CatalogError {
    match err {
        CatalogError::NotFound { .. } => CatalogError::NotFound {
            resource: T::RESOURCE,
            id,
        },
        other => other,
    }
}

/// Turns a missing record into `NotFound`
trait FoundExt<T> {
    fn transpose_found(self, id: Uuid) -> CatalogResult<T>;
}

impl<T: QuerySchema> FoundExt<T> for CatalogResult<Option<T>> {
    fn transpose_found(self, id: Uuid) -> CatalogResult<T> {
        self?.ok_or(CatalogError::NotFound {
            resource: T::RESOURCE,
            id,
        })
    }
}

fn violation_kinds(violations: &[MarkdownViolation]) -> String {
    violations
        .iter()
        .map(|v| v.kind.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

fn seed_violation(resource: &str, id: Uuid, violations: &[MarkdownViolation]) -> CatalogError {
    CatalogError::Seed(format!(
        "{} {} has rejected markdown: {}",
        resource,
        id,
        violation_kinds(violations)
    ))
}
