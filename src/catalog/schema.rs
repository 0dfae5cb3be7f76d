//! Query tables for catalog records
//!
//! Public names are camelCase, matching the serialized records; storage
//! paths are the snake_case struct fields.

use serde_json::json;
use uuid::Uuid;

use crate::query::{
    FieldAccessor, Projection, QuerySchema, SearchField, SortDirection, SortMapping,
    SortMappingTable,
};

use super::model::{Book, Chapter, Story, Tag};
use super::query::{Record, SortValue};

// ==================
// Stories
// ==================

static STORY_SORT: SortMappingTable = SortMappingTable {
    mappings: &[
        SortMapping::new("title", "title"),
        SortMapping::new("author", "author"),
        SortMapping::new("rating", "rating"),
        SortMapping::new("wordCount", "word_count"),
        SortMapping::new("createdAt", "created_at"),
        SortMapping::new("updatedAt", "updated_at"),
    ],
    default_order: &[("updatedAt", SortDirection::Desc)],
    tiebreaker: "id",
};

static STORY_PROJECTION: Projection<Story> = Projection::new(&[
    FieldAccessor { name: "id", get: |s| json!(s.id) },
    FieldAccessor { name: "title", get: |s| json!(s.title) },
    FieldAccessor { name: "summary", get: |s| json!(s.summary) },
    FieldAccessor { name: "author", get: |s| json!(s.author) },
    FieldAccessor { name: "rating", get: |s| json!(s.rating) },
    FieldAccessor { name: "status", get: |s| json!(s.status) },
    FieldAccessor { name: "wordCount", get: |s| json!(s.word_count) },
    FieldAccessor { name: "tags", get: |s| json!(s.tags) },
    FieldAccessor { name: "createdAt", get: |s| json!(s.created_at) },
    FieldAccessor { name: "updatedAt", get: |s| json!(s.updated_at) },
]);

static STORY_SEARCH: [SearchField<Story>; 3] = [
    SearchField { name: "title", get: |s| s.title.as_str() },
    SearchField { name: "summary", get: |s| s.summary.as_str() },
    SearchField { name: "author", get: |s| s.author.as_str() },
];

impl QuerySchema for Story {
    const RESOURCE: &'static str = "stories";

    fn sort_table() -> &'static SortMappingTable {
        &STORY_SORT
    }

    fn projection() -> &'static Projection<Self> {
        &STORY_PROJECTION
    }

    fn search_fields() -> &'static [SearchField<Self>] {
        &STORY_SEARCH
    }
}

impl Record for Story {
    fn id(&self) -> Uuid {
        self.id
    }

    fn sort_value(&self, path: &str) -> SortValue {
        match path {
            "id" => SortValue::Id(self.id),
            "title" => SortValue::text(&self.title),
            "author" => SortValue::text(&self.author),
            "rating" => SortValue::Int(self.rating as u64),
            "word_count" => SortValue::Int(self.word_count),
            "created_at" => SortValue::Time(self.created_at),
            "updated_at" => SortValue::Time(self.updated_at),
            _ => SortValue::Missing,
        }
    }
}

// ==================
// Books
// ==================

static BOOK_SORT: SortMappingTable = SortMappingTable {
    mappings: &[
        SortMapping::new("title", "title"),
        SortMapping::new("order", "order"),
        SortMapping::new("createdAt", "created_at"),
    ],
    default_order: &[("order", SortDirection::Asc)],
    tiebreaker: "id",
};

static BOOK_PROJECTION: Projection<Book> = Projection::new(&[
    FieldAccessor { name: "id", get: |b| json!(b.id) },
    FieldAccessor { name: "storyId", get: |b| json!(b.story_id) },
    FieldAccessor { name: "title", get: |b| json!(b.title) },
    FieldAccessor { name: "order", get: |b| json!(b.order) },
    FieldAccessor { name: "createdAt", get: |b| json!(b.created_at) },
]);

static BOOK_SEARCH: [SearchField<Book>; 1] = [SearchField { name: "title", get: |b| b.title.as_str() }];

impl QuerySchema for Book {
    const RESOURCE: &'static str = "books";

    fn sort_table() -> &'static SortMappingTable {
        &BOOK_SORT
    }

    fn projection() -> &'static Projection<Self> {
        &BOOK_PROJECTION
    }

    fn search_fields() -> &'static [SearchField<Self>] {
        &BOOK_SEARCH
    }
}

impl Record for Book {
    fn id(&self) -> Uuid {
        self.id
    }

    fn sort_value(&self, path: &str) -> SortValue {
        match path {
            "id" => SortValue::Id(self.id),
            "title" => SortValue::text(&self.title),
            "order" => SortValue::Int(u64::from(self.order)),
            "created_at" => SortValue::Time(self.created_at),
            _ => SortValue::Missing,
        }
    }
}

// ==================
// Chapters
// ==================

static CHAPTER_SORT: SortMappingTable = SortMappingTable {
    mappings: &[
        SortMapping::new("title", "title"),
        SortMapping::new("order", "order"),
        SortMapping::new("wordCount", "word_count"),
        SortMapping::new("publishedAt", "published_at"),
    ],
    default_order: &[("order", SortDirection::Asc)],
    tiebreaker: "id",
};

static CHAPTER_PROJECTION: Projection<Chapter> = Projection::new(&[
    FieldAccessor { name: "id", get: |c| json!(c.id) },
    FieldAccessor { name: "bookId", get: |c| json!(c.book_id) },
    FieldAccessor { name: "title", get: |c| json!(c.title) },
    FieldAccessor { name: "body", get: |c| json!(c.body) },
    FieldAccessor { name: "order", get: |c| json!(c.order) },
    FieldAccessor { name: "wordCount", get: |c| json!(c.word_count) },
    FieldAccessor { name: "publishedAt", get: |c| json!(c.published_at) },
]);

static CHAPTER_SEARCH: [SearchField<Chapter>; 1] =
    [SearchField { name: "title", get: |c| c.title.as_str() }];

impl QuerySchema for Chapter {
    const RESOURCE: &'static str = "chapters";

    fn sort_table() -> &'static SortMappingTable {
        &CHAPTER_SORT
    }

    fn projection() -> &'static Projection<Self> {
        &CHAPTER_PROJECTION
    }

    fn search_fields() -> &'static [SearchField<Self>] {
        &CHAPTER_SEARCH
    }
}

impl Record for Chapter {
    fn id(&self) -> Uuid {
        self.id
    }

    fn sort_value(&self, path: &str) -> SortValue {
        match path {
            "id" => SortValue::Id(self.id),
            "title" => SortValue::text(&self.title),
            "order" => SortValue::Int(u64::from(self.order)),
            "word_count" => SortValue::Int(self.word_count),
            "published_at" => SortValue::Time(self.published_at),
            _ => SortValue::Missing,
        }
    }
}

// ==================
// Tags
// ==================

/// `usage` is reversed: ascending means most used first
static TAG_SORT: SortMappingTable = SortMappingTable {
    mappings: &[
        SortMapping::new("category", "category"),
        SortMapping::new("value", "value"),
        SortMapping::reversed("usage", "usage_count"),
        SortMapping::new("createdAt", "created_at"),
    ],
    default_order: &[("category", SortDirection::Asc), ("value", SortDirection::Asc)],
    tiebreaker: "id",
};

static TAG_PROJECTION: Projection<Tag> = Projection::new(&[
    FieldAccessor { name: "id", get: |t| json!(t.id) },
    FieldAccessor { name: "category", get: |t| json!(t.category) },
    FieldAccessor { name: "value", get: |t| json!(t.value) },
    FieldAccessor { name: "usageCount", get: |t| json!(t.usage_count) },
    FieldAccessor { name: "createdAt", get: |t| json!(t.created_at) },
]);

static TAG_SEARCH: [SearchField<Tag>; 2] = [
    SearchField { name: "category", get: |t| t.category.as_str() },
    SearchField { name: "value", get: |t| t.value.as_str() },
];

impl QuerySchema for Tag {
    const RESOURCE: &'static str = "tags";

    fn sort_table() -> &'static SortMappingTable {
        &TAG_SORT
    }

    fn projection() -> &'static Projection<Self> {
        &TAG_PROJECTION
    }

    fn search_fields() -> &'static [SearchField<Self>] {
        &TAG_SEARCH
    }
}

impl Record for Tag {
    fn id(&self) -> Uuid {
        self.id
    }

    fn sort_value(&self, path: &str) -> SortValue {
        match path {
            "id" => SortValue::Id(self.id),
            "category" => SortValue::text(&self.category),
            "value" => SortValue::text(&self.value),
            "usage_count" => SortValue::Int(self.usage_count),
            "created_at" => SortValue::Time(self.created_at),
            _ => SortValue::Missing,
        }
    }
}
