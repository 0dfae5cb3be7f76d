//! Catalog record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Audience rating of a story
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    General,
    Teen,
    Mature,
    Explicit,
}

impl Rating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::General => "general",
            Rating::Teen => "teen",
            Rating::Mature => "mature",
            Rating::Explicit => "explicit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryStatus {
    Draft,
    Published,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: Uuid,
    pub title: String,
    pub summary: String,
    pub author: String,
    pub rating: Rating,
    pub status: StoryStatus,
    #[serde(default)]
    pub word_count: u64,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Story {
    pub fn is_published(&self) -> bool {
        self.status == StoryStatus::Published
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,
    pub story_id: Uuid,
    pub title: String,
    pub order: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub id: Uuid,
    pub book_id: Uuid,
    pub title: String,
    pub body: String,
    pub order: u32,
    #[serde(default)]
    pub word_count: u64,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: Uuid,
    pub category: String,
    pub value: String,
    pub usage_count: u64,
    pub created_at: DateTime<Utc>,
}

/// Chapter submitted by an author
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewChapter {
    pub title: String,
    pub body: String,
}

/// Whitespace-separated word count of markdown text
pub fn count_words(text: &str) -> u64 {
    text.split_whitespace()
        .filter(|w| w.chars().any(char::is_alphanumeric))
        .count() as u64
}
