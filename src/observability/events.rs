//! Observable events
//!
//! Every log line the service emits names one of these events.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Service startup begins
    BootStart,
    /// Configuration loaded
    ConfigLoaded,
    /// Catalog seed loaded
    CatalogLoaded,
    /// Catalog seed could not be loaded (FATAL)
    CatalogLoadFailed,
    /// HTTP listener bound, ready for requests
    Serving,
    /// Shutdown initiated
    ShutdownStart,
    /// Shutdown complete
    ShutdownComplete,

    // Query pipeline
    /// List query received
    QueryReceived,
    /// List query produced a page
    QueryExecuted,
    /// List query failed validation
    QueryRejected,
    /// List query abandoned on cancellation
    QueryCancelled,
    /// Store failed while executing a query
    QueryFailed,

    // Submissions
    /// Chapter accepted into the catalog
    ChapterSubmitted,
    /// Chapter rejected by markdown validation
    ChapterRejected,

    // HTTP
    /// One HTTP request served
    HttpRequest,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "STORYSHELF_STARTUP_BEGIN",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::CatalogLoaded => "CATALOG_LOADED",
            Event::CatalogLoadFailed => "CATALOG_LOAD_FAILED",
            Event::Serving => "STORYSHELF_SERVING",
            Event::ShutdownStart => "SHUTDOWN_BEGIN",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",

            Event::QueryReceived => "QUERY_BEGIN",
            Event::QueryExecuted => "QUERY_COMPLETE",
            Event::QueryRejected => "QUERY_REJECTED",
            Event::QueryCancelled => "QUERY_CANCELLED",
            Event::QueryFailed => "QUERY_FAILED",

            Event::ChapterSubmitted => "CHAPTER_SUBMITTED",
            Event::ChapterRejected => "CHAPTER_REJECTED",

            Event::HttpRequest => "HTTP_REQUEST",
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::CatalogLoadFailed)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
