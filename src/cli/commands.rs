//! CLI command implementations
//!
//! Boot order for every command:
//! 1. Load and validate configuration, apply the log level
//! 2. Load the catalog seed, if one is configured
//! 3. Run the command

use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use crate::catalog::Catalog;
use crate::config::AppConfig;
use crate::http_server::{AppState, HttpServer};
use crate::markdown::MarkdownValidator;
use crate::observability::{log_event, log_event_with_fields, Event, Logger, MetricsRegistry};
use crate::query::{PagedResult, QueryError, QueryLimits, QueryPipeline, QueryRequest, RawQuery};

use super::args::{Command, Resource};
use super::errors::{CliError, CliResult};
use super::io::{read_document, write_response};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { config, port } => serve(&config, port),
        Command::Query {
            config,
            resource,
            page,
            page_size,
            search,
            sort,
            fields,
        } => {
            let raw = RawQuery {
                page,
                page_size,
                search,
                sort,
                fields,
            };
            query(&config, resource, raw)
        }
        Command::Check { config, file } => check(&config, file.as_deref()),
    }
}

fn load_config(path: &Path) -> CliResult<AppConfig> {
    let config = AppConfig::load(path)?;
    Logger::set_min_severity(config.severity()?);
    log_event_with_fields(Event::ConfigLoaded, &[("path", &path.display().to_string())]);
    Ok(config)
}

fn load_catalog(config: &AppConfig) -> CliResult<Catalog> {
    let validator = MarkdownValidator::new(config.markdown);
    let Some(seed_path) = &config.seed_path else {
        return Ok(Catalog::new(validator));
    };

    let catalog = Catalog::load(seed_path, validator).map_err(|err| {
        log_event_with_fields(
            Event::CatalogLoadFailed,
            &[("path", &seed_path.display().to_string()), ("reason", &err.to_string())],
        );
        CliError::from(err)
    })?;

    let stats = catalog.stats()?;
    log_event_with_fields(
        Event::CatalogLoaded,
        &[
            ("stories", &stats.stories.to_string()),
            ("books", &stats.books.to_string()),
            ("chapters", &stats.chapters.to_string()),
            ("tags", &stats.tags.to_string()),
        ],
    );
    Ok(catalog)
}

fn runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))
}

/// Serve the HTTP API until Ctrl-C.
///
/// Ctrl-C cancels the root token: the listener stops accepting, in-flight
/// queries are abandoned through their child tokens, and open connections
/// drain before the process exits.
pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    log_event(Event::BootStart);

    let mut config = load_config(config_path)?;
    if let Some(port) = port {
        config.http.port = port;
    }
    let catalog = load_catalog(&config)?;

    let shutdown = CancellationToken::new();
    let state = AppState::new(catalog, config.query, shutdown.clone());
    let server = HttpServer::new(config.http.clone(), state);

    runtime()?.block_on(async {
        let signal = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    log_event(Event::ShutdownStart);
                    signal.cancel();
                }
                Err(e) => Logger::error(
                    Event::ShutdownStart.as_str(),
                    &[("reason", &format!("cannot listen for Ctrl-C: {}", e))],
                ),
            }
        });

        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })?;

    log_event(Event::ShutdownComplete);
    Ok(())
}

/// Run one list query and print the page
pub fn query(config_path: &Path, resource: Resource, raw: RawQuery) -> CliResult<()> {
    let config = load_config(config_path)?;
    let catalog = load_catalog(&config)?;
    let page = run_query(&catalog, &config.query, resource, &raw)?;
    write_response(page)
}

/// Execute a list query on a fresh runtime
pub fn run_query(
    catalog: &Catalog,
    limits: &QueryLimits,
    resource: Resource,
    raw: &RawQuery,
) -> CliResult<PagedResult<Value>> {
    let request = QueryRequest::parse(raw, limits).map_err(QueryError::from)?;
    let pipeline = QueryPipeline::new(Arc::new(MetricsRegistry::new()));
    let cancel = CancellationToken::new();

    let page = match resource {
        Resource::Stories => {
            runtime()?.block_on(pipeline.execute(catalog.stories(), &request, &cancel))?
        }
        Resource::Books => {
            let books = catalog.books()?;
            runtime()?.block_on(pipeline.execute(books, &request, &cancel))?
        }
        Resource::Chapters => {
            let chapters = catalog.chapters()?;
            runtime()?.block_on(pipeline.execute(chapters, &request, &cancel))?
        }
        Resource::Tags => {
            runtime()?.block_on(pipeline.execute(catalog.tags(), &request, &cancel))?
        }
    };

    Ok(page)
}

/// Validate a markdown document and print the verdict
pub fn check(config_path: &Path, file: Option<&Path>) -> CliResult<()> {
    let config = load_config(config_path)?;
    let validator = MarkdownValidator::new(config.markdown);
    let text = read_document(file)?;

    let (report, violations) = check_markdown(&validator, &text);
    write_response(report)?;
    if violations > 0 {
        return Err(CliError::markdown_rejected(violations));
    }
    Ok(())
}

/// Verdict object and violation count for `text`
pub fn check_markdown(validator: &MarkdownValidator, text: &str) -> (Value, usize) {
    match validator.check(text) {
        Ok(()) => (json!({ "valid": true, "violations": [] }), 0),
        Err(violations) => {
            let count = violations.len();
            (json!({ "valid": false, "violations": violations }), count)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::cli::errors::CliErrorCode;

    fn write_fixture(dir: &TempDir) -> std::path::PathBuf {
        let seed = json!({
            "stories": [],
            "books": [],
            "chapters": [],
            "tags": [
                {
                    "id": "00000000-0000-4000-8000-000000000001",
                    "category": "genre",
                    "value": "fantasy",
                    "usageCount": 9,
                    "createdAt": "2024-01-01T00:00:00Z"
                },
                {
                    "id": "00000000-0000-4000-8000-000000000002",
                    "category": "genre",
                    "value": "horror",
                    "usageCount": 30,
                    "createdAt": "2024-01-02T00:00:00Z"
                },
                {
                    "id": "00000000-0000-4000-8000-000000000003",
                    "category": "warning",
                    "value": "gore",
                    "usageCount": 4,
                    "createdAt": "2024-01-03T00:00:00Z"
                }
            ]
        });
        fs::write(dir.path().join("catalog.json"), seed.to_string()).unwrap();

        let config_path = dir.path().join("storyshelf.json");
        fs::write(
            &config_path,
            json!({ "seed_path": "catalog.json", "log_level": "error" }).to_string(),
        )
        .unwrap();
        config_path
    }

    #[test]
    fn test_run_query_against_seeded_catalog() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load(&write_fixture(&dir)).unwrap();
        let catalog = load_catalog(&config).unwrap();

        let raw = RawQuery::default().sort("usage").fields("value").page_size("2");
        let page = run_query(&catalog, &config.query, Resource::Tags, &raw).unwrap();

        assert_eq!(page.total_count, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items, vec![json!({"value": "horror"}), json!({"value": "fantasy"})]);
    }

    #[test]
    fn test_run_query_reports_validation_error() {
        let catalog = Catalog::new(MarkdownValidator::default());
        let raw = RawQuery::default().sort("bogus");

        let err = run_query(&catalog, &QueryLimits::default(), Resource::Tags, &raw).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::QueryFailed);
        assert!(err.message().contains("bogus"));
    }

    #[test]
    fn test_missing_seed_file_fails_boot() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("storyshelf.json");
        fs::write(&config_path, json!({ "seed_path": "absent.json" }).to_string()).unwrap();

        let config = AppConfig::load(&config_path).unwrap();
        let err = load_catalog(&config).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::CatalogError);
    }

    #[test]
    fn test_check_markdown_verdicts() {
        let validator = MarkdownValidator::default();

        let (report, count) = check_markdown(&validator, "A calm *evening*.");
        assert_eq!(count, 0);
        assert_eq!(report["valid"], true);

        let (report, count) = check_markdown(&validator, "[x](javascript:void(0))");
        assert_eq!(count, 1);
        assert_eq!(report["violations"][0]["kind"], "dangerous_scheme");
    }
}
