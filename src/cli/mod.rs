//! CLI module for storyshelf
//!
//! Provides command-line interface for:
//! - serve: Load the catalog and serve the HTTP API
//! - query: One-shot list query printed as JSON
//! - check: Markdown validation of a single document

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, Resource};
pub use commands::{check, check_markdown, query, run, run_command, run_query, serve};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_error, write_response};
