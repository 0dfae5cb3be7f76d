//! CLI argument definitions using clap
//!
//! Commands:
//! - storyshelf serve --config <path>
//! - storyshelf query --config <path> <resource> [--page N] [--page-size N]
//!   [--search TEXT] [--sort EXPR] [--fields LIST]
//! - storyshelf check --config <path> [FILE]

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// storyshelf - paginated, searchable story catalog service
#[derive(Parser, Debug)]
#[command(name = "storyshelf")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load the catalog and serve the HTTP API until Ctrl-C
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./storyshelf.json")]
        config: PathBuf,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run one list query against the catalog and print the page as JSON
    Query {
        /// Path to configuration file
        #[arg(long, default_value = "./storyshelf.json")]
        config: PathBuf,

        /// Record type to list
        #[arg(value_enum)]
        resource: Resource,

        #[arg(long)]
        page: Option<String>,

        #[arg(long)]
        page_size: Option<String>,

        /// Case-insensitive substring search
        #[arg(long)]
        search: Option<String>,

        /// Sort expression, e.g. "category, usage desc"
        #[arg(long)]
        sort: Option<String>,

        /// Comma-separated fields to include
        #[arg(long)]
        fields: Option<String>,
    },

    /// Validate a markdown file (stdin when omitted) and print violations
    Check {
        /// Path to configuration file
        #[arg(long, default_value = "./storyshelf.json")]
        config: PathBuf,

        file: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Stories,
    Books,
    Chapters,
    Tags,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
