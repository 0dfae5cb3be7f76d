//! CLI-specific error types
//!
//! Every CLI error carries a stable code and exits the process non-zero.

use std::fmt;
use std::io;

use crate::catalog::CatalogError;
use crate::config::ConfigError;
use crate::query::QueryError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdin/stdout)
    IoError,
    /// Catalog seed could not be loaded
    CatalogError,
    /// List query failed
    QueryFailed,
    /// Markdown failed validation
    MarkdownRejected,
    /// Runtime or listener failed
    BootFailed,
}

impl CliErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "SHELF_CLI_CONFIG_ERROR",
            Self::IoError => "SHELF_CLI_IO_ERROR",
            Self::CatalogError => "SHELF_CLI_CATALOG_ERROR",
            Self::QueryFailed => "SHELF_CLI_QUERY_FAILED",
            Self::MarkdownRejected => "SHELF_CLI_MARKDOWN_REJECTED",
            Self::BootFailed => "SHELF_CLI_BOOT_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn boot_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::BootFailed, msg)
    }

    pub fn markdown_rejected(count: usize) -> Self {
        Self::new(
            CliErrorCode::MarkdownRejected,
            format!("{} markdown violation(s)", count),
        )
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<CatalogError> for CliError {
    fn from(e: CatalogError) -> Self {
        Self::new(CliErrorCode::CatalogError, e.to_string())
    }
}

impl From<QueryError> for CliError {
    fn from(e: QueryError) -> Self {
        Self::new(CliErrorCode::QueryFailed, format!("{}: {}", e.code(), e))
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
