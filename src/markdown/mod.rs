//! # Markdown Validation
//!
//! Rejects script-capable HTML and links to internal addresses in
//! user-supplied markdown before it enters the catalog.

mod address;
mod validator;

pub use validator::{
    MarkdownConfig, MarkdownValidator, MarkdownViolation, ViolationKind, DEFAULT_MAX_LENGTH,
};
