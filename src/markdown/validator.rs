//! # Markdown Validator
//!
//! Denylist checks for user-supplied markdown. Raw HTML that can execute
//! script is rejected outright; every link target (inline links, images,
//! reference definitions, autolinks, bare URLs, `href`/`src` attributes) is
//! checked for script-capable schemes and for hosts on internal networks.
//! All violations are reported together.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::address;

/// Default maximum text length, in characters
pub const DEFAULT_MAX_LENGTH: usize = 200_000;

static RE_SCRIPT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<\s*/?\s*script\b").unwrap());

static RE_FRAME_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<\s*(iframe|frame|object|embed)\b").unwrap());

static RE_EVENT_HANDLER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<[^>]*[\s"'/]on[a-z]+\s*="#).unwrap());

static RE_INLINE_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\]\(\s*<?([^)\s>]+)").unwrap());

static RE_REFERENCE_DEF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s{0,3}\[[^\]]+\]:\s*<?(\S+?)>?(?:\s|$)").unwrap());

static RE_AUTOLINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([a-zA-Z][a-zA-Z0-9+.\-]*:[^>\s]+)>").unwrap());

static RE_BARE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\bhttps?://[^\s<>"')\]]+"#).unwrap());

static RE_HTML_URL_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:href|src|action|formaction|poster)\s*=\s*["']?([^"'\s>]+)"#).unwrap()
});

const DANGEROUS_SCHEMES: &[&str] = &["javascript", "vbscript", "file"];

/// Kind of markdown violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    ScriptTag,
    EmbeddedFrame,
    EventHandler,
    DangerousScheme,
    PrivateAddress,
    TooLong,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::ScriptTag => "script_tag",
            ViolationKind::EmbeddedFrame => "embedded_frame",
            ViolationKind::EventHandler => "event_handler",
            ViolationKind::DangerousScheme => "dangerous_scheme",
            ViolationKind::PrivateAddress => "private_address",
            ViolationKind::TooLong => "too_long",
        }
    }
}

/// One rejected construct
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownViolation {
    pub kind: ViolationKind,
    /// The offending text, truncated
    pub excerpt: String,
}

impl MarkdownViolation {
    fn new(kind: ViolationKind, excerpt: &str) -> Self {
        Self {
            kind,
            excerpt: excerpt.chars().take(80).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownConfig {
    #[serde(default = "default_max_length")]
    pub max_length: usize,
}

fn default_max_length() -> usize {
    DEFAULT_MAX_LENGTH
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownValidator {
    config: MarkdownConfig,
}

impl MarkdownValidator {
    pub fn new(config: MarkdownConfig) -> Self {
        Self { config }
    }

    /// Check `text`, returning every violation found
    pub fn check(&self, text: &str) -> Result<(), Vec<MarkdownViolation>> {
        let mut violations = Vec::new();

        let len = text.chars().count();
        if len > self.config.max_length {
            violations.push(MarkdownViolation::new(
                ViolationKind::TooLong,
                &format!("{} characters, maximum is {}", len, self.config.max_length),
            ));
        }

        for (pattern, kind) in [
            (&*RE_SCRIPT_TAG, ViolationKind::ScriptTag),
            (&*RE_FRAME_TAG, ViolationKind::EmbeddedFrame),
            (&*RE_EVENT_HANDLER, ViolationKind::EventHandler),
        ] {
            for found in pattern.find_iter(text) {
                violations.push(MarkdownViolation::new(kind, found.as_str()));
            }
        }

        for url in link_targets(text) {
            if let Some(kind) = classify_url(url) {
                violations.push(MarkdownViolation::new(kind, url));
            }
        }

        // Repeated constructs are reported once
        let mut seen = Vec::with_capacity(violations.len());
        violations.retain(|v| {
            if seen.contains(v) {
                false
            } else {
                seen.push(v.clone());
                true
            }
        });

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

fn link_targets(text: &str) -> Vec<&str> {
    let mut targets = Vec::new();
    let mut spans = Vec::new();
    for pattern in [
        &*RE_INLINE_LINK,
        &*RE_REFERENCE_DEF,
        &*RE_AUTOLINK,
        &*RE_HTML_URL_ATTR,
    ] {
        for captures in pattern.captures_iter(text) {
            if let Some(url) = captures.get(1) {
                spans.push(url.range());
                targets.push(url.as_str());
            }
        }
    }
    // Bare URLs already inside a link target are not checked twice
    for found in RE_BARE_URL.find_iter(text) {
        if !spans.iter().any(|span| span.contains(&found.start())) {
            targets.push(found.as_str());
        }
    }
    targets
}

fn classify_url(url: &str) -> Option<ViolationKind> {
    // Browsers ignore embedded whitespace and control characters in schemes
    let compact: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect();

    let url = address::parse_target(&compact)?;
    let scheme = url.scheme();
    if DANGEROUS_SCHEMES.contains(&scheme) {
        return Some(ViolationKind::DangerousScheme);
    }
    if scheme == "data" && url.path().to_ascii_lowercase().starts_with("text/html") {
        return Some(ViolationKind::DangerousScheme);
    }

    if address::is_internal_url(&url) {
        Some(ViolationKind::PrivateAddress)
    } else {
        None
    }
}
