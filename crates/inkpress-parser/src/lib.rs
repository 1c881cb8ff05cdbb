//! Inkpress Parser Library
//!
//! Turns the raw bytes of one content file into a [`Page`]: frontmatter is split off and
//! promoted to typed fields, the body is converted to HTML.

pub mod markdown;

use std::path::Path;

use inkpress_core::{CoreError, Page, frontmatter::parse_frontmatter};
pub use markdown::{MarkdownConverter, MarkdownError, MarkdownParser};
use thiserror::Error;

/// Parser errors.
#[derive(Debug, Error)]
pub enum ParserError {
    /// Content is not valid UTF-8.
    #[error("{path} is not valid UTF-8: {source}")]
    Encoding {
        path: std::path::PathBuf,
        #[source]
        source: std::str::Utf8Error,
    },

    /// Frontmatter block could not be decoded.
    #[error(transparent)]
    Frontmatter(#[from] CoreError),

    /// Markdown conversion failed.
    #[error("markdown error in {path}: {source}")]
    Conversion {
        path: std::path::PathBuf,
        #[source]
        source: MarkdownError,
    },
}

/// Result type for parser operations.
pub type Result<T> = std::result::Result<T, ParserError>;

/// Content parser delegating body conversion to a [`MarkdownConverter`].
#[derive(Debug, Clone, Default)]
pub struct ContentParser<C = MarkdownParser> {
    converter: C,
}

impl<C: MarkdownConverter> ContentParser<C> {
    /// Create a parser around the given converter.
    pub fn new(converter: C) -> Self {
        Self { converter }
    }

    /// Parse one content file.
    ///
    /// The returned page has no permalink, site context or default template yet; the build
    /// fills those in.
    pub fn parse(&self, path: &Path, raw: &[u8]) -> Result<Page> {
        let content = std::str::from_utf8(raw).map_err(|source| ParserError::Encoding {
            path: path.to_path_buf(),
            source,
        })?;

        let (frontmatter, body) = parse_frontmatter(content, path)?;

        let html = self
            .converter
            .convert(body)
            .map_err(|source| ParserError::Conversion {
                path: path.to_path_buf(),
                source,
            })?;

        let title = frontmatter
            .title
            .unwrap_or_else(|| title_from_path(path));

        Ok(Page {
            path: path.to_path_buf(),
            title,
            body: html,
            raw_body: body.to_string(),
            template: frontmatter.template,
            date: frontmatter.date,
            tags: frontmatter.tags,
            draft: frontmatter.draft,
            metadata: frontmatter.extra,
            ..Default::default()
        })
    }
}

/// Parse one content file with the default markdown converter.
pub fn parse(path: &Path, raw: &[u8]) -> Result<Page> {
    ContentParser::<MarkdownParser>::default().parse(path, raw)
}

/// Derive a title from a file name: `about-me.md` becomes `About Me`.
pub fn title_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();

    stem.replace(['-', '_'], " ")
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
