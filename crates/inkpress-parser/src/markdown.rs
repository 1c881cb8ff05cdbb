//! Markdown to HTML conversion using pulldown-cmark.

use pulldown_cmark::{Options, Parser, html};
use thiserror::Error;

/// Markdown conversion errors.
#[derive(Debug, Error)]
pub enum MarkdownError {
    /// The converter rejected its input.
    #[error("conversion failed: {0}")]
    Conversion(String),
}

/// Result type for markdown operations.
pub type Result<T> = std::result::Result<T, MarkdownError>;

/// Converts a markdown body to an HTML fragment.
///
/// Implementations must be pure: the same input always yields the same output.
pub trait MarkdownConverter: Send + Sync {
    /// Convert `source` to HTML.
    fn convert(&self, source: &str) -> Result<String>;
}

/// CommonMark converter with the usual extensions enabled.
#[derive(Debug, Clone)]
pub struct MarkdownParser {
    options: Options,
}

impl Default for MarkdownParser {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownParser {
    /// Create a new markdown parser with default options.
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

        Self { options }
    }

    /// Create a parser with an explicit option set.
    pub fn with_options(options: Options) -> Self {
        Self { options }
    }
}

impl MarkdownConverter for MarkdownParser {
    fn convert(&self, source: &str) -> Result<String> {
        let parser = Parser::new_ext(source, self.options);
        let mut out = String::with_capacity(source.len() * 3 / 2);
        html::push_html(&mut out, parser);
        Ok(out)
    }
}
