//! Content types and structures.

use std::{
    collections::{BTreeMap, HashMap},
    path::{Component, Path, PathBuf},
};

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::SiteConfig;

/// Collection key for pages living directly in the content root.
pub const ROOT_COLLECTION: &str = "pages";

/// Collection that gets a listing page and feeds the home page.
pub const BLOG_COLLECTION: &str = "blog";

/// A content page, before or after rendering.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Page {
    /// Source file path.
    pub path: PathBuf,

    /// URL path for this page, e.g. `/about/`.
    pub permalink: String,

    /// Page title.
    pub title: String,

    /// Converted HTML body.
    pub body: String,

    /// Markdown body with frontmatter removed.
    pub raw_body: String,

    /// Plain-text excerpt for listings.
    pub summary: Option<String>,

    /// Template to use for rendering.
    pub template: Option<String>,

    /// Publication date.
    pub date: Option<NaiveDate>,

    /// Tags for this page.
    pub tags: Vec<String>,

    /// Whether this is a draft.
    pub draft: bool,

    /// Site name, injected at build time.
    pub site_name: String,

    /// Site base URL, injected at build time.
    pub base_url: String,

    /// Pages referenced by a listing page.
    pub pages: Vec<Page>,

    /// Frontmatter keys without a typed field, plus build-time additions.
    pub metadata: BTreeMap<String, serde_yaml::Value>,
}

impl Page {
    /// Sort key placing newer pages first and undated pages last.
    pub fn recency_key(&self) -> (bool, std::cmp::Reverse<Option<NaiveDate>>) {
        (self.date.is_none(), std::cmp::Reverse(self.date))
    }
}

/// State of one build session.
#[derive(Debug)]
pub struct Site {
    config: SiteConfig,

    /// Published pages in source-path order.
    pub pages: Vec<Page>,

    /// Pages grouped by collection key.
    pub collections: HashMap<String, Vec<Page>>,
}

impl Site {
    /// Create an empty site for the given configuration.
    #[must_use]
    pub fn new(config: SiteConfig) -> Self {
        Self {
            config,
            pages: Vec::new(),
            collections: HashMap::new(),
        }
    }

    /// Session configuration.
    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Drop every page accumulated by a previous build.
    pub fn reset(&mut self) {
        self.pages.clear();
        self.collections.clear();
    }

    /// Record a published page in the page list and its collection.
    pub fn insert(&mut self, page: Page) {
        let relative = page
            .path
            .strip_prefix(&self.config.input_dir)
            .unwrap_or(&page.path);
        let key = collection_key(relative);

        self.collections.entry(key).or_default().push(page.clone());
        self.pages.push(page);
    }

    /// Pages of one collection, empty when it does not exist.
    pub fn collection(&self, key: &str) -> &[Page] {
        self.collections.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The published page served at `/`, if any.
    pub fn home_page(&self) -> Option<&Page> {
        self.pages.iter().find(|p| p.permalink == "/")
    }
}

/// Collection key for a path relative to the content root.
///
/// The key is the first directory component; files at the root belong to [`ROOT_COLLECTION`].
pub fn collection_key(relative: &Path) -> String {
    let parent = relative.parent().unwrap_or(Path::new(""));
    match parent.components().next() {
        Some(Component::Normal(first)) => first.to_string_lossy().into_owned(),
        _ => ROOT_COLLECTION.to_string(),
    }
}
