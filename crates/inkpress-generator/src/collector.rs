//! Content routing and collection organization.
//!
//! Maps source files to clean URLs and output files, and derives the ordered, summarized view of
//! a collection used by listing pages and the home page.

use std::path::{Component, Path, PathBuf};

use inkpress_core::{BLOG_COLLECTION, Page, SiteConfig, content::collection_key};

use crate::template::TemplateRole;

/// Maximum number of characters kept in a summary, before the ellipsis.
pub const SUMMARY_LENGTH: usize = 150;

/// Number of posts exposed to the home page as `recent_posts`.
pub const RECENT_POSTS: usize = 5;

/// File name every clean-URL directory is served from.
pub const INDEX_FILE: &str = "index.html";

/// Whether a path names a markdown content file.
pub fn is_content_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
}

/// Permalink for a content file, given its path relative to the content root.
///
/// `index.md` at the root is served at `/`; every other file at `/<path without extension>/`.
pub fn permalink_for(relative: &Path) -> String {
    let stem = relative.with_extension("");
    let parts: Vec<_> = stem
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect();

    if parts.is_empty() || (parts.len() == 1 && parts[0] == "index") {
        return "/".to_string();
    }

    format!("/{}/", parts.join("/"))
}

/// Output file for a permalink, relative to the output root.
pub fn output_file(permalink: &str) -> PathBuf {
    let mut path = PathBuf::new();
    for segment in permalink.split('/').filter(|s| !s.is_empty()) {
        path.push(segment);
    }
    path.push(INDEX_FILE);
    path
}

/// Template used when a page's front matter names none.
pub fn default_template(relative: &Path) -> &'static str {
    if collection_key(relative) == BLOG_COLLECTION {
        TemplateRole::Post.file_name()
    } else {
        TemplateRole::Page.file_name()
    }
}

/// Plain-text excerpt of a markdown body.
///
/// Keeps the first [`SUMMARY_LENGTH`] characters, trimmed, and appends `...` only when something
/// was cut off.
pub fn summarize(raw: &str) -> String {
    let raw = raw.trim();
    match raw.char_indices().nth(SUMMARY_LENGTH) {
        Some((cut, _)) => format!("{}...", raw[..cut].trim_end()),
        None => raw.to_string(),
    }
}

/// Sort newest first, undated pages last, ties by source path.
pub fn sort_by_recency(pages: &mut [Page]) {
    pages.sort_by(|a, b| {
        a.recency_key()
            .cmp(&b.recency_key())
            .then_with(|| a.path.cmp(&b.path))
    });
}

/// Sorted and summarized copy of a collection.
pub fn prepare_collection(pages: &[Page]) -> Vec<Page> {
    let mut sorted = pages.to_vec();
    sort_by_recency(&mut sorted);
    for page in &mut sorted {
        page.summary = Some(summarize(&page.raw_body));
    }
    sorted
}

/// Permalink owned by the blog listing whenever the blog has posts.
pub fn blog_listing_permalink() -> String {
    format!("/{BLOG_COLLECTION}/")
}

/// Synthetic listing page for the blog collection.
pub fn blog_listing(posts: &[Page], config: &SiteConfig) -> Page {
    Page {
        path: config.input_dir.join(BLOG_COLLECTION),
        permalink: blog_listing_permalink(),
        title: "Blog".to_string(),
        template: Some(TemplateRole::List.file_name().to_string()),
        site_name: config.name.clone(),
        base_url: config.base_url.clone(),
        pages: posts.to_vec(),
        ..Default::default()
    }
}
