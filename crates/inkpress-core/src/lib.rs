//! Inkpress Core Library
//!
//! Core types, configuration, and error handling for the Inkpress static site generator.

pub mod config;
pub mod content;
pub mod error;
pub mod frontmatter;

pub use config::SiteConfig;
pub use content::{BLOG_COLLECTION, Page, ROOT_COLLECTION, Site};
pub use error::{CoreError, Result};
pub use frontmatter::Frontmatter;
