//! Site configuration management.
//!
//! Settings are layered: built-in defaults, an optional TOML file, then `SITE_*` environment
//! variables. Command-line overrides are applied by the binary on top.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Prefix for environment overrides, e.g. `SITE_OUTPUT_DIR`.
pub const ENV_PREFIX: &str = "SITE";

/// Configuration for one site build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Markdown content root.
    pub input_dir: PathBuf,

    /// Generated site root.
    pub output_dir: PathBuf,

    /// Static assets mirrored into the output root.
    pub static_dir: PathBuf,

    /// Directory of `*.html` templates.
    pub template_dir: PathBuf,

    /// Site name exposed to templates.
    pub name: String,

    /// Base URL, e.g. `https://example.com`.
    pub base_url: String,

    /// Number of parallel workers.
    pub workers: usize,

    /// Capacity of the bounded work queue between traversal and workers.
    pub queue_capacity: usize,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("content"),
            output_dir: PathBuf::from("public"),
            static_dir: PathBuf::from("static"),
            template_dir: PathBuf::from("templates"),
            name: "My Site".to_string(),
            base_url: "http://localhost:8080".to_string(),
            workers: 4,
            queue_capacity: 64,
        }
    }
}

impl SiteConfig {
    /// Load configuration from defaults, an optional file and the environment.
    ///
    /// A missing file is not an error; the environment always applies.
    pub fn load_with_env(path: Option<&Path>) -> Result<Self> {
        let defaults = config::Config::try_from(&SiteConfig::default())?;

        let mut builder = config::Config::builder().add_source(defaults);
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        let failure = |e: config::ConfigError| {
            let origin = path.map_or_else(
                || "environment".to_string(),
                |p| p.display().to_string(),
            );
            CoreError::config_with_source(format!("Failed to load configuration from {origin}"), e)
        };

        let settings = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .map_err(failure)?;

        let config: SiteConfig = settings.try_deserialize().map_err(failure)?;
        config.finish()
    }

    /// Normalize and validate.
    pub fn finish(mut self) -> Result<Self> {
        self.base_url = normalize_base_url(&self.base_url);
        self.workers = self.workers.max(1);
        self.queue_capacity = self.queue_capacity.max(1);
        self.validate()?;
        Ok(self)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::config("name cannot be empty"));
        }

        if self.base_url.is_empty() {
            return Err(CoreError::config("base_url cannot be empty"));
        }

        if self.input_dir == self.output_dir {
            return Err(CoreError::config(
                "input_dir and output_dir must be different directories",
            ));
        }

        Ok(())
    }

    /// Get the full URL for a path.
    pub fn url_for(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }
}

/// Add an `https://` scheme when none is given and trim trailing slashes.
fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        tracing::debug!(base_url = trimmed, "base_url has no scheme, assuming https");
        format!("https://{trimmed}")
    };

    with_scheme.trim_end_matches('/').to_string()
}
