//! Command implementations.

pub mod build;
pub mod check;

use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr};
use inkpress_core::SiteConfig;

/// Site settings that can be overridden on the command line.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct SiteArgs {
    /// Content directory
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Static assets directory
    #[arg(long)]
    pub static_dir: Option<PathBuf>,

    /// Template directory
    #[arg(short, long)]
    pub templates: Option<PathBuf>,

    /// Site name
    #[arg(long)]
    pub name: Option<String>,

    /// Override site base URL (e.g., https://example.com)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Number of parallel workers
    #[arg(short, long)]
    pub workers: Option<usize>,
}

impl SiteArgs {
    /// Apply the overrides that were given.
    pub fn apply(&self, mut config: SiteConfig) -> SiteConfig {
        if let Some(input) = &self.input {
            config.input_dir = input.clone();
        }
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }
        if let Some(static_dir) = &self.static_dir {
            config.static_dir = static_dir.clone();
        }
        if let Some(templates) = &self.templates {
            config.template_dir = templates.clone();
        }
        if let Some(name) = &self.name {
            config.name = name.clone();
        }
        if let Some(base_url) = &self.base_url {
            tracing::info!(base_url, "Overriding site base URL from CLI");
            config.base_url = base_url.clone();
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        config
    }
}

/// Load configuration from file and environment, then apply CLI overrides.
pub fn load_config(config_path: &Path, args: &SiteArgs) -> Result<SiteConfig> {
    let config =
        SiteConfig::load_with_env(Some(config_path)).wrap_err("Failed to load configuration")?;
    let config = args
        .apply(config)
        .finish()
        .wrap_err("Invalid configuration")?;

    tracing::debug!(?config, "Loaded configuration");
    Ok(config)
}
