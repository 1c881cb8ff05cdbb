//! Check command - validate configuration, templates and content

use std::path::Path;

use color_eyre::eyre::{Result, bail};
use inkpress_core::SiteConfig;
use inkpress_generator::{Builder, Renderer, TemplateRole};

use super::{SiteArgs, load_config};

/// Validation result.
#[derive(Debug, Default)]
struct ValidationResult {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationResult {
    fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Run the check command.
///
/// Loads configuration and templates and parses and renders every content file without
/// writing anything.
pub fn run(config_path: &Path, args: &SiteArgs, strict: bool) -> Result<()> {
    tracing::info!(?config_path, strict, "Checking configuration and content");

    let mut result = ValidationResult::default();

    println!("Checking configuration...");
    let config = match load_config(config_path, args) {
        Ok(c) => {
            println!("  ✓ Configuration valid");
            Some(c)
        }
        Err(e) => {
            result.add_error(format!("Configuration error: {e:#}"));
            println!("  ✗ Configuration invalid: {e:#}");
            None
        }
    };

    if let Some(config) = config {
        println!("\nChecking directories...");
        check_directories(&config, &mut result);

        println!("\nChecking templates...");
        check_templates(&config, &mut result);

        if !result.has_errors() {
            println!("\nChecking content files...");
            check_content(config, &mut result);
        }
    }

    println!();
    println!("Summary:");
    println!("  Errors:   {}", result.errors.len());
    println!("  Warnings: {}", result.warnings.len());

    if result.has_errors() {
        println!();
        println!("Errors:");
        for err in &result.errors {
            println!("  ✗ {err}");
        }
    }

    if result.has_warnings() {
        println!();
        println!("Warnings:");
        for warn in &result.warnings {
            println!("  ⚠ {warn}");
        }
    }

    if result.has_errors() {
        bail!("Validation failed with {} error(s)", result.errors.len());
    }

    if strict && result.has_warnings() {
        bail!(
            "Validation failed with {} warning(s) (strict mode)",
            result.warnings.len()
        );
    }

    println!();
    println!("✓ All checks passed");

    Ok(())
}

/// Content and templates are required; static assets are optional.
fn check_directories(config: &SiteConfig, result: &mut ValidationResult) {
    let required = [
        ("content", &config.input_dir),
        ("templates", &config.template_dir),
    ];
    for (label, dir) in required {
        if dir.is_dir() {
            println!("  ✓ {label}: {}", dir.display());
        } else {
            result.add_error(format!("{label} directory {} is missing", dir.display()));
            println!("  ✗ {label}: {} missing (required)", dir.display());
        }
    }

    if config.static_dir.is_dir() {
        println!("  ✓ static: {}", config.static_dir.display());
    } else {
        println!("  - static: {} not found, skipped", config.static_dir.display());
    }
}

fn check_templates(config: &SiteConfig, result: &mut ValidationResult) {
    if !config.template_dir.is_dir() {
        return;
    }

    match Renderer::new(&config.template_dir) {
        Ok(renderer) => {
            println!("  ✓ {} template(s) compiled", renderer.names().len());
            for role in TemplateRole::ALL {
                if role != TemplateRole::Base && !renderer.contains(role.file_name()) {
                    result.add_warning(format!("missing template {}", role.file_name()));
                }
            }
        }
        Err(e) => {
            result.add_error(e.to_string());
            println!("  ✗ {e}");
        }
    }
}

fn check_content(config: SiteConfig, result: &mut ValidationResult) {
    let outcome = Builder::new(config).and_then(|mut builder| builder.check());
    match outcome {
        Ok(stats) => {
            println!(
                "  ✓ {} page(s) valid, {} draft(s) skipped",
                stats.pages, stats.drafts
            );
        }
        Err(e) => {
            result.add_error(e.to_string());
            println!("  ✗ {e}");
        }
    }
}
