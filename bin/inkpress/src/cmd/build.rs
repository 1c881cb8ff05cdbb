//! Build command - generates the static site

use std::{path::Path, time::Instant};

use color_eyre::eyre::{Result, WrapErr};
use inkpress_generator::Builder;

use super::{SiteArgs, load_config};

/// Run the build command.
///
/// Builds the static site from content files to the output directory.
pub fn run(config_path: &Path, args: &SiteArgs) -> Result<()> {
    let start = Instant::now();
    tracing::info!(?config_path, ?args, "Starting build");

    let config = load_config(config_path, args)?;
    let output = config.output_dir.clone();
    let site_url = config.url_for("/");

    let mut builder = Builder::new(config).wrap_err("Failed to prepare build")?;
    let stats = builder.build().wrap_err("Build failed")?;

    let duration = start.elapsed();

    // Print build statistics
    println!();
    println!("  Build completed successfully!");
    println!();
    println!("  Pages:      {}", stats.pages);
    println!("  Drafts:     {} skipped", stats.drafts);
    println!("  Listings:   {}", stats.listings);
    println!("  Assets:     {}", stats.assets);
    println!();
    println!("  Duration:   {:.2}s", duration.as_secs_f64());
    println!("  Output:     {}", output.display());
    println!("  URL:        {site_url}");
    println!();

    tracing::info!(?stats, ?duration, "Build completed successfully");

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_run_builds_site() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("content")).unwrap();
        fs::create_dir_all(root.join("templates")).unwrap();
        fs::write(root.join("content/index.md"), "# Hi").unwrap();
        fs::write(root.join("templates/page.html"), "{{ body | safe_html }}").unwrap();

        let args = SiteArgs {
            input: Some(root.join("content")),
            output: Some(root.join("public")),
            static_dir: Some(root.join("static")),
            templates: Some(root.join("templates")),
            ..Default::default()
        };

        run(&root.join("inkpress.toml"), &args).unwrap();
        let html = fs::read_to_string(root.join("public/index.html")).unwrap();
        assert!(html.contains("<h1>Hi</h1>"));
    }

    #[test]
    fn test_run_reports_missing_templates() {
        let dir = TempDir::new().unwrap();
        let args = SiteArgs {
            input: Some(dir.path().join("content")),
            output: Some(dir.path().join("public")),
            templates: Some(dir.path().join("templates")),
            ..Default::default()
        };

        let err = run(&dir.path().join("inkpress.toml"), &args).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to prepare build"));
    }
}
