//! Build orchestration.
//!
//! Coordinates the full site build: output preparation, parallel page generation, static asset
//! mirroring, the blog listing and the home page refresh.

use std::{
    collections::{HashMap, HashSet},
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

use inkpress_core::{BLOG_COLLECTION, Page, Site, SiteConfig};
use inkpress_parser::{ContentParser, MarkdownConverter, MarkdownParser, ParserError};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::{
    assets::{AssetCopier, AssetError},
    collector::{
        RECENT_POSTS, blog_listing, blog_listing_permalink, default_template, is_content_file,
        output_file, permalink_for, prepare_collection,
    },
    pool::{Feeder, PoolError, WorkerPool},
    template::{Renderer, TemplateError},
};

/// Directory in the output root that survives every build.
pub const PRESERVED_ENTRY: &str = ".git";

/// Build errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// IO error on a specific path.
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Content traversal error.
    #[error("cannot walk content directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// A content file could not be parsed.
    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParserError,
    },

    /// Template loading or rendering failed.
    #[error("template error for {path}: {source}")]
    Template {
        path: PathBuf,
        #[source]
        source: TemplateError,
    },

    /// Static asset error.
    #[error("asset error: {0}")]
    Asset(#[from] AssetError),

    /// Two published pages resolve to the same URL.
    #[error("duplicate permalink {permalink}: {first} and {second}")]
    DuplicatePermalink {
        permalink: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// Page data could not be converted into template metadata.
    #[error("metadata error: {0}")]
    Metadata(#[from] serde_yaml::Error),

    /// Worker pool error.
    #[error("worker pool error: {0}")]
    Pool(#[from] PoolError),
}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Build statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Number of content pages published.
    pub pages: usize,

    /// Number of drafts skipped.
    pub drafts: usize,

    /// Number of listing pages generated.
    pub listings: usize,

    /// Number of static assets copied.
    pub assets: usize,

    /// Build duration in milliseconds.
    pub duration_ms: u64,
}

/// Outcome of processing one content file.
#[derive(Debug)]
enum Processed {
    Published(Page),
    Draft,
}

/// Whether processed pages are written to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Write,
    DryRun,
}

/// Site builder that orchestrates the build process.
#[derive(Debug)]
pub struct Builder<C = MarkdownParser> {
    site: Site,
    parser: ContentParser<C>,
    renderer: Renderer,
    pool: WorkerPool,
}

impl Builder {
    /// Create a builder with the default markdown converter.
    pub fn new(config: SiteConfig) -> Result<Self> {
        Self::with_parser(config, ContentParser::default())
    }
}

impl<C: MarkdownConverter> Builder<C> {
    /// Create a builder around a specific content parser.
    ///
    /// Templates are compiled and the worker pool is started here, once per builder.
    pub fn with_parser(config: SiteConfig, parser: ContentParser<C>) -> Result<Self> {
        let renderer =
            Renderer::new(&config.template_dir).map_err(|source| BuildError::Template {
                path: config.template_dir.clone(),
                source,
            })?;
        let pool = WorkerPool::new(config.workers, config.queue_capacity)?;

        Ok(Self {
            site: Site::new(config),
            parser,
            renderer,
            pool,
        })
    }

    /// State accumulated by the last build.
    pub fn site(&self) -> &Site {
        &self.site
    }

    /// Execute the full build process.
    pub fn build(&mut self) -> Result<BuildStats> {
        let start = Instant::now();
        let config = self.site.config().clone();

        info!(
            content = %config.input_dir.display(),
            output = %config.output_dir.display(),
            workers = self.pool.workers(),
            "starting build"
        );

        // 1. Output root, keeping version control metadata
        prepare_output(&config.output_dir)?;

        // 2-5. Pages
        let mut stats = self.generate_pages(Mode::Write)?;

        // 6. Static assets, never overwriting generated pages
        let copier = AssetCopier::new().with_reserved(self.reserved_outputs());
        stats.assets = copier.copy(&config.static_dir, &config.output_dir)?;

        // 7. Blog listing
        let posts = self.synthesize_blog_index()?;
        if !posts.is_empty() {
            stats.listings = 1;
        }

        // 8. Home page with recent posts
        self.augment_home(&posts)?;

        stats.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            pages = stats.pages,
            drafts = stats.drafts,
            listings = stats.listings,
            assets = stats.assets,
            duration_ms = stats.duration_ms,
            "build complete"
        );

        Ok(stats)
    }

    /// Parse and render every content file without touching the output directory.
    pub fn check(&mut self) -> Result<BuildStats> {
        let start = Instant::now();
        let mut stats = self.generate_pages(Mode::DryRun)?;
        stats.duration_ms = start.elapsed().as_millis() as u64;

        info!(pages = stats.pages, drafts = stats.drafts, "check complete");
        Ok(stats)
    }

    /// Process all content files in parallel and record the published pages.
    fn generate_pages(&mut self, mode: Mode) -> Result<BuildStats> {
        self.site.reset();

        let input_dir = self.site.config().input_dir.clone();
        let processed = self.pool.run(
            |feeder| feed_content_files(&input_dir, feeder),
            |path| self.process_file(&path, mode).map(Some),
        )?;

        let mut stats = BuildStats::default();
        let mut pages = Vec::with_capacity(processed.len());
        for outcome in processed {
            match outcome {
                Processed::Published(page) => pages.push(page),
                Processed::Draft => stats.drafts += 1,
            }
        }

        pages.sort_by(|a, b| a.path.cmp(&b.path));
        stats.pages = pages.len();
        for page in pages {
            self.site.insert(page);
        }

        let mut claimed = Vec::new();
        if !self.site.collection(BLOG_COLLECTION).is_empty() {
            claimed.push((blog_listing_permalink(), input_dir.join(BLOG_COLLECTION)));
        }
        check_permalinks(&self.site.pages, &claimed)?;

        info!(
            pages = stats.pages,
            drafts = stats.drafts,
            collections = self.site.collections.len(),
            "pages generated"
        );
        Ok(stats)
    }

    /// Read, parse, enrich, render and write one content file.
    fn process_file(&self, path: &Path, mode: Mode) -> Result<Processed> {
        debug!(path = %path.display(), "processing file");
        let config = self.site.config();

        let raw = fs::read(path).map_err(|source| BuildError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut page = self
            .parser
            .parse(path, &raw)
            .map_err(|source| BuildError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if page.draft {
            info!(path = %path.display(), "skipping draft");
            return Ok(Processed::Draft);
        }

        let relative = path.strip_prefix(&config.input_dir).unwrap_or(path);
        page.permalink = permalink_for(relative);
        if page.template.is_none() {
            page.template = Some(default_template(relative).to_string());
        }
        page.site_name = config.name.clone();
        page.base_url = config.base_url.clone();

        match mode {
            Mode::Write => write_page(&self.renderer, &page, &config.output_dir)?,
            Mode::DryRun => {
                render_page(&self.renderer, &page)?;
            }
        }

        Ok(Processed::Published(page))
    }

    /// Output files owned by generated pages, relative to the output root.
    fn reserved_outputs(&self) -> HashSet<PathBuf> {
        let mut reserved: HashSet<_> = self
            .site
            .pages
            .iter()
            .map(|page| output_file(&page.permalink))
            .collect();

        if !self.site.collection(BLOG_COLLECTION).is_empty() {
            reserved.insert(output_file(&blog_listing_permalink()));
        }
        reserved
    }

    /// Sort the blog collection, summarize it and render its listing page.
    ///
    /// Returns the sorted posts, empty when the site has no blog.
    fn synthesize_blog_index(&mut self) -> Result<Vec<Page>> {
        let posts = prepare_collection(self.site.collection(BLOG_COLLECTION));
        if posts.is_empty() {
            debug!("no blog posts, skipping listing");
            return Ok(posts);
        }

        let config = self.site.config();
        let listing = blog_listing(&posts, config);
        write_page(&self.renderer, &listing, &config.output_dir)?;
        info!(posts = posts.len(), permalink = %listing.permalink, "generated blog listing");

        self.site
            .collections
            .insert(BLOG_COLLECTION.to_string(), posts.clone());
        Ok(posts)
    }

    /// Expose the newest posts to the home page and render it again.
    ///
    /// Takes the collection as sorted by [`Self::synthesize_blog_index`].
    fn augment_home(&mut self, posts: &[Page]) -> Result<()> {
        if posts.is_empty() {
            return Ok(());
        }
        let output_dir = self.site.config().output_dir.clone();
        let Some(home) = self.site.pages.iter_mut().find(|p| p.permalink == "/") else {
            debug!("no home page, skipping recent posts");
            return Ok(());
        };

        let recent = &posts[..posts.len().min(RECENT_POSTS)];
        home.metadata
            .insert("recent_posts".to_string(), serde_yaml::to_value(recent)?);

        write_page(&self.renderer, home, &output_dir)?;
        info!(recent = recent.len(), "updated home page");
        Ok(())
    }
}

/// Producer side of the pool: push every content file under `input_dir`.
fn feed_content_files(input_dir: &Path, feeder: Feeder<PathBuf>) -> Result<()> {
    for entry in WalkDir::new(input_dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() || !is_content_file(entry.path()) {
            continue;
        }
        if !feeder.push(entry.into_path()) {
            debug!("workers stopped, ending traversal");
            break;
        }
    }
    Ok(())
}

/// Fail on the first permalink claimed twice.
///
/// `claimed` holds permalinks owned by synthesized pages, with the path reported for them.
fn check_permalinks(pages: &[Page], claimed: &[(String, PathBuf)]) -> Result<()> {
    let mut seen: HashMap<&str, &Path> = claimed
        .iter()
        .map(|(permalink, path)| (permalink.as_str(), path.as_path()))
        .collect();
    for page in pages {
        if let Some(first) = seen.insert(&page.permalink, &page.path) {
            return Err(BuildError::DuplicatePermalink {
                permalink: page.permalink.clone(),
                first: first.to_path_buf(),
                second: page.path.clone(),
            });
        }
    }
    Ok(())
}

fn render_page(renderer: &Renderer, page: &Page) -> Result<Vec<u8>> {
    renderer.render(page).map_err(|source| BuildError::Template {
        path: page.path.clone(),
        source,
    })
}

/// Render a page and write it to its clean-URL location under `output_dir`.
fn write_page(renderer: &Renderer, page: &Page, output_dir: &Path) -> Result<()> {
    let html = render_page(renderer, page)?;
    let output_path = output_dir.join(output_file(&page.permalink));

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent).map_err(|source| BuildError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(&output_path, html).map_err(|source| BuildError::Io {
        path: output_path.clone(),
        source,
    })?;

    debug!(path = %output_path.display(), permalink = %page.permalink, "wrote page");
    Ok(())
}

/// Create the output directory, or empty it except for [`PRESERVED_ENTRY`].
fn prepare_output(dir: &Path) -> Result<()> {
    let io_error = |path: &Path| {
        let path = path.to_path_buf();
        move |source| BuildError::Io { path, source }
    };

    if !dir.exists() {
        debug!(dir = %dir.display(), "creating output directory");
        return fs::create_dir_all(dir).map_err(io_error(dir));
    }

    debug!(dir = %dir.display(), "cleaning output directory");
    for entry in fs::read_dir(dir).map_err(io_error(dir))? {
        let entry = entry.map_err(io_error(dir))?;
        if entry.file_name() == PRESERVED_ENTRY {
            continue;
        }

        let path = entry.path();
        let file_type = entry.file_type().map_err(io_error(&path))?;
        if file_type.is_dir() {
            fs::remove_dir_all(&path).map_err(io_error(&path))?;
        } else {
            fs::remove_file(&path).map_err(io_error(&path))?;
        }
    }
    Ok(())
}
