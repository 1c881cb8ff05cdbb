//! HTML template system for page generation.
//!
//! Templates are the `*.html` files of one flat directory, compiled once into a minijinja
//! environment and addressed by file name. A page is rendered with its own fields as the
//! template context.

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::Local;
use inkpress_core::Page;
use minijinja::{Environment, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Template errors.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Template directory could not be loaded.
    #[error("cannot load templates from {path}: {message}")]
    Construction { path: PathBuf, message: String },

    /// Neither the requested template nor the fallback exists.
    #[error("template not found: {name} (and no {fallback} fallback)", fallback = TemplateRole::Base.file_name())]
    NotFound { name: String },

    /// Template execution failed against the page data.
    #[error("failed to render {name}: {message}")]
    Render { name: String, message: String },
}

/// Result type for template operations.
pub type Result<T> = std::result::Result<T, TemplateError>;

/// Templates the build relies on by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateRole {
    /// Default for ordinary pages.
    Page,
    /// Default for pages in the blog collection.
    Post,
    /// Blog listing page.
    List,
    /// Fallback when a requested template is missing.
    Base,
}

impl TemplateRole {
    /// All roles, in lookup-priority order.
    pub const ALL: [TemplateRole; 4] = [Self::Page, Self::Post, Self::List, Self::Base];

    /// File name of the template serving this role.
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Page => "page.html",
            Self::Post => "post.html",
            Self::List => "list.html",
            Self::Base => "base.html",
        }
    }
}

/// Compiled template registry with helper functions.
///
/// Immutable once built, so one renderer can be shared by every worker.
#[derive(Debug)]
pub struct Renderer {
    env: Environment<'static>,
    names: Vec<String>,
}

impl Renderer {
    /// Load and compile every template in `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let construction = |message: String| TemplateError::Construction {
            path: dir.to_path_buf(),
            message,
        };

        let entries = fs::read_dir(dir).map_err(|e| construction(e.to_string()))?;

        let mut sources = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| construction(e.to_string()))?;
            let path = entry.path();

            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.starts_with('.') || !path.is_file() {
                continue;
            }
            if !path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("html"))
            {
                continue;
            }

            let source = fs::read_to_string(&path)
                .map_err(|e| construction(format!("{}: {e}", path.display())))?;
            sources.push((name.to_string(), source));
        }

        if sources.is_empty() {
            return Err(construction("no *.html templates found".to_string()));
        }

        // Deterministic registration order keeps error reporting stable.
        sources.sort_by(|a, b| a.0.cmp(&b.0));
        Self::from_sources(dir, sources)
    }

    /// Compile templates from in-memory `(name, source)` pairs.
    pub fn from_sources(
        origin: &Path,
        sources: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self> {
        let mut env = Environment::new();
        register_helpers(&mut env);

        let mut names = Vec::new();
        for (name, source) in sources {
            env.add_template_owned(name.clone(), source)
                .map_err(|e| TemplateError::Construction {
                    path: origin.join(&name),
                    message: e.to_string(),
                })?;
            debug!(template = %name, "compiled template");
            names.push(name);
        }

        for role in TemplateRole::ALL {
            if role != TemplateRole::Base && !names.iter().any(|n| n == role.file_name()) {
                warn!(template = role.file_name(), "built-in template role is missing");
            }
        }

        info!(count = names.len(), dir = %origin.display(), "loaded templates");
        Ok(Self { env, names })
    }

    /// Names of all registered templates, sorted.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Whether a template with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.env.get_template(name).is_ok()
    }

    /// Resolve a template name, falling back to the base template.
    ///
    /// An unset name means the page template. Returns the name actually used.
    pub fn resolve<'a>(&self, name: Option<&'a str>) -> Result<&'a str> {
        let name = name.unwrap_or(TemplateRole::Page.file_name());
        if self.contains(name) {
            return Ok(name);
        }

        let fallback = TemplateRole::Base.file_name();
        if self.contains(fallback) {
            debug!(requested = name, fallback, "falling back to base template");
            return Ok(fallback);
        }

        Err(TemplateError::NotFound {
            name: name.to_string(),
        })
    }

    /// Render a page with the template it names.
    pub fn render(&self, page: &Page) -> Result<Vec<u8>> {
        let name = self.resolve(page.template.as_deref())?;
        let render_error = |e: minijinja::Error| TemplateError::Render {
            name: name.to_string(),
            message: format!("{e:#}"),
        };

        let template = self.env.get_template(name).map_err(render_error)?;
        let html = template
            .render(Value::from_serialize(page))
            .map_err(render_error)?;

        Ok(html.into_bytes())
    }
}

/// Register the helpers every template can use.
fn register_helpers(env: &mut Environment<'static>) {
    env.add_function("now", now);
    env.add_function("first", first);
    env.add_function("safe_html", safe_html);
    env.add_filter("safe_html", safe_html);
}

/// Current local time, formatted with a chrono format string.
fn now(format: Option<String>) -> String {
    Local::now()
        .format(format.as_deref().unwrap_or("%Y-%m-%d"))
        .to_string()
}

/// Mark a string as already-escaped HTML.
fn safe_html(value: String) -> Value {
    Value::from_safe_string(value)
}

/// First `n` items of a sequence.
fn first(n: usize, items: Vec<Value>) -> Vec<Value> {
    items.into_iter().take(n).collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use tempfile::TempDir;

    use super::*;

    fn write_templates(templates: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (name, content) in templates {
            fs::write(dir.path().join(name), content).unwrap();
        }
        dir
    }

    fn standard_templates() -> TempDir {
        write_templates(&[
            (
                "page.html",
                "<!DOCTYPE html><html><head><title>{{ title }}</title></head>\
                 <body><h1>{{ title }}</h1>{{ body | safe_html }}</body></html>",
            ),
            (
                "post.html",
                "<article><h1>{{ title }}</h1>{% if date %}<time>{{ date }}</time>{% endif %}\
                 {{ body | safe_html }}</article>",
            ),
            (
                "list.html",
                "<h1>{{ title }}</h1>{% for p in first(2, pages) %}<h2>{{ p.title }}</h2>{% endfor %}",
            ),
        ])
    }

    fn page(title: &str, template: Option<&str>) -> Page {
        Page {
            title: title.to_string(),
            body: "<p>Test content</p>".to_string(),
            template: template.map(str::to_string),
            site_name: "Test Site".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_render_basic_page() {
        let dir = standard_templates();
        let renderer = Renderer::new(dir.path()).unwrap();

        let html = renderer.render(&page("Test Page", Some("page.html"))).unwrap();
        let html = String::from_utf8(html).unwrap();

        assert!(html.contains("<!DOCTYPE html>"));
        assert!(html.contains("<h1>Test Page</h1>"));
        assert!(html.contains("<p>Test content</p>"));
    }

    #[test]
    fn test_render_post_with_date() {
        let dir = standard_templates();
        let renderer = Renderer::new(dir.path()).unwrap();

        let mut post = page("Blog Post", Some("post.html"));
        post.date = NaiveDate::from_ymd_opt(2023, 10, 1);

        let html = String::from_utf8(renderer.render(&post).unwrap()).unwrap();
        assert!(html.contains("<time>2023-10-01</time>"));
    }

    #[test]
    fn test_unset_template_uses_page() {
        let dir = standard_templates();
        let renderer = Renderer::new(dir.path()).unwrap();

        let html = String::from_utf8(renderer.render(&page("Default Page", None)).unwrap()).unwrap();
        assert!(html.contains("<title>Default Page</title>"));
    }

    #[test]
    fn test_autoescape_without_safe_html() {
        let dir = write_templates(&[("page.html", "{{ body }}")]);
        let renderer = Renderer::new(dir.path()).unwrap();

        let html = String::from_utf8(renderer.render(&page("T", None)).unwrap()).unwrap();
        assert!(html.contains("&lt;p&gt;"));
    }

    #[test]
    fn test_permalink_in_href_needs_safe_html() {
        let dir = write_templates(&[(
            "page.html",
            "<a href=\"{{ permalink }}\"></a><a href=\"{{ permalink | safe_html }}\"></a>",
        )]);
        let renderer = Renderer::new(dir.path()).unwrap();

        let mut linked = page("T", None);
        linked.permalink = "/blog/post1/".to_string();

        let html = String::from_utf8(renderer.render(&linked).unwrap()).unwrap();
        assert!(html.contains("<a href=\"&#x2f;blog&#x2f;post1&#x2f;\"></a>"));
        assert!(html.contains("<a href=\"/blog/post1/\"></a>"));
    }

    #[test]
    fn test_first_helper_bounds_sequence() {
        let dir = standard_templates();
        let renderer = Renderer::new(dir.path()).unwrap();

        let mut listing = page("Blog", Some("list.html"));
        listing.pages = vec![page("One", None), page("Two", None), page("Three", None)];

        let html = String::from_utf8(renderer.render(&listing).unwrap()).unwrap();
        assert!(html.contains("<h2>One</h2><h2>Two</h2>"));
        assert!(!html.contains("Three"));
    }

    #[test]
    fn test_now_helper() {
        let dir = write_templates(&[("page.html", "{{ now('%Y') }}")]);
        let renderer = Renderer::new(dir.path()).unwrap();

        let html = String::from_utf8(renderer.render(&page("T", None)).unwrap()).unwrap();
        assert_eq!(html, Local::now().format("%Y").to_string());
    }

    #[test]
    fn test_missing_template_falls_back_to_base() {
        let dir = write_templates(&[("base.html", "base:{{ title }}")]);
        let renderer = Renderer::new(dir.path()).unwrap();

        assert_eq!(renderer.resolve(Some("home.html")).unwrap(), "base.html");
        let html = renderer.render(&page("Home", Some("home.html"))).unwrap();
        assert_eq!(html, b"base:Home");
    }

    #[test]
    fn test_missing_template_without_base() {
        let dir = standard_templates();
        let renderer = Renderer::new(dir.path()).unwrap();

        let err = renderer.render(&page("Home", Some("home.html"))).unwrap_err();
        assert!(matches!(err, TemplateError::NotFound { ref name } if name == "home.html"));
    }

    #[test]
    fn test_execution_error() {
        let dir = write_templates(&[("page.html", "{{ first('many', pages) }}")]);
        let renderer = Renderer::new(dir.path()).unwrap();

        let err = renderer.render(&page("T", None)).unwrap_err();
        assert!(matches!(err, TemplateError::Render { ref name, .. } if name == "page.html"));
    }

    #[test]
    fn test_missing_directory() {
        let err = Renderer::new("/non/existent/directory").unwrap_err();
        assert!(matches!(err, TemplateError::Construction { .. }));
    }

    #[test]
    fn test_empty_directory() {
        let dir = write_templates(&[("notes.txt", "not a template")]);
        let err = Renderer::new(dir.path()).unwrap_err();
        assert!(err.to_string().contains("no *.html templates"));
    }

    #[test]
    fn test_syntax_error_fails_construction() {
        let dir = write_templates(&[("page.html", "{% if title %}unclosed")]);
        let err = Renderer::new(dir.path()).unwrap_err();
        assert!(matches!(err, TemplateError::Construction { ref path, .. } if path.ends_with("page.html")));
    }

    #[test]
    fn test_names_are_sorted() {
        let dir = standard_templates();
        let renderer = Renderer::new(dir.path()).unwrap();
        assert_eq!(renderer.names(), ["list.html", "page.html", "post.html"]);
    }

    #[test]
    fn test_renderer_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Renderer>();
    }
}
