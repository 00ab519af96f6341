//! Minimal template engine.
//!
//! Two constructs:
//!
//! - `{{ name }}` inserts a variable, html-escaped except for `content`,
//!   `toc` and `translations`
//! - `{% include "partials/nav.html" %}` inlines another template
//!
//! Templates are looked up in the site template directory first, then in
//! the theme. Every file read during a render is reported as a dependency.
//!
//! | Variable        | Value                                         |
//! |-----------------|-----------------------------------------------|
//! | `title`         | page title, or the site title                 |
//! | `content`       | page html                                     |
//! | `toc`           | `<ul class="toc">` of the page headings       |
//! | `translations`  | `<ul class="translations">` language switcher |
//! | `site_title`    | `[site].title`                                |
//! | `base_url`      | `[site].url` without trailing slash           |
//! | `root`          | relative prefix back to the site root         |
//! | `locale`, `url` | of the page being rendered                    |
//! | `page.<key>`    | string, number or bool front matter values    |

use super::{PageContext, Rendered, Renderer};
use anyhow::Result;
use regex::Regex;
use rustc_hash::FxHashMap;
use std::fmt::Write;
use std::future::Future;
use std::path::{Component, Path, PathBuf};
use std::pin::Pin;
use std::sync::LazyLock;
use thiserror::Error;

const MAX_INCLUDE_DEPTH: usize = 16;

static INCLUDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{%\s*include\s+"([^"]+)"\s*%\}"#).expect("include pattern")
});

static VARIABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_.]*)\s*\}\}").expect("variable pattern")
});

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template `{name}` not found in {}", format_dirs(.searched))]
    NotFound { name: String, searched: Vec<PathBuf> },

    #[error("include depth of {max} exceeded at `{name}`, include cycle?")]
    IncludeDepth { name: String, max: usize },

    #[error("template name `{0}` must stay inside the template directories")]
    OutsideRoot(String),

    #[error("unknown variable `{name}` in `{template}`")]
    UnknownVariable { name: String, template: String },

    #[error("failed to read `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn format_dirs(dirs: &[PathBuf]) -> String {
    dirs.iter()
        .map(|d| d.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

type Expansion<'a> = Pin<Box<dyn Future<Output = Result<String, TemplateError>> + Send + 'a>>;

/// Renders pages with templates from an ordered list of directories.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    dirs: Vec<PathBuf>,
}

impl TemplateRenderer {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    async fn locate(&self, name: &str) -> Result<PathBuf, TemplateError> {
        let rel = Path::new(name);
        if rel.as_os_str().is_empty() || !rel.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(TemplateError::OutsideRoot(name.to_string()));
        }
        for dir in &self.dirs {
            let candidate = dir.join(name);
            if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
                return Ok(candidate);
            }
        }
        Err(TemplateError::NotFound {
            name: name.to_string(),
            searched: self.dirs.clone(),
        })
    }

    /// Load `name` with every include inlined, recording each file read.
    fn expand<'a>(
        &'a self,
        name: &'a str,
        depth: usize,
        deps: &'a mut Vec<PathBuf>,
    ) -> Expansion<'a> {
        Box::pin(async move {
            if depth > MAX_INCLUDE_DEPTH {
                return Err(TemplateError::IncludeDepth {
                    name: name.to_string(),
                    max: MAX_INCLUDE_DEPTH,
                });
            }
            let path = self.locate(name).await?;
            let source = tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| TemplateError::Io {
                    path: path.clone(),
                    source,
                })?;
            if !deps.contains(&path) {
                deps.push(path);
            }

            let includes: Vec<(usize, usize, String)> = INCLUDE
                .captures_iter(&source)
                .filter_map(|caps| {
                    let whole = caps.get(0)?;
                    Some((whole.start(), whole.end(), caps.get(1)?.as_str().to_string()))
                })
                .collect();

            let mut out = String::with_capacity(source.len());
            let mut last = 0;
            for (start, end, include) in includes {
                out.push_str(&source[last..start]);
                out.push_str(&self.expand(&include, depth + 1, &mut *deps).await?);
                last = end;
            }
            out.push_str(&source[last..]);
            Ok(out)
        })
    }
}

#[async_trait::async_trait]
impl Renderer for TemplateRenderer {
    async fn render(&self, ctx: &PageContext) -> Result<Rendered> {
        let name = ctx.template_name().to_string();
        let mut dependencies = Vec::new();
        let template = self.expand(&name, 0, &mut dependencies).await?;

        let vars = variables(ctx);
        let mut html = String::with_capacity(template.len() + ctx.document.html.len());
        let mut last = 0;
        for caps in VARIABLE.captures_iter(&template) {
            let (Some(whole), Some(var)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            html.push_str(&template[last..whole.start()]);
            let Some((value, raw)) = vars.get(var.as_str()) else {
                return Err(TemplateError::UnknownVariable {
                    name: var.as_str().to_string(),
                    template: name,
                }
                .into());
            };
            if *raw {
                html.push_str(value);
            } else {
                html.push_str(&escape_html(value));
            }
            last = whole.end();
        }
        html.push_str(&template[last..]);

        Ok(Rendered { html, dependencies })
    }
}

/// Variable table: name → (value, inserted without escaping).
fn variables(ctx: &PageContext) -> FxHashMap<String, (String, bool)> {
    let mut vars = FxHashMap::default();
    let mut set = |name: &str, value: String, raw: bool| {
        vars.insert(name.to_string(), (value, raw));
    };

    set("title", ctx.title().to_string(), false);
    set("content", ctx.document.html.clone(), true);
    set("toc", toc_html(ctx), true);
    set("translations", translations_html(ctx), true);
    set("site_title", ctx.site_title.clone(), false);
    set("base_url", ctx.base_url.clone(), false);
    set("root", ctx.page.root_prefix(), false);
    set("locale", ctx.page.locale.clone(), false);
    set("url", ctx.page.url.clone(), false);

    for (key, value) in &ctx.document.front_matter {
        let text = match value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            _ => continue,
        };
        set(&format!("page.{key}"), text, false);
    }
    vars
}

fn toc_html(ctx: &PageContext) -> String {
    if ctx.document.toc.is_empty() {
        return String::new();
    }
    let mut out = String::from("<ul class=\"toc\">");
    for entry in &ctx.document.toc {
        let _ = write!(
            out,
            "<li class=\"toc-h{}\"><a href=\"#{}\">{}</a></li>",
            entry.level,
            escape_html(&entry.id),
            escape_html(&entry.text)
        );
    }
    out.push_str("</ul>");
    out
}

fn translations_html(ctx: &PageContext) -> String {
    if ctx.translations.len() < 2 {
        return String::new();
    }
    let mut out = String::from("<ul class=\"translations\">");
    for t in &ctx.translations {
        let current = if t.locale == ctx.page.locale {
            " aria-current=\"true\""
        } else {
            ""
        };
        let _ = write!(
            out,
            "<li><a href=\"{}\" hreflang=\"{}\"{current}>{}</a></li>",
            escape_html(&t.url),
            escape_html(&t.locale),
            escape_html(&t.locale)
        );
    }
    out.push_str("</ul>");
    out
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Translation;
    use crate::page::PageSource;
    use crate::render::ParsedDocument;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn context(front_matter: &str) -> PageContext {
        let mut document = ParsedDocument {
            html: "<p>Body & more</p>".into(),
            title: Some("Guide <1>".into()),
            ..Default::default()
        };
        if !front_matter.is_empty() {
            document.front_matter = toml::from_str(front_matter).unwrap();
        }
        PageContext {
            page: PageSource {
                source: "/site/content/guide.md".into(),
                locale: "en".into(),
                logical: "guide/intro.md".into(),
                output: "/site/public/guide/intro.html".into(),
                url: "/guide/intro.html".into(),
                depth: 1,
                fallback_from: None,
            },
            document,
            site_title: "Docs".into(),
            base_url: String::new(),
            translations: vec![
                Translation {
                    locale: "en".into(),
                    url: "/guide/intro.html".into(),
                    is_fallback: false,
                },
                Translation {
                    locale: "it".into(),
                    url: "/it/guide/intro.html".into(),
                    is_fallback: true,
                },
            ],
        }
    }

    #[tokio::test]
    async fn renders_variables_and_includes() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "page.html",
            "{% include \"layout/head.html\" %}<main>{{ content }}</main>",
        );
        write(dir.path(), "layout/head.html", "<title>{{ title }} | {{site_title}}</title><base href=\"{{ root }}\">");

        let renderer = TemplateRenderer::new(vec![dir.path().to_path_buf()]);
        let rendered = renderer.render(&context("")).await.unwrap();

        assert_eq!(
            rendered.html,
            "<title>Guide &lt;1&gt; | Docs</title><base href=\"../\"><main><p>Body & more</p></main>"
        );
        assert_eq!(
            rendered.dependencies,
            vec![dir.path().join("page.html"), dir.path().join("layout/head.html")]
        );
    }

    #[tokio::test]
    async fn site_templates_shadow_theme() {
        let site = TempDir::new().unwrap();
        let theme = TempDir::new().unwrap();
        write(theme.path(), "page.html", "theme {% include \"nav.html\" %}");
        write(theme.path(), "nav.html", "theme-nav");
        write(site.path(), "nav.html", "site-nav");

        let renderer =
            TemplateRenderer::new(vec![site.path().to_path_buf(), theme.path().to_path_buf()]);
        let rendered = renderer.render(&context("")).await.unwrap();

        assert_eq!(rendered.html, "theme site-nav");
        assert_eq!(rendered.dependencies[1], site.path().join("nav.html"));
    }

    #[tokio::test]
    async fn front_matter_selects_template() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "guide.html", "{{ page.section }}:{{ page.order }}");

        let renderer = TemplateRenderer::new(vec![dir.path().to_path_buf()]);
        let ctx = context("template = \"guide.html\"\nsection = \"intro\"\norder = 2");
        let rendered = renderer.render(&ctx).await.unwrap();
        assert_eq!(rendered.html, "intro:2");
    }

    #[tokio::test]
    async fn toc_and_translations_are_raw() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "page.html", "{{ translations }}");

        let renderer = TemplateRenderer::new(vec![dir.path().to_path_buf()]);
        let rendered = renderer.render(&context("")).await.unwrap();
        assert!(rendered.html.starts_with("<ul class=\"translations\">"));
        assert!(rendered.html.contains("hreflang=\"it\""));
        assert!(rendered.html.contains("aria-current=\"true\">en<"));
    }

    #[tokio::test]
    async fn missing_template_and_unknown_variable_fail() {
        let dir = TempDir::new().unwrap();
        let renderer = TemplateRenderer::new(vec![dir.path().to_path_buf()]);
        let err = renderer.render(&context("")).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TemplateError>(),
            Some(TemplateError::NotFound { .. })
        ));

        write(dir.path(), "page.html", "{{ nope }}");
        let err = renderer.render(&context("")).await.unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[tokio::test]
    async fn include_cycle_is_bounded() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "page.html", "{% include \"loop.html\" %}");
        write(dir.path(), "loop.html", "x{% include \"loop.html\" %}");

        let renderer = TemplateRenderer::new(vec![dir.path().to_path_buf()]);
        let err = renderer.render(&context("")).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TemplateError>(),
            Some(TemplateError::IncludeDepth { .. })
        ));
    }

    #[tokio::test]
    async fn template_names_cannot_leave_the_template_dir() {
        let dir = TempDir::new().unwrap();
        let templates = dir.path().join("templates");
        write(dir.path(), "secret.html", "secret");
        write(&templates, "page.html", "{% include \"/etc/hostname\" %}");

        let renderer = TemplateRenderer::new(vec![templates]);
        let err = renderer
            .render(&context("template = \"../secret.html\""))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TemplateError>(),
            Some(TemplateError::OutsideRoot(name)) if name == "../secret.html"
        ));

        let err = renderer.render(&context("")).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TemplateError>(),
            Some(TemplateError::OutsideRoot(name)) if name == "/etc/hostname"
        ));
    }

    #[test]
    fn escapes_html() {
        assert_eq!(escape_html("<a href='x'>&</a>"), "&lt;a href=&#39;x&#39;&gt;&amp;&lt;/a&gt;");
    }
}
