//! Template environment and page rendering
//!
//! Site templates live under the configured templates dir and are addressed
//! by their path relative to it (`base.html`, `partials/nav.html`). Page
//! bodies are rendered as templates too, then wrapped by their layout.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use minijinja::{
    AutoEscape, Environment, Error, ErrorKind, Output, State, Value, context, escape_formatter,
};
use serde::Serialize;
use serde_yaml::Mapping;

use crate::dates::{current_year, format_readable, format_rfc3339, parse_date_str};
use crate::lang::LanguageUrlMap;
use crate::model::{ContentItem, Page, Project, RelatedRef};
use crate::nav::{NavItemView, RouteMatcher};
use crate::slug::slugify;
use crate::tags::{TagEntry, tag_page_url};

pub const DEFAULT_LAYOUT: &str = "base.html";

const TEMPLATE_EXTENSIONS: &[&str] = &["html", "xml", "txt", "jinja"];

/// Template sources read from disk, keyed by relative path.
#[derive(Debug, Clone, Default)]
pub struct SiteTemplates {
    sources: BTreeMap<String, String>,
}

impl SiteTemplates {
    pub fn load(dir: &Path) -> Result<Self> {
        let mut templates = Self::default();
        if !dir.is_dir() {
            bail!("templates dir {} does not exist", dir.display());
        }
        templates.load_dir(dir, "")?;
        log::debug!(
            "loaded {} templates from {}",
            templates.sources.len(),
            dir.display()
        );
        Ok(templates)
    }

    fn load_dir(&mut self, dir: &Path, prefix: &str) -> Result<()> {
        let entries =
            fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;
        for entry in entries {
            let entry = entry.with_context(|| format!("failed to read {}", dir.display()))?;
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            let rel = if prefix.is_empty() {
                name
            } else {
                format!("{prefix}/{name}")
            };
            if path.is_dir() {
                self.load_dir(&path, &rel)?;
                continue;
            }
            let wanted = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| TEMPLATE_EXTENSIONS.contains(&ext));
            if !wanted {
                continue;
            }
            let source = fs::read_to_string(&path)
                .with_context(|| format!("failed to read template {}", path.display()))?;
            self.sources.insert(rel, source);
        }
        Ok(())
    }

    pub fn from_sources<I, K, V>(sources: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            sources: sources
                .into_iter()
                .map(|(name, source)| (name.into(), source.into()))
                .collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Environment with the site filters registered, no templates loaded.
pub fn base_environment<'source>(lang_map: LanguageUrlMap, matcher: RouteMatcher) -> Environment<'source> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|name| {
        if name.ends_with(".html") || name.ends_with(".xml") {
            AutoEscape::Html
        } else {
            AutoEscape::None
        }
    });
    env.set_formatter(url_friendly_formatter);
    env.add_filter("slugify", |value: Value| slugify(&value_text(&value)));
    env.add_filter("is_active", move |current: Value, link: Value| {
        matcher.is_active(&value_text(&current), &value_text(&link))
    });
    let lang_map = Arc::new(lang_map);
    env.add_filter("lang_url", move |path: Value, target: Option<String>| {
        let path = value_text(&path);
        match target {
            Some(target) => lang_map.switch_to(&path, &target),
            None => lang_map.counterpart(&path),
        }
    });
    env.add_filter("readable_date", readable_date);
    env.add_filter("limit", limit);
    env.add_function("current_year", current_year);
    env
}

/// HTML escaping that leaves `/` alone so urls print as written.
fn url_friendly_formatter(out: &mut Output, state: &State, value: &Value) -> Result<(), Error> {
    let plain = value.is_safe() || value.is_undefined() || value.is_none();
    if plain || !matches!(state.auto_escape(), AutoEscape::Html) {
        return escape_formatter(out, state, value);
    }
    let text = value.to_string();
    let mut last = 0;
    for (idx, ch) in text.char_indices() {
        let entity = match ch {
            '<' => "&lt;",
            '>' => "&gt;",
            '&' => "&amp;",
            '"' => "&quot;",
            '\'' => "&#x27;",
            _ => continue,
        };
        out.write_str(&text[last..idx])
            .and_then(|()| out.write_str(entity))
            .map_err(|_| Error::from(ErrorKind::WriteFailure))?;
        last = idx + ch.len_utf8();
    }
    out.write_str(&text[last..])
        .map_err(|_| Error::from(ErrorKind::WriteFailure))
}

fn value_text(value: &Value) -> String {
    if value.is_undefined() || value.is_none() {
        String::new()
    } else if let Some(text) = value.as_str() {
        text.to_string()
    } else {
        value.to_string()
    }
}

/// `dd Mon yyyy` from a timestamp or a date string; empty when unparseable.
fn readable_date(value: Value) -> String {
    let timestamp = match value.as_str() {
        Some(text) => parse_date_str(text),
        None => i64::try_from(value.clone()).ok(),
    };
    timestamp.and_then(format_readable).unwrap_or_default()
}

fn limit(value: Value, count: usize) -> Result<Value, Error> {
    if value.is_undefined() || value.is_none() {
        return Ok(Value::from(Vec::<Value>::new()));
    }
    let iter = value.try_iter().map_err(|_| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("limit expects a sequence, got {}", value.kind()),
        )
    })?;
    Ok(Value::from(iter.take(count).collect::<Vec<_>>()))
}

#[derive(Debug, Serialize)]
struct ItemView<'a> {
    url: &'a str,
    title: Option<&'a str>,
    date: Option<i64>,
    date_iso: Option<String>,
    tags: Vec<String>,
    data: &'a Mapping,
    content: &'a str,
    related_posts: &'a [RelatedRef],
}

impl<'a> ItemView<'a> {
    fn new(item: &'a ContentItem, related_posts: &'a [RelatedRef]) -> Self {
        let date = item.date();
        Self {
            url: &item.url,
            title: item.title(),
            date,
            date_iso: date.and_then(format_rfc3339),
            tags: item.tags(),
            data: &item.data,
            content: &item.body,
            related_posts,
        }
    }
}

#[derive(Debug, Serialize)]
struct TagView<'a> {
    tag: &'a str,
    slug: &'a str,
    page_slug: &'a str,
    url: String,
    posts: Vec<ItemView<'a>>,
}

#[derive(Debug, Serialize)]
struct CollectionsView<'a> {
    news: Vec<ItemView<'a>>,
    tags: Vec<TagView<'a>>,
    jobs: Vec<ItemView<'a>>,
}

#[derive(Debug, Serialize)]
struct PageView<'a> {
    url: &'a str,
    title: Option<&'a str>,
    lang: String,
    date: Option<i64>,
    date_iso: Option<String>,
    tags: Vec<String>,
    data: &'a Mapping,
    related_posts: &'a [RelatedRef],
}

pub struct SiteRenderer<'a> {
    project: &'a Project,
    env: Environment<'a>,
    matcher: RouteMatcher,
    site: Value,
    collections: Value,
    data: Value,
}

impl<'a> SiteRenderer<'a> {
    pub fn new(project: &'a Project, templates: &'a SiteTemplates) -> Result<Self> {
        let config = &project.config;
        let matcher = RouteMatcher::from_config(&config.languages, &config.nav);
        let mut env = base_environment(project.lang_map.clone(), matcher.clone());
        for (name, source) in &templates.sources {
            env.add_template(name.as_str(), source.as_str())
                .with_context(|| format!("failed to parse template {name}"))?;
        }
        for name in [
            config.collections.tags.template.as_deref(),
            config.collections.jobs.template.as_deref(),
        ]
        .into_iter()
        .flatten()
        {
            if !templates.contains(name) {
                bail!("collection template {name} not found");
            }
        }
        Ok(Self {
            project,
            env,
            matcher,
            site: Value::from_serialize(&config.site),
            collections: Value::from_serialize(collections_view(project)),
            data: Value::from_serialize(&project.content.global_data),
        })
    }

    pub fn render_page(&self, page: &Page) -> Result<String> {
        let item = &page.item;
        let related = self
            .project
            .content
            .collections
            .news_item(&item.url)
            .map(|news| news.derived.related_posts.as_slice())
            .unwrap_or(&[]);
        let date = item.date();
        let page_view = PageView {
            url: &item.url,
            title: item.title(),
            lang: self.page_lang(item),
            date,
            date_iso: date.and_then(format_rfc3339),
            tags: item.tags(),
            data: &item.data,
            related_posts: related,
        };
        let page_value = Value::from_serialize(&page_view);
        let body_ctx = self.context(
            &item.url,
            page_value.clone(),
            Value::UNDEFINED,
            Value::UNDEFINED,
        );
        let body = self
            .env
            .render_str(&item.body, body_ctx)
            .with_context(|| format!("failed to render body of {}", item.source_path))?;
        match layout_of(item) {
            None => Ok(body),
            Some(layout) => {
                let ctx = self.context(
                    &item.url,
                    page_value,
                    Value::from_safe_string(body),
                    Value::UNDEFINED,
                );
                self.render_template(&layout, ctx)
                    .with_context(|| format!("failed to render {}", item.source_path))
            }
        }
    }

    pub fn render_tag_page(&self, tag_index: usize) -> Result<String> {
        let config = &self.project.config.collections.tags;
        let template = config
            .template
            .as_deref()
            .context("tag pages are not configured")?;
        let collections = &self.project.content.collections;
        let entry = collections
            .tags
            .get(tag_index)
            .with_context(|| format!("tag index {tag_index} out of range"))?;
        let view = tag_view(entry, &collections.news, &config.url_prefix);
        let page_view = context! {
            url => view.url.clone(),
            title => entry.tag.clone(),
            lang => self.project.lang_map.primary(),
        };
        let ctx = self.context(&view.url, page_view, Value::UNDEFINED, Value::from_serialize(&view));
        self.render_template(template, ctx)
            .with_context(|| format!("failed to render tag page for '{}'", entry.tag))
    }

    pub fn render_job_page(&self, job_index: usize) -> Result<String> {
        let template = self
            .project
            .config
            .collections
            .jobs
            .template
            .as_deref()
            .context("job pages are not configured")?;
        let job = self
            .project
            .content
            .collections
            .jobs
            .get(job_index)
            .with_context(|| format!("job index {job_index} out of range"))?;
        let page_view = PageView {
            url: &job.url,
            title: job.title(),
            lang: self.page_lang(job),
            date: job.date(),
            date_iso: job.date().and_then(format_rfc3339),
            tags: job.tags(),
            data: &job.data,
            related_posts: &[],
        };
        let ctx = self.context(
            &job.url,
            Value::from_serialize(&page_view),
            Value::from_safe_string(job.body.clone()),
            Value::UNDEFINED,
        );
        self.render_template(template, ctx)
            .with_context(|| format!("failed to render job page {}", job.source_path))
    }

    fn render_template(&self, name: &str, ctx: Value) -> Result<String> {
        let template = self
            .env
            .get_template(name)
            .with_context(|| format!("template {name} not found"))?;
        Ok(template.render(ctx)?)
    }

    fn context(&self, url: &str, page: Value, content: Value, tag: Value) -> Value {
        let nav: Vec<NavItemView> = self.matcher.nav_views(&self.project.config.nav.items, url);
        context! {
            site => self.site.clone(),
            page => page,
            content => content,
            tag => tag,
            collections => self.collections.clone(),
            data => self.data.clone(),
            nav => nav,
            alternate_url => self.project.lang_map.counterpart(url),
        }
    }

    fn page_lang(&self, item: &ContentItem) -> String {
        item.str_field("lang")
            .map(str::to_string)
            .unwrap_or_else(|| self.project.lang_map.language_of(&item.url).to_string())
    }
}

/// Layout named by the page, `None` for `layout: false`.
fn layout_of(item: &ContentItem) -> Option<String> {
    match item.field("layout") {
        Some(serde_yaml::Value::Bool(false)) => None,
        Some(serde_yaml::Value::String(name)) if !name.trim().is_empty() => Some(name.clone()),
        _ => Some(DEFAULT_LAYOUT.to_string()),
    }
}

fn collections_view(project: &Project) -> CollectionsView<'_> {
    let collections = &project.content.collections;
    let prefix = &project.config.collections.tags.url_prefix;
    CollectionsView {
        news: collections
            .news
            .iter()
            .map(|item| ItemView::new(item, &item.derived.related_posts))
            .collect(),
        tags: collections
            .tags
            .iter()
            .map(|entry| tag_view(entry, &collections.news, prefix))
            .collect(),
        jobs: collections
            .jobs
            .iter()
            .map(|item| ItemView::new(item, &[]))
            .collect(),
    }
}

fn tag_view<'a>(entry: &'a TagEntry, news: &'a [ContentItem], prefix: &str) -> TagView<'a> {
    TagView {
        tag: &entry.tag,
        slug: &entry.slug,
        page_slug: &entry.page_slug,
        url: tag_page_url(prefix, entry),
        posts: entry
            .items(news)
            .map(|item| ItemView::new(item, &item.derived.related_posts))
            .collect(),
    }
}
