//! Core content and site models

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::dates::parse_date_value;
use crate::lang::LanguageUrlMap;
use crate::tags::TagEntry;

/// One record of a collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentItem {
    pub url: String,
    pub source_path: String,
    pub data: Mapping,
    pub body: String,
    pub derived: DerivedFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DerivedFields {
    pub related_posts: Vec<RelatedRef>,
}

/// Read-only view of another item in the same collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelatedRef {
    pub url: String,
    pub title: Option<String>,
    pub date: Option<i64>,
    pub tags: Vec<String>,
}

impl ContentItem {
    pub fn new(
        url: impl Into<String>,
        source_path: impl Into<String>,
        data: Mapping,
        body: String,
    ) -> Self {
        Self {
            url: url.into(),
            source_path: source_path.into(),
            data,
            body,
            derived: DerivedFields::default(),
        }
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.field(key).and_then(Value::as_str)
    }

    pub fn title(&self) -> Option<&str> {
        self.str_field("title")
    }

    /// Tags in authored order. A scalar `tags: x` counts as one tag; empty
    /// values are dropped.
    pub fn tags(&self) -> Vec<String> {
        let Some(value) = self.field("tags") else {
            return Vec::new();
        };
        match value {
            Value::Sequence(items) => items.iter().filter_map(tag_text).collect(),
            other => tag_text(other).into_iter().collect(),
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags().iter().any(|value| value == tag)
    }

    /// Seconds since the epoch, `None` when missing or unparseable.
    pub fn date(&self) -> Option<i64> {
        self.field("date").and_then(parse_date_value)
    }

    pub fn is_excluded_from_collections(&self) -> bool {
        self.field("exclude_from_collections")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn related_ref(&self) -> RelatedRef {
        RelatedRef {
            url: self.url.clone(),
            title: self.title().map(str::to_string),
            date: self.date(),
            tags: self.tags(),
        }
    }
}

fn tag_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(true) => "true".to_string(),
        _ => return None,
    };
    if text.is_empty() { None } else { Some(text) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    Markdown,
    Html,
}

/// A source file from the content tree that may produce an output file.
#[derive(Debug, Clone)]
pub struct Page {
    pub kind: PageKind,
    pub item: ContentItem,
    /// Output path relative to the output root; `None` when routing is
    /// suppressed with `permalink: false`.
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Collections {
    pub news: Vec<ContentItem>,
    pub tags: Vec<TagEntry>,
    pub jobs: Vec<ContentItem>,
}

#[derive(Debug, Clone, Default)]
pub struct SiteContent {
    pub pages: Vec<Page>,
    pub collections: Collections,
    /// Site-wide values from `_data/*.yaml`, keyed by file stem.
    pub global_data: Mapping,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub config: SiteConfig,
    pub content: SiteContent,
    pub lang_map: LanguageUrlMap,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub source_path: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(source_path: Option<String>, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Warning,
            source_path,
            message: message.into(),
        }
    }

    pub fn error(source_path: Option<String>, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            source_path,
            message: message.into(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self.level {
            DiagnosticLevel::Warning => "warning",
            DiagnosticLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskKind {
    RenderPage { page_index: usize },
    RenderTagPage { tag_index: usize },
    RenderJobPage { job_index: usize },
    CopyPassthrough { from: PathBuf, to: PathBuf },
    WriteHighlightCss { theme: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTask {
    pub kind: TaskKind,
    pub outputs: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct BuildPlan {
    pub tasks: Vec<BuildTask>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    pub site: SiteMeta,
    pub content_dir: PathBuf,
    pub templates_dir: PathBuf,
    pub languages: LanguagesConfig,
    pub collections: CollectionsConfig,
    pub nav: NavConfig,
    pub language_map: Vec<LanguagePair>,
    pub passthrough: Vec<PassthroughEntry>,
    pub postprocess: PostprocessConfig,
    pub syntax: SyntaxConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteMeta {
    pub title: String,
    pub base_url: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguagesConfig {
    pub primary: String,
    pub secondary: String,
}

impl LanguagesConfig {
    /// `/ru` for a secondary language `ru`.
    pub fn secondary_prefix(&self) -> String {
        format!("/{}", self.secondary)
    }
}

impl Default for LanguagesConfig {
    fn default() -> Self {
        Self {
            primary: "en".to_string(),
            secondary: "ru".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionsConfig {
    pub news: NewsCollectionConfig,
    pub jobs: JobsCollectionConfig,
    pub tags: TagPagesConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsCollectionConfig {
    /// Relative to the content dir.
    pub dir: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobsCollectionConfig {
    /// Relative to the content dir.
    pub dir: String,
    pub url_prefix: String,
    pub extensions: Vec<String>,
    pub template: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPagesConfig {
    pub url_prefix: String,
    pub template: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavConfig {
    pub news_section: String,
    pub items: Vec<NavItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavItem {
    pub label: String,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePair {
    pub primary: String,
    pub secondary: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassthroughEntry {
    /// Relative to the site root.
    pub from: PathBuf,
    /// Relative to the output root.
    pub to: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostprocessMode {
    #[default]
    Minify,
    Tidy,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PostprocessConfig {
    pub mode: PostprocessMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxConfig {
    pub highlight: bool,
    pub theme: String,
    /// Output-relative path for the highlight stylesheet, if any.
    pub css_output: Option<PathBuf>,
}

impl Default for SyntaxConfig {
    fn default() -> Self {
        Self {
            highlight: true,
            theme: "GitHub".to_string(),
            css_output: None,
        }
    }
}
