//! Content tree walker for site pages

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde_yaml::Value;
use sitekit_core::front_matter::parse_optional;
use sitekit_core::model::{ContentItem, Diagnostic, Page, PageKind, SiteConfig};
use sitekit_core::render::{RenderOptions, render_markdown_with_options};
use sitekit_core::url::{map_url, source_key, url_from_source_path};
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Default)]
pub struct WalkResult {
    pub pages: Vec<Page>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Discover every page under the content dir. The jobs directory is left
/// to the record reader so jobs are not routed twice.
pub fn walk_content(root: &Path, config: &SiteConfig) -> Result<WalkResult> {
    let content_dir = root.join(&config.content_dir);
    if !content_dir.is_dir() {
        bail!("content dir {} does not exist", content_dir.display());
    }
    let jobs_dir = content_dir.join(&config.collections.jobs.dir);
    let render = RenderOptions::from_config(&config.syntax);

    let mut result = WalkResult::default();
    let mut seen_urls: HashMap<String, String> = HashMap::new();

    let walker = WalkDir::new(&content_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || (!is_private(entry) && entry.path() != jobs_dir.as_path()));
    for entry in walker.filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let Some(kind) = page_kind(path) else {
            continue;
        };
        let rel = path.strip_prefix(&content_dir).unwrap_or(path);
        let source_path = source_key(rel);
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let parsed = match parse_optional(&raw) {
            Ok(parsed) => parsed,
            Err(err) => {
                log::warn!("{source_path}: {err}");
                result
                    .diagnostics
                    .push(Diagnostic::warning(Some(source_path), err.to_string()));
                continue;
            }
        };

        let body = match kind {
            PageKind::Markdown => render_markdown_with_options(parsed.body, &render),
            PageKind::Html => parsed.body.to_string(),
        };
        let (url, output) = match parsed.data.get("permalink") {
            Some(Value::Bool(false)) => (url_from_source_path(rel), None),
            Some(Value::String(permalink)) => {
                let mapping = map_url(permalink);
                (mapping.href, Some(mapping.output))
            }
            _ => {
                let url = url_from_source_path(rel);
                let output = map_url(&url).output;
                (url, Some(output))
            }
        };

        if output.is_some() {
            if let Some(first) = seen_urls.get(&url) {
                result.diagnostics.push(Diagnostic::error(
                    Some(source_path.clone()),
                    format!("url {url} is already served by {first}"),
                ));
                continue;
            }
            seen_urls.insert(url.clone(), source_path.clone());
        }

        log::debug!("page {source_path} -> {url}");
        result.pages.push(Page {
            kind,
            item: ContentItem::new(url, source_path, parsed.data, body),
            output,
        });
    }

    Ok(result)
}

fn is_private(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('_') || name.starts_with('.'))
}

fn page_kind(path: &Path) -> Option<PageKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "md" | "markdown" => Some(PageKind::Markdown),
        "html" | "htm" => Some(PageKind::Html),
        _ => None,
    }
}

pub fn resolve_dir(root: &Path, dir: &Path) -> PathBuf {
    if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        root.join(dir)
    }
}
