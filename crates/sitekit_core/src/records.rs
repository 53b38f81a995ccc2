//! Front-matter records read straight from a directory
//!
//! Used for collections whose sources are kept out of normal page routing
//! (job listings). Every failure here degrades to skipping the file or the
//! whole directory; none of it fails the build.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::dates::sort_newest_first;
use crate::front_matter::{FrontMatterError, parse_required};
use crate::model::{ContentItem, Diagnostic};
use crate::render::{RenderOptions, render_markdown_with_options};

#[derive(Debug, Clone)]
pub struct RecordSource<'a> {
    pub dir: &'a Path,
    pub url_prefix: &'a str,
    pub extensions: &'a [String],
}

#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    pub items: Vec<ContentItem>,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn read_records(source: &RecordSource<'_>, render: &RenderOptions<'_>) -> RecordSet {
    let mut set = RecordSet::default();
    let entries = match fs::read_dir(source.dir) {
        Ok(entries) => entries,
        Err(err) => {
            let message = format!("cannot read record directory: {err}");
            log::warn!("{}: {message}", source.dir.display());
            set.diagnostics.push(Diagnostic::warning(
                Some(source.dir.display().to_string()),
                message,
            ));
            return set;
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_extension(path, source.extensions))
        .collect();
    paths.sort();

    // Stems decide urls, so `a.md` and `a.markdown` collide. First path wins.
    let mut claimed: HashMap<String, String> = HashMap::new();
    for path in paths {
        match read_record(&path, source, render) {
            Ok(item) => {
                if let Some(first) = claimed.get(&item.url) {
                    let message = format!("skipped: url {} is already used by {first}", item.url);
                    log::warn!("{}: {message}", path.display());
                    set.diagnostics.push(Diagnostic::warning(
                        Some(path.display().to_string()),
                        message,
                    ));
                    continue;
                }
                claimed.insert(item.url.clone(), item.source_path.clone());
                set.items.push(item);
            }
            Err(message) => {
                log::warn!("{}: {message}", path.display());
                set.diagnostics.push(Diagnostic::warning(
                    Some(path.display().to_string()),
                    message,
                ));
            }
        }
    }

    sort_newest_first(&mut set.items, ContentItem::date);
    set
}

fn read_record(
    path: &Path,
    source: &RecordSource<'_>,
    render: &RenderOptions<'_>,
) -> Result<ContentItem, String> {
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| "record file name is not valid UTF-8".to_string())?;
    let raw = fs::read_to_string(path).map_err(|err| format!("failed to read record: {err}"))?;
    let parsed = parse_required(&raw).map_err(|err| match err {
        FrontMatterError::Missing => "skipped: no front matter block".to_string(),
        other => format!("skipped: {other}"),
    })?;
    let body = if is_markdown(path) {
        render_markdown_with_options(parsed.body, render)
    } else {
        parsed.body.to_string()
    };
    Ok(ContentItem::new(
        record_url(source.url_prefix, stem),
        path.display().to_string(),
        parsed.data,
        body,
    ))
}

pub fn record_url(url_prefix: &str, id: &str) -> String {
    let prefix = url_prefix.trim_matches('/');
    if prefix.is_empty() {
        format!("/{id}/")
    } else {
        format!("/{prefix}/{id}/")
    }
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)))
}

fn is_markdown(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("md") | Some("markdown")
    )
}
