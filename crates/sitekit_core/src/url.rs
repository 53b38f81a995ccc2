use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlMapping {
    pub href: String,
    pub output: PathBuf,
}

/// Map a site url to the file that serves it. Directory-style urls write
/// `index.html`; urls whose last segment has an extension write that file.
pub fn map_url(url: &str) -> UrlMapping {
    let logical = url.trim().trim_matches('/');
    if logical.is_empty() {
        return UrlMapping {
            href: "/".to_string(),
            output: PathBuf::from("index.html"),
        };
    }
    let last = logical.rsplit('/').next().unwrap_or(logical);
    if last.contains('.') {
        UrlMapping {
            href: format!("/{logical}"),
            output: PathBuf::from(logical),
        }
    } else {
        UrlMapping {
            href: format!("/{logical}/"),
            output: PathBuf::from(format!("{logical}/index.html")),
        }
    }
}

/// Url of a content file from its path relative to the content dir:
/// `about.md` serves `/about/`, `news/index.html` serves `/news/`.
pub fn url_from_source_path(rel: &Path) -> String {
    let mut segments: Vec<String> = rel
        .parent()
        .into_iter()
        .flat_map(|parent| parent.components())
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .filter(|segment| !segment.is_empty() && segment != ".")
        .collect();
    let stem = rel
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    if stem != "index" && !stem.is_empty() {
        segments.push(stem);
    }
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", segments.join("/"))
    }
}

/// Source path relative to the content dir with `/` separators.
pub fn source_key(rel: &Path) -> String {
    rel.components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
