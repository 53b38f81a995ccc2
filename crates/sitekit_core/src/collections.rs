//! Named collections assembled once per build

use std::path::Path;

use crate::dates::sort_newest_first;
use crate::model::{Collections, ContentItem, Diagnostic, Page, SiteConfig};
use crate::records::{RecordSource, read_records};
use crate::related::attach_related;
use crate::render::RenderOptions;
use crate::tags::build_tag_index;

/// Build `news`, `tags` and `jobs`. `pages` come from the content walk,
/// with `source_path` relative to the content dir.
pub fn build_collections(
    root: &Path,
    config: &SiteConfig,
    pages: &[Page],
) -> (Collections, Vec<Diagnostic>) {
    let mut news = news_items(pages, &config.collections.news.dir);
    sort_newest_first(&mut news, ContentItem::date);
    attach_related(&mut news);
    let tags = build_tag_index(&news);

    let jobs_config = &config.collections.jobs;
    let jobs_dir = root.join(&config.content_dir).join(&jobs_config.dir);
    let render = RenderOptions::from_config(&config.syntax);
    let records = read_records(
        &RecordSource {
            dir: &jobs_dir,
            url_prefix: &jobs_config.url_prefix,
            extensions: &jobs_config.extensions,
        },
        &render,
    );

    log::debug!(
        "collections: {} news, {} tags, {} jobs",
        news.len(),
        tags.len(),
        records.items.len()
    );
    (
        Collections {
            news,
            tags,
            jobs: records.items,
        },
        records.diagnostics,
    )
}

/// Markdown files directly inside `dir` (`<dir>/*.md`) that have not opted
/// out of collections, in walk order.
pub fn news_items(pages: &[Page], dir: &str) -> Vec<ContentItem> {
    let prefix = format!("{}/", dir.trim_matches('/'));
    pages
        .iter()
        .filter(|page| {
            page.item
                .source_path
                .strip_prefix(&prefix)
                .is_some_and(is_news_file)
        })
        .filter(|page| !page.item.is_excluded_from_collections())
        .map(|page| page.item.clone())
        .collect()
}

fn is_news_file(name: &str) -> bool {
    !name.contains('/')
        && Path::new(name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
}

impl Collections {
    pub fn news_item(&self, url: &str) -> Option<&ContentItem> {
        self.news.iter().find(|item| item.url == url)
    }
}
