//! Tag index over a collection

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::model::ContentItem;
use crate::slug::slugify;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagEntry {
    /// Exact tag text as authored.
    pub tag: String,
    /// Normalized form of `tag`; two tags may share it.
    pub slug: String,
    /// Routing segment, unique across the index.
    pub page_slug: String,
    /// Indices into the collection the index was built from.
    pub posts: Vec<usize>,
}

impl TagEntry {
    pub fn items<'a>(&'a self, collection: &'a [ContentItem]) -> impl Iterator<Item = &'a ContentItem> {
        self.posts.iter().filter_map(|idx| collection.get(*idx))
    }
}

/// One entry per distinct tag in first-seen order, each listing every item
/// that carries the exact tag string.
pub fn build_tag_index(collection: &[ContentItem]) -> Vec<TagEntry> {
    let mut entries: Vec<TagEntry> = Vec::new();
    let mut by_tag: HashMap<String, usize> = HashMap::new();
    for (idx, item) in collection.iter().enumerate() {
        let mut seen_on_item = HashSet::new();
        for tag in item.tags() {
            if !seen_on_item.insert(tag.clone()) {
                continue;
            }
            let entry_idx = *by_tag.entry(tag.clone()).or_insert_with(|| {
                entries.push(TagEntry {
                    slug: slugify(&tag),
                    page_slug: String::new(),
                    tag,
                    posts: Vec::new(),
                });
                entries.len() - 1
            });
            entries[entry_idx].posts.push(idx);
        }
    }
    assign_page_slugs(&mut entries);
    entries
}

/// First tag to claim a slug keeps it; later ones get `-2`, `-3`, ...
/// An empty slug routes as `tag`.
fn assign_page_slugs(entries: &mut [TagEntry]) {
    let mut taken: HashSet<String> = HashSet::new();
    for entry in entries.iter_mut() {
        let base = if entry.slug.is_empty() {
            "tag".to_string()
        } else {
            entry.slug.clone()
        };
        let mut candidate = base.clone();
        let mut n = 2;
        while taken.contains(&candidate) {
            candidate = format!("{base}-{n}");
            n += 1;
        }
        if candidate != entry.slug {
            log::warn!(
                "tag '{}' routes as '{}' because its slug '{}' is already in use",
                entry.tag,
                candidate,
                entry.slug
            );
        }
        taken.insert(candidate.clone());
        entry.page_slug = candidate;
    }
}

pub fn tag_page_url(url_prefix: &str, entry: &TagEntry) -> String {
    let prefix = url_prefix.trim_end_matches('/');
    format!("{prefix}/{}/", entry.page_slug)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_yaml::Mapping;

    fn item(url: &str, tags: &[&str]) -> ContentItem {
        let mut data = Mapping::new();
        data.insert(
            "tags".into(),
            serde_yaml::Value::Sequence(tags.iter().map(|tag| (*tag).into()).collect()),
        );
        ContentItem::new(url, format!("src{url}index.md"), data, String::new())
    }

    #[test]
    fn entries_follow_first_seen_order() {
        let items = vec![
            item("/c/", &[]),
            item("/a/", &["release", "infra"]),
            item("/b/", &["release"]),
        ];
        let index = build_tag_index(&items);
        let tags: Vec<_> = index.iter().map(|entry| entry.tag.as_str()).collect();
        assert_eq!(tags, vec!["release", "infra"]);
        assert_eq!(index[0].posts, vec![1, 2]);
        assert_eq!(index[1].posts, vec![1]);
    }

    #[test]
    fn entries_contain_exactly_the_tagged_items() {
        let items = vec![
            item("/1/", &["Rust", "rust"]),
            item("/2/", &["rust"]),
            item("/3/", &["go"]),
            item("/4/", &[]),
        ];
        let index = build_tag_index(&items);
        for entry in &index {
            let expected: Vec<usize> = items
                .iter()
                .enumerate()
                .filter(|(_, item)| item.has_tag(&entry.tag))
                .map(|(idx, _)| idx)
                .collect();
            assert_eq!(entry.posts, expected, "tag {}", entry.tag);
        }
        assert!(index.iter().all(|entry| !entry.posts.contains(&3)));
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn duplicate_tag_on_one_item_counts_once() {
        let items = vec![item("/1/", &["a", "a"])];
        let index = build_tag_index(&items);
        assert_eq!(index[0].posts, vec![0]);
    }

    #[test]
    fn colliding_slugs_get_unique_page_slugs() {
        let items = vec![item("/1/", &["Node.js", "NodeJS", "!!!"])];
        let index = build_tag_index(&items);
        assert_eq!(index[0].slug, "nodejs");
        assert_eq!(index[0].page_slug, "nodejs");
        assert_eq!(index[1].slug, "nodejs");
        assert_eq!(index[1].page_slug, "nodejs-2");
        assert_eq!(index[2].page_slug, "tag");
        assert_eq!(tag_page_url("/news/tags/", &index[1]), "/news/tags/nodejs-2/");
    }
}
