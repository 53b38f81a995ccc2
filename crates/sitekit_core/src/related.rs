//! Related content by tag overlap

use std::collections::HashSet;

use crate::dates::sort_newest_first;
use crate::model::ContentItem;

pub const RELATED_LIMIT: usize = 5;

/// Items sharing at least one tag with `subject`, newest first, capped at
/// [`RELATED_LIMIT`]. The subject itself (matched by url) never appears.
pub fn related_items<'a>(subject: &ContentItem, collection: &'a [ContentItem]) -> Vec<&'a ContentItem> {
    let subject_tags: HashSet<String> = subject.tags().into_iter().collect();
    if subject_tags.is_empty() {
        return Vec::new();
    }
    let mut candidates: Vec<&ContentItem> = collection
        .iter()
        .filter(|other| other.url != subject.url)
        .filter(|other| other.tags().iter().any(|tag| subject_tags.contains(tag)))
        .collect();
    sort_newest_first(&mut candidates, |item| item.date());
    candidates.truncate(RELATED_LIMIT);
    candidates
}

/// Fill `derived.related_posts` on every item of the collection.
pub fn attach_related(collection: &mut [ContentItem]) {
    let related: Vec<Vec<_>> = collection
        .iter()
        .map(|subject| {
            related_items(subject, collection)
                .into_iter()
                .map(ContentItem::related_ref)
                .collect()
        })
        .collect();
    for (item, refs) in collection.iter_mut().zip(related) {
        item.derived.related_posts = refs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_yaml::{Mapping, Value};

    fn item(url: &str, tags: &[&str], date: Option<&str>) -> ContentItem {
        let mut data = Mapping::new();
        data.insert(
            "tags".into(),
            Value::Sequence(tags.iter().map(|tag| (*tag).into()).collect()),
        );
        if let Some(date) = date {
            data.insert("date".into(), date.into());
        }
        ContentItem::new(url, format!("src{url}index.md"), data, String::new())
    }

    fn urls(items: &[&ContentItem]) -> Vec<String> {
        items.iter().map(|item| item.url.clone()).collect()
    }

    #[test]
    fn untagged_subject_has_no_related() {
        let items = vec![item("/a/", &[], None), item("/b/", &["x"], None)];
        assert!(related_items(&items[0], &items).is_empty());
    }

    #[test]
    fn shares_tag_and_excludes_subject() {
        let items = vec![
            item("/a/", &["release", "infra"], Some("2024-02-01")),
            item("/b/", &["release"], Some("2024-01-01")),
            item("/c/", &[], Some("2024-03-01")),
            item("/d/", &["other"], Some("2024-04-01")),
        ];
        assert_eq!(urls(&related_items(&items[0], &items)), vec!["/b/"]);
        assert_eq!(urls(&related_items(&items[1], &items)), vec!["/a/"]);
        assert!(related_items(&items[2], &items).is_empty());
        assert!(related_items(&items[3], &items).is_empty());
    }

    #[test]
    fn newest_first_with_undated_last_and_capped() {
        let items = vec![
            item("/s/", &["t"], Some("2024-06-01")),
            item("/undated/", &["t"], None),
            item("/1/", &["t"], Some("2024-01-01")),
            item("/2/", &["t"], Some("2024-02-01")),
            item("/3/", &["t"], Some("2024-03-01")),
            item("/4/", &["t"], Some("2024-04-01")),
            item("/5/", &["t"], Some("2024-05-01")),
        ];
        let related = related_items(&items[0], &items);
        assert_eq!(related.len(), RELATED_LIMIT);
        assert_eq!(urls(&related), vec!["/5/", "/4/", "/3/", "/2/", "/1/"]);

        let fewer = &items[..3];
        assert_eq!(urls(&related_items(&fewer[0], fewer)), vec!["/1/", "/undated/"]);
    }

    #[test]
    fn attach_related_fills_every_item() {
        let mut items = vec![
            item("/a/", &["release", "infra"], Some("2024-02-01")),
            item("/b/", &["release"], Some("2024-01-01")),
            item("/c/", &[], Some("2024-03-01")),
        ];
        attach_related(&mut items);
        let related_urls = |idx: usize| -> Vec<String> {
            items[idx]
                .derived
                .related_posts
                .iter()
                .map(|view| view.url.clone())
                .collect()
        };
        assert_eq!(related_urls(0), vec!["/b/"]);
        assert_eq!(related_urls(1), vec!["/a/"]);
        assert!(related_urls(2).is_empty());
        for entry in &items {
            assert!(entry.derived.related_posts.iter().all(|view| view.url != entry.url));
        }
    }
}
