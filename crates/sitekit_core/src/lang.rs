//! Language switcher path mapping
//!
//! The primary language lives at the site root and the secondary language
//! under a `/<code>` prefix. Equivalent pages are declared as pairs in the
//! site config; every pair is inserted in both directions, so the table is
//! symmetric by construction. Paths without an entry fall back to adding or
//! removing the secondary prefix.

use std::collections::HashMap;

use crate::model::{LanguagePair, LanguagesConfig};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageUrlMap {
    primary: String,
    secondary: String,
    secondary_prefix: String,
    table: HashMap<String, String>,
}

impl LanguageUrlMap {
    pub fn new(languages: &LanguagesConfig, pairs: &[LanguagePair]) -> Self {
        let mut table = HashMap::with_capacity(pairs.len() * 2);
        for pair in pairs {
            let primary = normalize_path(&pair.primary);
            let secondary = normalize_path(&pair.secondary);
            if let Some(previous) = table.insert(primary.clone(), secondary.clone()) {
                if previous != secondary {
                    log::warn!("language map: '{primary}' remapped from '{previous}' to '{secondary}'");
                }
            }
            if let Some(previous) = table.insert(secondary.clone(), primary.clone()) {
                if previous != primary {
                    log::warn!("language map: '{secondary}' remapped from '{previous}' to '{primary}'");
                }
            }
        }
        Self {
            primary: languages.primary.clone(),
            secondary: languages.secondary.clone(),
            secondary_prefix: languages.secondary_prefix(),
            table,
        }
    }

    pub fn primary(&self) -> &str {
        &self.primary
    }

    pub fn secondary(&self) -> &str {
        &self.secondary
    }

    /// Path of the equivalent page in the other language. Always returns a
    /// path; unknown pages resolve through the prefix fallback.
    pub fn counterpart(&self, path: &str) -> String {
        let normalized = normalize_path(path);
        if let Some(mapped) = self.table.get(&normalized) {
            return with_trailing_slash(mapped);
        }
        self.structural_fallback(&normalized)
    }

    /// Language code of `path`.
    pub fn language_of(&self, path: &str) -> &str {
        if self.is_secondary(&normalize_path(path)) {
            &self.secondary
        } else {
            &self.primary
        }
    }

    /// Path of `path` in `target`; unchanged when it is already there.
    /// Unknown language codes behave like [`Self::counterpart`].
    pub fn switch_to(&self, path: &str, target: &str) -> String {
        if target == self.language_of(path) {
            return with_trailing_slash(&normalize_path(path));
        }
        self.counterpart(path)
    }

    /// Root path of a language (`/` or `/ru/`).
    pub fn root_of(&self, language: &str) -> String {
        if language == self.secondary {
            format!("{}/", self.secondary_prefix)
        } else {
            "/".to_string()
        }
    }

    fn is_secondary(&self, normalized: &str) -> bool {
        normalized == self.secondary_prefix
            || normalized
                .strip_prefix(&self.secondary_prefix)
                .is_some_and(|rest| rest.starts_with('/'))
    }

    fn structural_fallback(&self, normalized: &str) -> String {
        if self.is_secondary(normalized) {
            let rest = &normalized[self.secondary_prefix.len()..];
            if rest.is_empty() {
                return "/".to_string();
            }
            return with_trailing_slash(rest);
        }
        if normalized == "/" {
            return self.root_of(&self.secondary);
        }
        with_trailing_slash(&format!("{}{normalized}", self.secondary_prefix))
    }
}

/// Strip trailing slashes and drop any query or fragment; the root stays
/// `/` and a missing leading slash is added.
pub fn normalize_path(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or("").trim();
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

fn with_trailing_slash(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(primary: &str, secondary: &str) -> LanguagePair {
        LanguagePair {
            primary: primary.to_string(),
            secondary: secondary.to_string(),
        }
    }

    fn map() -> LanguageUrlMap {
        LanguageUrlMap::new(
            &LanguagesConfig::default(),
            &[
                pair("/about/", "/ru/o-nas/"),
                pair("/careers", "/ru/vakansii"),
                pair("/", "/ru/"),
            ],
        )
    }

    #[test]
    fn normalizes_paths() {
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/about/"), "/about");
        assert_eq!(normalize_path("about//"), "/about");
        assert_eq!(normalize_path("/news/?page=2#top"), "/news");
    }

    #[test]
    fn tabulated_pairs_map_both_ways() {
        let map = map();
        assert_eq!(map.counterpart("/about/"), "/ru/o-nas/");
        assert_eq!(map.counterpart("/about"), "/ru/o-nas/");
        assert_eq!(map.counterpart("/ru/o-nas/"), "/about/");
        assert_eq!(map.counterpart("/careers/"), "/ru/vakansii/");
        assert_eq!(map.counterpart("/ru/vakansii"), "/careers/");
        assert_eq!(map.counterpart("/"), "/ru/");
        assert_eq!(map.counterpart("/ru/"), "/");
    }

    #[test]
    fn tabulated_lookup_ignores_slashes_query_and_fragment() {
        let map = map();
        for path in ["/about", "/about/", "about", "/about//", "/about?x=1", "/about/#team"] {
            assert_eq!(map.counterpart(path), "/ru/o-nas/", "path {path}");
        }
    }

    #[test]
    fn tabulated_pairs_round_trip() {
        let map = map();
        for path in ["/about/", "/careers", "/", "/ru/o-nas", "/ru/vakansii/", "/ru/"] {
            let back = map.counterpart(&map.counterpart(path));
            assert_eq!(normalize_path(&back), normalize_path(path), "path {path}");
        }
    }

    #[test]
    fn unknown_paths_use_prefix_fallback() {
        let map = LanguageUrlMap::new(&LanguagesConfig::default(), &[]);
        assert_eq!(map.counterpart("/"), "/ru/");
        assert_eq!(map.counterpart("/ru"), "/");
        assert_eq!(map.counterpart("/ru/"), "/");
        assert_eq!(map.counterpart("/news/posts/x/"), "/ru/news/posts/x/");
        assert_eq!(map.counterpart("/ru/news/posts/x"), "/news/posts/x/");
        assert_eq!(map.counterpart("/russia/"), "/ru/russia/");
    }

    #[test]
    fn language_detection_and_switching() {
        let map = map();
        assert_eq!(map.language_of("/ru/"), "ru");
        assert_eq!(map.language_of("/ru"), "ru");
        assert_eq!(map.language_of("/russia/"), "en");
        assert_eq!(map.language_of("/"), "en");
        assert_eq!(map.switch_to("/about/", "en"), "/about/");
        assert_eq!(map.switch_to("/about/", "ru"), "/ru/o-nas/");
        assert_eq!(map.switch_to("/ru/o-nas/", "en"), "/about/");
        assert_eq!(map.root_of("ru"), "/ru/");
        assert_eq!(map.root_of("en"), "/");
    }
}
