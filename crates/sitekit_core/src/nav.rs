//! Navigation highlighting

use serde::Serialize;

use crate::lang::normalize_path;
use crate::model::{LanguagesConfig, NavConfig, NavItem};

/// Decides whether a navigation link renders as active for the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatcher {
    secondary_root: String,
    primary_news: String,
    secondary_news: String,
}

impl RouteMatcher {
    pub fn new(languages: &LanguagesConfig, news_section: &str) -> Self {
        let secondary_root = languages.secondary_prefix();
        let section = news_section.trim_matches('/');
        Self {
            primary_news: format!("/{section}"),
            secondary_news: format!("{secondary_root}/{section}"),
            secondary_root,
        }
    }

    pub fn from_config(languages: &LanguagesConfig, nav: &NavConfig) -> Self {
        Self::new(languages, &nav.news_section)
    }

    pub fn is_active(&self, current: &str, link: &str) -> bool {
        if current.trim().is_empty() || link.trim().is_empty() {
            return false;
        }
        let current = normalize_path(current);
        let link = normalize_path(link);
        if current == link {
            return true;
        }
        if link == "/" || link == self.secondary_root {
            return false;
        }
        if link == self.secondary_news && is_within(&current, &self.primary_news) {
            return true;
        }
        is_within(&current, &link)
    }

    pub fn nav_views(&self, items: &[NavItem], current: &str) -> Vec<NavItemView> {
        items
            .iter()
            .map(|item| NavItemView {
                label: item.label.clone(),
                href: item.href.clone(),
                is_active: self.is_active(current, &item.href),
            })
            .collect()
    }
}

impl Default for RouteMatcher {
    fn default() -> Self {
        Self::new(&LanguagesConfig::default(), "news")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItemView {
    pub label: String,
    pub href: String,
    pub is_active: bool,
}

fn is_within(path: &str, section: &str) -> bool {
    path == section
        || path
            .strip_prefix(section)
            .is_some_and(|rest| rest.starts_with('/'))
}
