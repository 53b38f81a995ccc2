use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::model::{
    CollectionsConfig, JobsCollectionConfig, LanguagePair, LanguagesConfig, NavConfig, NavItem,
    NewsCollectionConfig, PassthroughEntry, PostprocessConfig, PostprocessMode, SiteConfig,
    SiteMeta, SyntaxConfig, TagPagesConfig,
};

#[derive(Debug, Deserialize)]
struct SiteConfigRaw {
    site: SiteMetaRaw,
    content_dir: Option<String>,
    templates_dir: Option<String>,
    languages: Option<LanguagesConfigRaw>,
    collections: Option<CollectionsConfigRaw>,
    nav: Option<NavConfigRaw>,
    #[serde(default)]
    language_map: Vec<LanguagePairRaw>,
    #[serde(default)]
    passthrough: Vec<PassthroughRaw>,
    postprocess: Option<PostprocessConfigRaw>,
    syntax: Option<SyntaxConfigRaw>,
}

#[derive(Debug, Deserialize)]
struct SiteMetaRaw {
    title: Option<String>,
    base_url: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LanguagesConfigRaw {
    primary: Option<String>,
    secondary: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CollectionsConfigRaw {
    news: Option<NewsCollectionRaw>,
    jobs: Option<JobsCollectionRaw>,
    tags: Option<TagPagesRaw>,
}

#[derive(Debug, Deserialize)]
struct NewsCollectionRaw {
    dir: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JobsCollectionRaw {
    dir: Option<String>,
    url_prefix: Option<String>,
    extensions: Option<Vec<String>>,
    template: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TagPagesRaw {
    url_prefix: Option<String>,
    template: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NavConfigRaw {
    news_section: Option<String>,
    #[serde(default)]
    items: Vec<NavItemRaw>,
}

#[derive(Debug, Deserialize)]
struct NavItemRaw {
    label: Option<String>,
    href: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LanguagePairRaw {
    Pair(String, String),
    Named {
        primary: Option<String>,
        secondary: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PassthroughRaw {
    Path(String),
    Entry { from: Option<String>, to: Option<String> },
}

#[derive(Debug, Deserialize)]
struct PostprocessConfigRaw {
    mode: Option<PostprocessMode>,
}

#[derive(Debug, Deserialize)]
struct SyntaxConfigRaw {
    highlight: Option<bool>,
    theme: Option<String>,
    css_output: Option<String>,
}

pub fn load_site_config(path: &Path) -> Result<SiteConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let parsed: SiteConfigRaw = serde_yaml::from_str(&raw)
        .with_context(|| format!("failed to parse YAML config {}", path.display()))?;

    let site = SiteMeta {
        title: required_string(parsed.site.title, "site.title")?,
        base_url: required_string(parsed.site.base_url, "site.base_url")?,
        description: parsed.site.description,
    };

    let languages = match parsed.languages {
        None => LanguagesConfig::default(),
        Some(raw) => {
            let defaults = LanguagesConfig::default();
            let languages = LanguagesConfig {
                primary: language_code(raw.primary, &defaults.primary, "languages.primary")?,
                secondary: language_code(
                    raw.secondary,
                    &defaults.secondary,
                    "languages.secondary",
                )?,
            };
            if languages.primary == languages.secondary {
                bail!("languages.primary and languages.secondary must differ");
            }
            languages
        }
    };

    let collections_raw = parsed.collections;
    let news_raw = collections_raw.as_ref().and_then(|c| c.news.as_ref());
    let jobs_raw = collections_raw.as_ref().and_then(|c| c.jobs.as_ref());
    let tags_raw = collections_raw.as_ref().and_then(|c| c.tags.as_ref());
    let collections = CollectionsConfig {
        news: NewsCollectionConfig {
            dir: relative_dir(
                news_raw.and_then(|news| news.dir.clone()),
                "news/posts",
                "collections.news.dir",
            )?,
        },
        jobs: JobsCollectionConfig {
            dir: relative_dir(
                jobs_raw.and_then(|jobs| jobs.dir.clone()),
                "careers/jobs",
                "collections.jobs.dir",
            )?,
            url_prefix: url_prefix(
                jobs_raw.and_then(|jobs| jobs.url_prefix.clone()),
                "/careers/jobs",
                "collections.jobs.url_prefix",
            )?,
            extensions: parse_extensions(jobs_raw.and_then(|jobs| jobs.extensions.clone()))?,
            template: jobs_raw.and_then(|jobs| jobs.template.clone()),
        },
        tags: TagPagesConfig {
            url_prefix: url_prefix(
                tags_raw.and_then(|tags| tags.url_prefix.clone()),
                "/tags",
                "collections.tags.url_prefix",
            )?,
            template: tags_raw.and_then(|tags| tags.template.clone()),
        },
    };

    let nav = match parsed.nav {
        None => NavConfig {
            news_section: "news".to_string(),
            items: Vec::new(),
        },
        Some(nav_raw) => NavConfig {
            news_section: non_empty_or_default(nav_raw.news_section, "news", "nav.news_section")?
                .trim_matches('/')
                .to_string(),
            items: parse_nav_items(nav_raw.items)?,
        },
    };

    let language_map = parsed
        .language_map
        .into_iter()
        .enumerate()
        .map(|(idx, pair)| parse_language_pair(pair, idx))
        .collect::<Result<Vec<_>>>()?;

    let passthrough = parsed
        .passthrough
        .into_iter()
        .enumerate()
        .map(|(idx, entry)| parse_passthrough(entry, idx))
        .collect::<Result<Vec<_>>>()?;

    let syntax = match parsed.syntax {
        None => SyntaxConfig::default(),
        Some(raw) => {
            let defaults = SyntaxConfig::default();
            SyntaxConfig {
                highlight: raw.highlight.unwrap_or(defaults.highlight),
                theme: non_empty_or_default(raw.theme, &defaults.theme, "syntax.theme")?,
                css_output: raw
                    .css_output
                    .map(|path| relative_path(&path, "syntax.css_output"))
                    .transpose()?,
            }
        }
    };

    Ok(SiteConfig {
        site,
        content_dir: PathBuf::from(non_empty_or_default(
            parsed.content_dir,
            "src",
            "content_dir",
        )?),
        templates_dir: PathBuf::from(non_empty_or_default(
            parsed.templates_dir,
            "templates",
            "templates_dir",
        )?),
        languages,
        collections,
        nav,
        language_map,
        passthrough,
        postprocess: PostprocessConfig {
            mode: parsed
                .postprocess
                .and_then(|postprocess| postprocess.mode)
                .unwrap_or_default(),
        },
        syntax,
    })
}

fn required_string(value: Option<String>, field: &str) -> Result<String> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => bail!("missing required field: {}", field),
    }
}

fn non_empty_or_default(value: Option<String>, default: &str, field: &str) -> Result<String> {
    match value {
        Some(text) => {
            if text.trim().is_empty() {
                bail!("{field} must not be empty");
            }
            Ok(text)
        }
        None => Ok(default.to_string()),
    }
}

fn language_code(value: Option<String>, default: &str, field: &str) -> Result<String> {
    let code = non_empty_or_default(value, default, field)?;
    if code.contains('/') || code.chars().any(char::is_whitespace) {
        bail!("{field} must be a bare language code, got '{code}'");
    }
    Ok(code)
}

fn relative_dir(value: Option<String>, default: &str, field: &str) -> Result<String> {
    let dir = non_empty_or_default(value, default, field)?;
    relative_path(&dir, field)?;
    Ok(dir.trim_matches('/').to_string())
}

fn url_prefix(value: Option<String>, default: &str, field: &str) -> Result<String> {
    let prefix = non_empty_or_default(value, default, field)?;
    if !prefix.starts_with('/') {
        bail!("{field} must start with '/', got '{prefix}'");
    }
    Ok(prefix)
}

fn parse_extensions(value: Option<Vec<String>>) -> Result<Vec<String>> {
    let Some(extensions) = value else {
        return Ok(vec!["md".to_string()]);
    };
    if extensions.is_empty() {
        bail!("collections.jobs.extensions must not be empty");
    }
    Ok(extensions
        .into_iter()
        .map(|ext| ext.trim_start_matches('.').to_string())
        .collect())
}

fn parse_nav_items(items: Vec<NavItemRaw>) -> Result<Vec<NavItem>> {
    let mut out = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        let label = required_string(item.label, &format!("nav.items[{idx}].label"))?;
        let href = required_string(item.href, &format!("nav.items[{idx}].href"))?;
        out.push(NavItem { label, href });
    }
    Ok(out)
}

fn parse_language_pair(raw: LanguagePairRaw, idx: usize) -> Result<LanguagePair> {
    let (primary, secondary) = match raw {
        LanguagePairRaw::Pair(primary, secondary) => (primary, secondary),
        LanguagePairRaw::Named { primary, secondary } => (
            required_string(primary, &format!("language_map[{idx}].primary"))?,
            required_string(secondary, &format!("language_map[{idx}].secondary"))?,
        ),
    };
    for path in [&primary, &secondary] {
        if !path.starts_with('/') {
            bail!("language_map[{idx}] paths must start with '/', got '{path}'");
        }
    }
    Ok(LanguagePair { primary, secondary })
}

fn parse_passthrough(raw: PassthroughRaw, idx: usize) -> Result<PassthroughEntry> {
    let field = format!("passthrough[{idx}].from");
    let (from, to) = match raw {
        PassthroughRaw::Path(from) => (Some(from), None),
        PassthroughRaw::Entry { from, to } => (from, to),
    };
    let from = relative_path(&required_string(from, &field)?, &field)?;
    let to = match to {
        Some(to) => relative_path(&to, &format!("passthrough[{idx}].to"))?,
        None => from.clone(),
    };
    Ok(PassthroughEntry { from, to })
}

/// Site-relative path without `..` segments; a leading `/` is dropped.
fn relative_path(value: &str, field: &str) -> Result<PathBuf> {
    let trimmed = value.trim().trim_start_matches('/');
    if trimmed.is_empty() {
        bail!("{field} must not be empty");
    }
    let path = PathBuf::from(trimmed);
    if path
        .components()
        .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir))
    {
        bail!("{field} must stay inside the site, got '{value}'");
    }
    Ok(path)
}
