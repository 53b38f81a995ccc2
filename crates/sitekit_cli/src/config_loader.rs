use std::path::Path;

use anyhow::{Context, Result, bail};
use sitekit_core::config::load_site_config;
use sitekit_core::model::SiteConfig;

pub const CONFIG_FILE: &str = "site.yaml";

pub fn load_config_for_build(root: &Path) -> Result<SiteConfig> {
    let config_path = root.join(CONFIG_FILE);
    if !config_path.exists() {
        bail!(
            "Missing {CONFIG_FILE} in {}. Pass --source-dir to point at the site root.",
            root.display()
        );
    }
    load_site_config(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))
}
