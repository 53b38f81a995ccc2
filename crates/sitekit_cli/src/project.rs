use std::path::Path;

use anyhow::{Context, Result};
use sitekit_core::collections::build_collections;
use sitekit_core::data::{DATA_DIR, load_global_data};
use sitekit_core::lang::LanguageUrlMap;
use sitekit_core::model::{DiagnosticLevel, Project, SiteContent};
use sitekit_core::plan::build_plan;
use sitekit_core::templates::SiteTemplates;

use crate::config_loader::load_config_for_build;
use crate::exec::{ExecSummary, execute_plan};
use crate::walk::walk_content;

/// Load config, walk content, read global data and assemble collections.
/// Content problems are collected as diagnostics on the returned project.
pub fn load_project(root: &Path) -> Result<Project> {
    let config = load_config_for_build(root)?;
    let walked = walk_content(root, &config)?;
    let (collections, collection_diagnostics) = build_collections(root, &config, &walked.pages);
    let global_data = load_global_data(&root.join(&config.content_dir).join(DATA_DIR));
    let mut diagnostics = walked.diagnostics;
    diagnostics.extend(collection_diagnostics);
    diagnostics.extend(global_data.diagnostics);
    let lang_map = LanguageUrlMap::new(&config.languages, &config.language_map);
    Ok(Project {
        root: root.to_path_buf(),
        config,
        content: SiteContent {
            pages: walked.pages,
            collections,
            global_data: global_data.values,
            diagnostics,
        },
        lang_map,
    })
}

pub fn has_errors(project: &Project) -> bool {
    project
        .content
        .diagnostics
        .iter()
        .any(|diag| diag.level == DiagnosticLevel::Error)
}

pub fn build_site(project: &Project, out_dir: &Path) -> Result<ExecSummary> {
    let templates_dir = project.root.join(&project.config.templates_dir);
    let templates = SiteTemplates::load(&templates_dir)
        .with_context(|| format!("failed to load templates from {}", templates_dir.display()))?;
    let plan = build_plan(project)?;
    log::info!(
        "plan: {} tasks from {} pages, {} templates",
        plan.tasks.len(),
        project.content.pages.len(),
        templates.len()
    );
    execute_plan(project, &plan, &templates, out_dir)
}
