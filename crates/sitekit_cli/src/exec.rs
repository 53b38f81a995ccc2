use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use sitekit_core::model::{BuildPlan, BuildTask, PostprocessMode, Project, TaskKind};
use sitekit_core::postprocess::postprocess;
use sitekit_core::syntax_highlight::highlight_css;
use sitekit_core::templates::{SiteRenderer, SiteTemplates};
use walkdir::WalkDir;

#[derive(Debug, Default)]
pub struct ExecSummary {
    pub executed: usize,
    pub written: usize,
    pub copied: usize,
}

pub fn execute_plan(
    project: &Project,
    plan: &BuildPlan,
    templates: &SiteTemplates,
    out_dir: &Path,
) -> Result<ExecSummary> {
    let mut report = ExecSummary::default();
    let renderer = SiteRenderer::new(project, templates)?;
    let mode = project.config.postprocess.mode;

    for task in &plan.tasks {
        match &task.kind {
            TaskKind::CopyPassthrough { from, to } => {
                report.copied += copy_passthrough(from, &out_dir.join(to))?;
            }
            TaskKind::WriteHighlightCss { theme } => {
                let css = highlight_css(theme)
                    .ok_or_else(|| anyhow!("unknown syntax theme {theme}"))?;
                for output in &task.outputs {
                    write_file(&out_dir.join(output), &css)?;
                    report.written += 1;
                }
            }
            _ => {
                let html = render_task(&renderer, project, task)?;
                for output in &task.outputs {
                    write_rendered(out_dir, output, &html, mode)?;
                    report.written += 1;
                }
            }
        }
        report.executed += 1;
    }
    log::info!(
        "executed {} tasks: {} files written, {} copied",
        report.executed,
        report.written,
        report.copied
    );
    Ok(report)
}

fn render_task(renderer: &SiteRenderer<'_>, project: &Project, task: &BuildTask) -> Result<String> {
    match &task.kind {
        TaskKind::RenderPage { page_index } => {
            let page = project
                .content
                .pages
                .get(*page_index)
                .ok_or_else(|| anyhow!("unknown page index {page_index}"))?;
            renderer
                .render_page(page)
                .with_context(|| format!("failed to render {}", page.item.source_path))
        }
        TaskKind::RenderTagPage { tag_index } => renderer
            .render_tag_page(*tag_index)
            .with_context(|| format!("failed to render tag page {tag_index}")),
        TaskKind::RenderJobPage { job_index } => renderer
            .render_job_page(*job_index)
            .with_context(|| format!("failed to render job page {job_index}")),
        TaskKind::CopyPassthrough { .. } | TaskKind::WriteHighlightCss { .. } => Ok(String::new()),
    }
}

fn write_rendered(out_dir: &Path, rel: &Path, html: &str, mode: PostprocessMode) -> Result<()> {
    let processed = postprocess(html, rel, mode);
    write_file(&out_dir.join(rel), &processed)
}

fn write_file(out_path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(out_path, contents)
        .with_context(|| format!("failed to write {}", out_path.display()))
}

/// Copy a file, or a directory tree, verbatim. Returns the number of files
/// copied.
pub fn copy_passthrough(from: &Path, to: &Path) -> Result<usize> {
    if !from.is_dir() {
        copy_file(from, to)?;
        return Ok(1);
    }
    let mut copied = 0;
    for entry in WalkDir::new(from).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to walk {}", from.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(from).unwrap_or(entry.path());
        copy_file(entry.path(), &to.join(rel))?;
        copied += 1;
    }
    Ok(copied)
}

fn copy_file(src_path: &Path, out_path: &Path) -> Result<()> {
    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::copy(src_path, out_path).with_context(|| {
        format!(
            "failed to copy {} to {}",
            src_path.display(),
            out_path.display()
        )
    })?;
    Ok(())
}
