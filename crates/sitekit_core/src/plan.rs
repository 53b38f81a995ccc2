//! Deterministic build plan construction (no execution).

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Result, bail};

use crate::assets::plan_passthrough;
use crate::model::{BuildPlan, BuildTask, Project, TaskKind};
use crate::tags::tag_page_url;
use crate::url::map_url;

pub fn build_plan(project: &Project) -> Result<BuildPlan> {
    let mut tasks = Vec::new();

    for (page_index, page) in project.content.pages.iter().enumerate() {
        let Some(output) = page.output.clone() else {
            continue;
        };
        tasks.push(BuildTask {
            kind: TaskKind::RenderPage { page_index },
            outputs: vec![output],
        });
    }

    let collections = &project.config.collections;
    if collections.tags.template.is_some() {
        for (tag_index, entry) in project.content.collections.tags.iter().enumerate() {
            let url = tag_page_url(&collections.tags.url_prefix, entry);
            tasks.push(BuildTask {
                kind: TaskKind::RenderTagPage { tag_index },
                outputs: vec![map_url(&url).output],
            });
        }
    }
    if collections.jobs.template.is_some() {
        for (job_index, job) in project.content.collections.jobs.iter().enumerate() {
            tasks.push(BuildTask {
                kind: TaskKind::RenderJobPage { job_index },
                outputs: vec![map_url(&job.url).output],
            });
        }
    }

    tasks.extend(plan_passthrough(&project.root, &project.config.passthrough)?);

    if let Some(css_output) = &project.config.syntax.css_output {
        let theme = project.config.syntax.theme.clone();
        tasks.push(BuildTask {
            kind: TaskKind::WriteHighlightCss { theme },
            outputs: vec![css_output.clone()],
        });
    }

    check_unique_outputs(&tasks)?;
    Ok(BuildPlan { tasks })
}

fn check_unique_outputs(tasks: &[BuildTask]) -> Result<()> {
    let mut owners: BTreeMap<&PathBuf, &TaskKind> = BTreeMap::new();
    for task in tasks {
        for output in &task.outputs {
            if let Some(previous) = owners.insert(output, &task.kind) {
                bail!(
                    "output {} is produced twice ({:?} and {:?})",
                    output.display(),
                    previous,
                    task.kind
                );
            }
        }
    }
    Ok(())
}
