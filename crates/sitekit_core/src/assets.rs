use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

use crate::model::{BuildTask, PassthroughEntry, TaskKind};

/// One copy task per configured passthrough entry. Sources are resolved
/// against the site root; a missing source fails the build.
pub fn plan_passthrough(root: &Path, entries: &[PassthroughEntry]) -> Result<Vec<BuildTask>> {
    let mut claimed: BTreeMap<PathBuf, &Path> = BTreeMap::new();
    let mut tasks = Vec::with_capacity(entries.len());
    for entry in entries {
        let source = root.join(&entry.from);
        if !source.exists() {
            bail!(
                "passthrough source {} does not exist",
                source.display()
            );
        }
        if let Some(previous) = claimed.insert(entry.to.clone(), &entry.from) {
            bail!(
                "passthrough destination {} is claimed by both {} and {}",
                entry.to.display(),
                previous.display(),
                entry.from.display()
            );
        }
        tasks.push(BuildTask {
            kind: TaskKind::CopyPassthrough {
                from: source,
                to: entry.to.clone(),
            },
            outputs: vec![entry.to.clone()],
        });
    }
    Ok(tasks)
}
