use anyhow::Context;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Registry document maintained by the external job DSL evaluator.
/// Read-only to this tool.
pub const JOBS_FILE: &str = ".pigJobs.yaml";

/// A named job declaration binding a job to a script and parameters.
///
/// A missing `script` is a valid value here; callers must check before use.
/// `parameters` is a `BTreeMap` so serialization order is stable.
#[derive(Debug, Deserialize, Clone)]
pub struct Job {
    pub name: String,
    #[serde(rename = "type", default)]
    pub job_type: String,
    #[serde(default)]
    pub script: Option<PathBuf>,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct JobsDoc {
    #[serde(default)]
    jobs: Vec<Job>,
}

/// Scan the project's job registry and return every pig-typed job keyed by
/// name. Missing file or no pig jobs yields an empty mapping, not an error.
/// Later duplicates override earlier ones.
pub fn find_jobs(project_root: &Path) -> anyhow::Result<BTreeMap<String, Job>> {
    let path = project_root.join(JOBS_FILE);
    if !path.is_file() {
        return Ok(BTreeMap::new());
    }
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {:?}", path))?;
    let doc: JobsDoc = serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse YAML {:?}", path))?;
    Ok(pig_jobs(doc.jobs))
}

fn pig_jobs(entries: Vec<Job>) -> BTreeMap<String, Job> {
    let mut jobs = BTreeMap::new();
    for job in entries {
        if job.job_type != "pig" {
            continue;
        }
        jobs.insert(job.name.clone(), job);
    }
    jobs
}
