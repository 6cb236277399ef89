use crate::config::{PigConfig, Project};
use anyhow::Context;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Canonical location of the generated runner script for `task_name`.
pub fn script_path(cfg: &PigConfig, project: &Project, task_name: &str) -> PathBuf {
    cfg.project_cache_dir(project)
        .join(format!("run_{}.sh", task_name))
}

/// Render the shell script that invokes the Pig interpreter on
/// `script_abs`, either against the local cache dir or, when a remote host
/// is configured, through rsync plus the configured remote-shell command.
///
/// Deterministic: identical inputs produce byte-identical text. Paths and
/// parameter values are interpolated literally, with no shell escaping;
/// values containing shell metacharacters will corrupt the script.
pub fn render(
    cfg: &PigConfig,
    project: &Project,
    script_abs: &Path,
    task_name: &str,
    parameters: &BTreeMap<String, String>,
) -> anyhow::Result<String> {
    let rel = script_abs.strip_prefix(&project.root).with_context(|| {
        format!(
            "script {:?} is outside project root {:?}",
            script_abs, project.root
        )
    })?;
    let opts = cfg.pig_options.as_deref().unwrap_or("");
    let params = serialize_parameters(parameters);
    let local_cache = cfg.project_cache_dir(project);

    let mut body = String::new();
    body.push_str("#!/bin/sh\n");
    body.push_str(&format!("echo \"Task: run_{}\"\n", task_name));
    body.push_str(&format!("echo \"Pig script: {}\"\n", rel.display()));

    match &cfg.remote_host {
        None => {
            body.push_str(&format!(
                "{} -Dpig.additional.jars={}/*.jar {} -f {} {}\n",
                cfg.pig_command,
                local_cache.display(),
                opts,
                local_cache.join(rel).display(),
                params,
            ));
        }
        Some(host) => {
            // both guaranteed by config validation
            let shell = cfg
                .remote_shell_cmd
                .as_deref()
                .context("remote shell command not configured")?;
            let remote_base = cfg
                .remote_cache_dir
                .as_deref()
                .context("remote cache dir not configured")?;
            let remote_cache = format!("{}/{}", remote_base, project.name);
            body.push_str(&format!("{} {} mkdir -p {}\n", shell, host, remote_cache));
            body.push_str(&format!(
                "rsync -avz {}/ {}:{}\n",
                local_cache.display(),
                host,
                remote_cache,
            ));
            body.push_str(&format!(
                "{} {} {} -Dpig.additional.jars={}/*.jar {} -f {}/{} {}\n",
                shell,
                host,
                cfg.pig_command,
                remote_cache,
                opts,
                remote_cache,
                rel.display(),
                params,
            ));
        }
    }
    Ok(body)
}

/// Render the script and write it to its canonical path, overwriting any
/// previous version. Returns the path written.
pub fn write(
    cfg: &PigConfig,
    project: &Project,
    script_abs: &Path,
    task_name: &str,
    parameters: &BTreeMap<String, String>,
) -> anyhow::Result<PathBuf> {
    let text = render(cfg, project, script_abs, task_name, parameters)?;
    let path = script_path(cfg, project, task_name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {:?}", parent))?;
    }
    fs::write(&path, &text).with_context(|| format!("failed to write generated script {:?}", path))?;
    Ok(path)
}

/// `-param key=value` pairs joined by single spaces, in the mapping's
/// stable iteration order.
fn serialize_parameters(parameters: &BTreeMap<String, String>) -> String {
    parameters
        .iter()
        .map(|(k, v)| format!("-param {}={}", k, v))
        .collect::<Vec<_>>()
        .join(" ")
}
