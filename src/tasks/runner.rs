use crate::backends::{Backend, ShellBackend};
use crate::cache;
use crate::config::{PigConfig, Project};
use crate::jobs;
use crate::script;
use crate::tasks::registry::{TaskKind, TaskRegistry, TaskSpec};
use crate::util::{create_run_dir, sanitize_filename, timestamp, write_artifact};
use anyhow::Context;
use chrono::Utc;
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{info, warn};

/// Everything a task needs at execution time. Built once per invocation and
/// passed by reference; there is no ambient global state.
pub struct RunContext {
    pub config: PigConfig,
    pub project: Project,
    /// Job name supplied on the command line, consumed by `runPigJob`.
    pub job_name: Option<String>,
}

/// Run `name` and its dependency closure, dependencies first, one task at a
/// time. Any task failure aborts the run.
pub async fn run_task(registry: &TaskRegistry, name: &str, ctx: &RunContext) -> anyhow::Result<()> {
    let order = execution_order(registry, name)?;
    let backend = ShellBackend::new();
    for task_name in order {
        let spec = registry
            .get(&task_name)
            .with_context(|| format!("task '{}' disappeared from registry", task_name))?;
        info!("Running task: {}", task_name);
        execute(spec, ctx, &backend)
            .await
            .with_context(|| format!("task '{}' failed", task_name))?;
    }
    Ok(())
}

/// Dependency closure of `target`, topologically ordered. Unknown task
/// names and dependency cycles are errors.
fn execution_order(registry: &TaskRegistry, target: &str) -> anyhow::Result<Vec<String>> {
    // 0=unvisited (absent), 1=visiting, 2=done
    let mut visited: HashMap<String, i32> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    fn dfs(
        node: &str,
        registry: &TaskRegistry,
        visited: &mut HashMap<String, i32>,
        order: &mut Vec<String>,
    ) -> anyhow::Result<()> {
        match visited.get(node) {
            Some(1) => anyhow::bail!("dependency cycle detected at task '{}'", node),
            Some(_) => return Ok(()),
            None => {}
        }
        let spec = registry
            .get(node)
            .ok_or_else(|| anyhow::anyhow!("unknown task '{}'", node))?;
        visited.insert(node.to_string(), 1);
        for dep in &spec.deps {
            dfs(dep, registry, visited, order)?;
        }
        visited.insert(node.to_string(), 2);
        order.push(node.to_string());
        Ok(())
    }
    dfs(target, registry, &mut visited, &mut order)?;
    Ok(order)
}

async fn execute(spec: &TaskSpec, ctx: &RunContext, backend: &dyn Backend) -> anyhow::Result<()> {
    match &spec.kind {
        TaskKind::SyncCache => {
            let n = cache::sync_cache(&ctx.config, &ctx.project)?;
            info!(
                "Synced {} file(s) into {:?}",
                n,
                ctx.config.project_cache_dir(&ctx.project)
            );
            Ok(())
        }
        TaskKind::RunScript { script: pig_script } => {
            // generated just before use, never at graph-construction time
            let task_name = spec.name.strip_prefix("run_").unwrap_or(&spec.name);
            let path = script::write(
                &ctx.config,
                &ctx.project,
                pig_script,
                task_name,
                &BTreeMap::new(),
            )?;
            run_script(&spec.name, &path, ctx, backend).await
        }
        TaskKind::ListJobs => {
            let found = jobs::find_jobs(&ctx.project.root)?;
            for (name, job) in &found {
                let script = job
                    .script
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                info!("{} : {}", name, script);
            }
            Ok(())
        }
        TaskKind::RunNamedJob => {
            let job_name = ctx
                .job_name
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("no job name supplied; pass it after 'run-job'"))?;
            let found = jobs::find_jobs(&ctx.project.root)?;
            let job = found
                .get(job_name)
                .ok_or_else(|| anyhow::anyhow!("unknown job '{}'", job_name))?;
            let script_rel = job
                .script
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("job '{}' declares no script", job_name))?;
            let script_abs = ctx.project.root.join(script_rel);
            if !script_abs.is_file() {
                anyhow::bail!("script {:?} for job '{}' does not exist", script_abs, job_name);
            }
            let path = script::write(
                &ctx.config,
                &ctx.project,
                &script_abs,
                job_name,
                &job.parameters,
            )?;
            run_script(&spec.name, &path, ctx, backend).await
        }
    }
}

/// Execute a generated script via `sh`, record log + metadata artifacts,
/// and propagate a non-zero exit status as task failure.
async fn run_script(
    task: &str,
    script_path: &Path,
    ctx: &RunContext,
    backend: &dyn Backend,
) -> anyhow::Result<()> {
    let args = vec![script_path.display().to_string()];
    let (stdout, stderr, status) = backend.run("sh", &args, &ctx.project.root).await?;

    let run_dir = create_run_dir(&ctx.project.root.join(".pigrun"))?;
    let ts = timestamp();
    let safe_task = sanitize_filename(task);
    let summary = format!(
        "Task: {}\nScript: {}\nExit: {:?}\nStdout:\n{}\nStderr:\n{}\n",
        task,
        script_path.display(),
        status.code(),
        stdout,
        stderr
    );
    write_artifact(&run_dir, &format!("{}_{}.log", safe_task, ts), &summary)?;
    let meta = json!({
        "task": task,
        "script": script_path.display().to_string(),
        "exit_code": status.code(),
        "timestamp": Utc::now().to_rfc3339(),
    });
    write_artifact(&run_dir, &format!("{}_{}.json", safe_task, ts), &meta.to_string())?;

    if !stdout.trim().is_empty() {
        info!("{}", stdout.trim());
    }
    if !stderr.trim().is_empty() {
        warn!("{}", stderr.trim());
    }
    if !status.success() {
        anyhow::bail!("exited with code {:?}", status.code());
    }
    Ok(())
}
