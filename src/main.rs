mod backends;
mod cache;
mod cli;
mod config;
mod jobs;
mod script;
mod tasks;
mod util;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .init();

    let opts = cli::get_opts();
    let project = config::Project::from_root(std::path::Path::new(&opts.project_dir))?;
    let cfg = config::load_config(&project.root).context("configuration failed")?;
    let registry = tasks::register_tasks(&cfg, &project)?;

    match opts.subcommand.as_str() {
        "tasks" => {
            for spec in registry.iter() {
                if spec.deps.is_empty() {
                    println!("{}", spec.name);
                } else {
                    println!("{} (depends on: {})", spec.name, spec.deps.join(", "));
                }
            }
        }
        "run" => {
            let name = opts
                .arg
                .context("missing task name (usage: pigrun run <task> [project_dir])")?;
            let ctx = tasks::RunContext {
                config: cfg,
                project,
                job_name: None,
            };
            tasks::run_task(&registry, &name, &ctx)
                .await
                .context("task run failed")?;
        }
        "jobs" => {
            let ctx = tasks::RunContext {
                config: cfg,
                project,
                job_name: None,
            };
            tasks::run_task(&registry, tasks::LIST_JOBS_TASK, &ctx).await?;
        }
        "run-job" => {
            // a missing job name is rejected by the task itself, with context
            let ctx = tasks::RunContext {
                config: cfg,
                project,
                job_name: opts.arg,
            };
            tasks::run_task(&registry, tasks::RUN_JOB_TASK, &ctx)
                .await
                .context("job run failed")?;
        }
        other => {
            eprintln!(
                "Unknown subcommand: {} (supported: tasks, run, jobs, run-job)",
                other
            );
        }
    }

    Ok(())
}
