pub mod registry;
pub mod runner;

pub use registry::{register_tasks, TaskRegistry, LIST_JOBS_TASK, RUN_JOB_TASK};
pub use runner::{run_task, RunContext};
