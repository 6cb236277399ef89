use crate::cache;
use crate::config::{PigConfig, Project};
use crate::util::allocate_unique_name;
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

pub const SYNC_TASK: &str = "syncPigCache";
pub const LIST_JOBS_TASK: &str = "listPigJobs";
pub const RUN_JOB_TASK: &str = "runPigJob";

/// What a registered task does when the runner reaches it.
#[derive(Debug, Clone)]
pub enum TaskKind {
    /// Mirror scripts and jars into the project cache dir.
    SyncCache,
    /// Generate and execute the runner script for one discovered Pig script.
    RunScript { script: PathBuf },
    /// Print every registered job with its script path.
    ListJobs,
    /// Run the job named at execution time, with its declared parameters.
    RunNamedJob,
}

#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub name: String,
    pub deps: Vec<String>,
    pub kind: TaskKind,
}

/// The task graph: named work-items with dependency edges. Iteration order
/// is the task name order, so listings are stable.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: BTreeMap<String, TaskSpec>,
}

impl TaskRegistry {
    pub fn get(&self, name: &str) -> Option<&TaskSpec> {
        self.tasks.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskSpec> {
        self.tasks.values()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub(crate) fn insert(&mut self, spec: TaskSpec) {
        self.tasks.insert(spec.name.clone(), spec);
    }
}

/// Build the task graph for a project, once, at configuration time:
/// the cache-sync task, one `run_<name>` task per discovered script (names
/// deduplicated with numeric suffixes), the job listing and the
/// parameterized job runner.
pub fn register_tasks(cfg: &PigConfig, project: &Project) -> anyhow::Result<TaskRegistry> {
    let mut registry = TaskRegistry::default();
    registry.insert(TaskSpec {
        name: SYNC_TASK.to_string(),
        deps: Vec::new(),
        kind: TaskKind::SyncCache,
    });

    if cfg.generate_tasks {
        let mut used: HashSet<String> = HashSet::new();
        for script in cache::discover_scripts(&project.root)? {
            let candidate = match script.file_name() {
                Some(n) => n.to_string_lossy().into_owned(),
                None => continue,
            };
            let name = allocate_unique_name(&candidate, &used);
            used.insert(name.clone());
            registry.insert(TaskSpec {
                name: format!("run_{}", name),
                deps: vec![SYNC_TASK.to_string()],
                kind: TaskKind::RunScript { script },
            });
        }
    }

    registry.insert(TaskSpec {
        name: LIST_JOBS_TASK.to_string(),
        deps: Vec::new(),
        kind: TaskKind::ListJobs,
    });
    registry.insert(TaskSpec {
        name: RUN_JOB_TASK.to_string(),
        deps: vec![SYNC_TASK.to_string()],
        kind: TaskKind::RunNamedJob,
    });
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn setup() -> (tempfile::TempDir, PigConfig, Project) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("proj");
        fs::create_dir_all(root.join("src/sub")).unwrap();
        fs::write(root.join("src/foo.pig"), "-- a\n").unwrap();
        fs::write(root.join("src/sub/foo.pig"), "-- b\n").unwrap();
        let mut cfg = PigConfig::default();
        cfg.cache_dir = dir.path().join("cache");
        let project = Project {
            root,
            name: "proj".to_string(),
        };
        (dir, cfg, project)
    }

    #[test]
    fn duplicate_script_names_get_suffixed_tasks() {
        let (_dir, cfg, project) = setup();
        let registry = register_tasks(&cfg, &project).unwrap();

        let foo = registry.get("run_foo").expect("run_foo registered");
        let foo2 = registry.get("run_foo_2").expect("run_foo_2 registered");
        assert_eq!(foo.deps, vec![SYNC_TASK.to_string()]);
        assert_eq!(foo2.deps, vec![SYNC_TASK.to_string()]);
        match (&foo.kind, &foo2.kind) {
            (TaskKind::RunScript { script: a }, TaskKind::RunScript { script: b }) => {
                assert!(a.ends_with("src/foo.pig"));
                assert!(b.ends_with("src/sub/foo.pig"));
            }
            other => panic!("unexpected kinds: {:?}", other),
        }
    }

    #[test]
    fn fixed_tasks_always_present() {
        let (_dir, cfg, project) = setup();
        let registry = register_tasks(&cfg, &project).unwrap();
        assert!(!registry.is_empty());
        assert!(registry.get(SYNC_TASK).is_some());
        assert!(registry.get(LIST_JOBS_TASK).is_some());
        let run_job = registry.get(RUN_JOB_TASK).unwrap();
        assert_eq!(run_job.deps, vec![SYNC_TASK.to_string()]);
    }

    #[test]
    fn generate_tasks_false_skips_script_tasks() {
        let (_dir, mut cfg, project) = setup();
        cfg.generate_tasks = false;
        let registry = register_tasks(&cfg, &project).unwrap();
        assert!(registry.get("run_foo").is_none());
        assert_eq!(registry.len(), 3);
    }
}
