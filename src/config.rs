use anyhow::Context;
use std::path::{Path, PathBuf};

/// Project-root properties file mapped onto `PigConfig`
pub const PROPERTIES_FILE: &str = ".pigProperties";

/// Resolved settings for Pig task generation. Loaded once, immutable after.
#[derive(Debug, Clone)]
pub struct PigConfig {
    /// Local staging directory for scripts and jars; the per-project
    /// working set lives at `<cache_dir>/<project>`.
    pub cache_dir: PathBuf,
    pub remote_host: Option<String>,
    /// Remote-shell client invocation, e.g. `ssh` or `ssh -K`.
    pub remote_shell_cmd: Option<String>,
    pub remote_cache_dir: Option<String>,
    pub pig_command: String,
    pub pig_options: Option<String>,
    /// Directory (relative to the project root) holding jar dependencies.
    pub dependency_dir: PathBuf,
    /// Whether per-script run tasks are registered at all.
    pub generate_tasks: bool,
}

impl Default for PigConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(".pigrun/cache"),
            remote_host: None,
            remote_shell_cmd: None,
            remote_cache_dir: None,
            pig_command: "pig".to_string(),
            pig_options: None,
            dependency_dir: PathBuf::from("lib"),
            generate_tasks: true,
        }
    }
}

impl PigConfig {
    /// The project's staging directory, `<cache_dir>/<project>`. A relative
    /// cache dir is anchored at the project root.
    pub fn project_cache_dir(&self, project: &Project) -> PathBuf {
        let base = if self.cache_dir.is_absolute() {
            self.cache_dir.clone()
        } else {
            project.root.join(&self.cache_dir)
        };
        base.join(&project.name)
    }
}

/// Identity of the project being processed: its root and display name
/// (the root directory's file name).
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub name: String,
}

impl Project {
    pub fn from_root(root: &Path) -> anyhow::Result<Self> {
        let root = root
            .canonicalize()
            .with_context(|| format!("project directory {:?} not found", root))?;
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project".to_string());
        Ok(Self { root, name })
    }
}

/// Load `.pigProperties` from the project root (all fields default when the
/// file is absent) and validate the result.
pub fn load_config(project_root: &Path) -> anyhow::Result<PigConfig> {
    let path = project_root.join(PROPERTIES_FILE);
    let mut cfg = PigConfig::default();
    if path.is_file() {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {:?}", path))?;
        apply_properties(&mut cfg, &content)
            .with_context(|| format!("invalid properties in {:?}", path))?;
    }
    validate(&cfg)?;
    Ok(cfg)
}

fn apply_properties(cfg: &mut PigConfig, content: &str) -> anyhow::Result<()> {
    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("line {}: expected key=value, got '{}'", idx + 1, line))?;
        let (key, value) = (key.trim(), value.trim());
        match key {
            "pig.cache.dir" => cfg.cache_dir = PathBuf::from(value),
            "pig.remote.host" => cfg.remote_host = Some(value.to_string()),
            "pig.remote.shell.cmd" => cfg.remote_shell_cmd = Some(value.to_string()),
            "pig.remote.cache.dir" => cfg.remote_cache_dir = Some(value.to_string()),
            "pig.command" => cfg.pig_command = value.to_string(),
            "pig.options" => cfg.pig_options = Some(value.to_string()),
            "pig.dependency.dir" => cfg.dependency_dir = PathBuf::from(value),
            "pig.generate.tasks" => {
                cfg.generate_tasks = value
                    .parse()
                    .map_err(|_| anyhow::anyhow!("pig.generate.tasks must be true or false, got '{}'", value))?;
            }
            other => anyhow::bail!("unknown property '{}'", other),
        }
    }
    Ok(())
}

/// A remote host without its companion settings would interpolate blanks
/// into generated scripts, so reject it before any tasks are registered.
fn validate(cfg: &PigConfig) -> anyhow::Result<()> {
    if cfg.remote_host.is_some() {
        if cfg.remote_shell_cmd.is_none() {
            anyhow::bail!("pig.remote.host is set but pig.remote.shell.cmd is missing");
        }
        if cfg.remote_cache_dir.is_none() {
            anyhow::bail!("pig.remote.host is set but pig.remote.cache.dir is missing");
        }
    }
    Ok(())
}
