use std::collections::HashSet;
use std::fs;
use std::path::Path;
use uuid::Uuid;
use chrono::Utc;

/// Allocate a task name that does not collide with `used`.
///
/// Strips a trailing `.pig` extension from the candidate, then appends
/// `_2`, `_3`, ... (first free integer >= 2) until the name is unused.
/// The caller is responsible for inserting the result into `used`.
pub fn allocate_unique_name(candidate: &str, used: &HashSet<String>) -> String {
    let base = candidate.strip_suffix(".pig").unwrap_or(candidate);
    if !used.contains(base) {
        return base.to_string();
    }
    let mut n: u32 = 2;
    loop {
        let name = format!("{}_{}", base, n);
        if !used.contains(&name) {
            return name;
        }
        n += 1;
    }
}

/// Create a run directory and return it
pub fn create_run_dir(base: &Path) -> anyhow::Result<std::path::PathBuf> {
    let run_id = Uuid::new_v4().to_string();
    let dir = base.join("runs").join(run_id);
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

pub fn write_artifact(dir: &Path, name: &str, content: &str) -> anyhow::Result<()> {
    let path = dir.join(name);
    fs::write(path, content)?;
    Ok(())
}

pub fn timestamp() -> String {
    // Format: YYYY-MM-DD_HH-MM-SS
    Utc::now().format("%Y-%m-%d_%H-%M-%S").to_string()
}

/// Replace illegal Windows filename characters
pub fn sanitize_filename(name: &str) -> String {
    let illegal = ['<', '>', '/', '\\', '|', '?', '*', ':', '"'];
    name.chars()
        .map(|c| if illegal.contains(&c) { '_' } else { c })
        .collect()
}
