use crate::config::{PigConfig, Project};
use anyhow::Context;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// All `.pig` scripts under `root`, absolute paths, in sorted walk order so
/// downstream task names are stable across runs. Dot-directories are
/// skipped (cache and run state live there).
pub fn discover_scripts(root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut scripts = Vec::new();
    let walk = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));
    for entry in walk {
        let entry = entry.with_context(|| format!("failed to walk {:?}", root))?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|e| e.to_str()) == Some("pig")
        {
            scripts.push(entry.path().to_path_buf());
        }
    }
    Ok(scripts)
}

/// Mirror the project's Pig scripts (relative layout preserved) and jar
/// dependencies (flattened, so the `*.jar` interpreter glob matches) into
/// `<cache_dir>/<project>`. Destination files with no source counterpart
/// are removed and emptied directories pruned. Idempotent.
///
/// Returns the number of files in the mirrored set.
pub fn sync_cache(cfg: &PigConfig, project: &Project) -> anyhow::Result<usize> {
    let dest_root = cfg.project_cache_dir(project);
    fs::create_dir_all(&dest_root)
        .with_context(|| format!("failed to create cache dir {:?}", dest_root))?;

    // desired destination-relative path -> source file
    let mut desired: BTreeMap<PathBuf, PathBuf> = BTreeMap::new();
    for script in discover_scripts(&project.root)? {
        let rel = script
            .strip_prefix(&project.root)
            .with_context(|| format!("script {:?} outside project root", script))?
            .to_path_buf();
        desired.insert(rel, script);
    }
    let dep_dir = project.root.join(&cfg.dependency_dir);
    if dep_dir.is_dir() {
        for entry in fs::read_dir(&dep_dir)
            .with_context(|| format!("failed to read dependency dir {:?}", dep_dir))?
        {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("jar") {
                if let Some(file_name) = path.file_name() {
                    desired.insert(PathBuf::from(file_name), path.clone());
                }
            }
        }
    }

    for (rel, src) in &desired {
        let dst = dest_root.join(rel);
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {:?}", parent))?;
        }
        fs::copy(src, &dst)
            .with_context(|| format!("failed to copy {:?} into cache", src))?;
    }

    // contents_first so files go before their directories
    for entry in WalkDir::new(&dest_root).contents_first(true) {
        let entry = entry.with_context(|| format!("failed to walk {:?}", dest_root))?;
        let path = entry.path();
        if path == dest_root {
            continue;
        }
        let rel = path
            .strip_prefix(&dest_root)
            .with_context(|| format!("cache entry {:?} outside cache root", path))?;
        if entry.file_type().is_file() {
            if !desired.contains_key(rel) {
                fs::remove_file(path)
                    .with_context(|| format!("failed to remove stale {:?}", path))?;
            }
        } else if entry.file_type().is_dir()
            && fs::read_dir(path)
                .with_context(|| format!("failed to read {:?}", path))?
                .next()
                .is_none()
        {
            fs::remove_dir(path).with_context(|| format!("failed to prune {:?}", path))?;
        }
    }

    Ok(desired.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (tempfile::TempDir, PigConfig, Project) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("proj");
        fs::create_dir_all(root.join("src/sub")).unwrap();
        fs::create_dir_all(root.join("lib")).unwrap();
        fs::write(root.join("src/foo.pig"), "-- foo\n").unwrap();
        fs::write(root.join("src/sub/foo.pig"), "-- sub foo\n").unwrap();
        fs::write(root.join("lib/dep.jar"), "jar").unwrap();
        fs::write(root.join("lib/notes.txt"), "not a jar").unwrap();
        let mut cfg = PigConfig::default();
        cfg.cache_dir = dir.path().join("cache");
        let project = Project {
            root,
            name: "proj".to_string(),
        };
        (dir, cfg, project)
    }

    #[test]
    fn discovery_is_sorted_and_skips_dot_dirs() {
        let (_dir, _cfg, project) = setup();
        fs::create_dir_all(project.root.join(".pigrun/cache")).unwrap();
        fs::write(project.root.join(".pigrun/cache/ghost.pig"), "").unwrap();
        let scripts = discover_scripts(&project.root).unwrap();
        let rels: Vec<_> = scripts
            .iter()
            .map(|p| p.strip_prefix(&project.root).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            rels,
            vec![PathBuf::from("src/foo.pig"), PathBuf::from("src/sub/foo.pig")]
        );
    }

    #[test]
    fn sync_copies_scripts_and_flattens_jars() {
        let (_dir, cfg, project) = setup();
        let n = sync_cache(&cfg, &project).unwrap();
        assert_eq!(n, 3);
        let dest = cfg.project_cache_dir(&project);
        assert!(dest.join("src/foo.pig").is_file());
        assert!(dest.join("src/sub/foo.pig").is_file());
        assert!(dest.join("dep.jar").is_file());
        assert!(!dest.join("notes.txt").exists());
    }

    #[test]
    fn sync_is_idempotent() {
        let (_dir, cfg, project) = setup();
        assert_eq!(sync_cache(&cfg, &project).unwrap(), 3);
        assert_eq!(sync_cache(&cfg, &project).unwrap(), 3);
        assert!(cfg.project_cache_dir(&project).join("src/foo.pig").is_file());
    }

    #[test]
    fn sync_removes_stale_files_and_prunes_dirs() {
        let (_dir, cfg, project) = setup();
        sync_cache(&cfg, &project).unwrap();
        let dest = cfg.project_cache_dir(&project);
        fs::write(dest.join("run_old.sh"), "#!/bin/sh\n").unwrap();

        fs::remove_file(project.root.join("src/sub/foo.pig")).unwrap();
        sync_cache(&cfg, &project).unwrap();

        assert!(!dest.join("src/sub/foo.pig").exists());
        assert!(!dest.join("src/sub").exists());
        assert!(!dest.join("run_old.sh").exists());
        assert!(dest.join("src/foo.pig").is_file());
        assert!(dest.join("dep.jar").is_file());
    }
}
