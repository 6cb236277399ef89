use anyhow::Context;
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

/// Backend trait: run a program and return (stdout, stderr, exit_status)
#[async_trait]
pub trait Backend: Send + Sync {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        cwd: &Path,
    ) -> anyhow::Result<(String, String, std::process::ExitStatus)>;
}

/// Runs generated scripts through the host `sh` as a blocking child
/// process: no timeout, no cancellation, exit status reported as-is.
pub struct ShellBackend;

impl ShellBackend {
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl Backend for ShellBackend {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        cwd: &Path,
    ) -> anyhow::Result<(String, String, std::process::ExitStatus)> {
        let mut c = Command::new(program);
        c.args(args).current_dir(cwd);
        let output = c
            .output()
            .await
            .with_context(|| format!("failed to spawn '{}'", program))?;
        let out = String::from_utf8_lossy(&output.stdout).to_string();
        let err = String::from_utf8_lossy(&output.stderr).to_string();
        Ok((out, err, output.status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_output_and_status() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ok.sh"), "#!/bin/sh\necho hello\n").unwrap();
        let backend = ShellBackend::new();
        let (out, _err, status) = backend
            .run("sh", &["ok.sh".to_string()], dir.path())
            .await
            .unwrap();
        assert!(status.success());
        assert_eq!(out.trim(), "hello");
    }

    #[tokio::test]
    async fn nonzero_exit_is_reported_not_erred() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.sh"), "#!/bin/sh\nexit 3\n").unwrap();
        let backend = ShellBackend::new();
        let (_out, _err, status) = backend
            .run("sh", &["bad.sh".to_string()], dir.path())
            .await
            .unwrap();
        assert_eq!(status.code(), Some(3));
    }
}
