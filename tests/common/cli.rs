#![allow(dead_code)]

use std::path::Path;
use std::process::Output;
use tempfile::TempDir;

/// A throwaway directory the `mex` binary runs in.
pub struct MexWorkspace {
    dir: TempDir,
}

impl MexWorkspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create workspace dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

impl Default for MexWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// Captured output of one binary invocation.
pub struct RunResult {
    pub status: std::process::ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// Run the `mex` binary inside the workspace. `label` names the step
/// in failure messages.
pub fn run_mex<I, S>(workspace: &MexWorkspace, args: I, label: &str) -> RunResult
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    let output: Output = assert_cmd::Command::cargo_bin("mex")
        .expect("mex binary")
        .args(args)
        .current_dir(workspace.path())
        .env_remove("MEX_DIR")
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("{label}: failed to run mex: {e}"));

    RunResult {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    }
}

/// Run and require success.
pub fn run_mex_ok<I, S>(workspace: &MexWorkspace, args: I, label: &str) -> RunResult
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    let result = run_mex(workspace, args, label);
    assert!(
        result.status.success(),
        "{label} failed\nstdout:\n{}\nstderr:\n{}",
        result.stdout,
        result.stderr
    );
    result
}
