//! The version-control boundary: every interaction with `git` goes through
//! [`Repository`].

use error_set::error_set;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, trace};

error_set! {
    /// Errors from locating the repository
    RepositoryError := {
        #[display("Not inside a git repository: {path}")]
        NotARepository { path: String },
    } || ExecutionError

    /// Errors from git command execution
    ExecutionError := {
        #[display("Failed to run `{command}`: {message}")]
        SpawnFailed { command: String, message: String },
        #[display("`{command}` failed: {stderr}")]
        CommandFailed { command: String, stderr: String },
        #[display("Invalid UTF-8 in `{command}` output: {message}")]
        InvalidUtf8 { command: String, message: String },
    }
}

/// A git working tree rooted at [`Repository::root`].
#[derive(Debug, Clone)]
pub struct Repository {
    root: PathBuf,
}

impl Repository {
    /// Locate the repository enclosing `start`.
    ///
    /// # Errors
    ///
    /// [`RepositoryError::NotARepository`] when git reports no enclosing work
    /// tree, [`RepositoryError::SpawnFailed`] when git cannot be run at all.
    pub fn discover(start: &Path) -> Result<Self, RepositoryError> {
        let output = Command::new("git")
            .arg("-C")
            .arg(start)
            .args(["rev-parse", "--show-toplevel"])
            .output()
            .map_err(|e| ExecutionError::SpawnFailed {
                command: "git rev-parse --show-toplevel".to_string(),
                message: e.to_string(),
            })?;

        let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !output.status.success() || root.is_empty() {
            return Err(RepositoryError::NotARepository {
                path: start.display().to_string(),
            });
        }

        debug!(root = %root, "found repository");
        Ok(Self {
            root: PathBuf::from(root),
        })
    }

    /// Use `root` as the repository root without asking git.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of a repository-relative file
    pub fn path_of(&self, file: &str) -> PathBuf {
        self.root.join(file)
    }

    /// Zero-context diff between the last commit and the index, undecoded:
    /// staged files are not required to be UTF-8.
    pub fn staged_diff(&self) -> Result<Vec<u8>, ExecutionError> {
        self.git_bytes(&[
            "-c",
            "core.quotePath=false",
            "diff",
            "--cached",
            "--no-ext-diff",
            "--no-color",
            "--minimal",
            "-U0",
            "--src-prefix=a/",
            "--dst-prefix=b/",
        ])
    }

    /// Files whose working-tree content differs from the index.
    pub fn unstaged_paths(&self) -> Result<BTreeSet<String>, ExecutionError> {
        let output = self.git(&["diff", "--name-only", "-z", "--no-ext-diff"])?;
        Ok(output
            .split('\0')
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Add the working-tree content of `file` to the index.
    pub fn stage(&self, file: &str) -> Result<(), ExecutionError> {
        self.git(&["add", "--", file]).map(|_| ())
    }

    /// Directory git runs hooks from (honours `core.hooksPath`).
    pub fn hooks_dir(&self) -> Result<PathBuf, ExecutionError> {
        let output = self.git(&["rev-parse", "--git-path", "hooks"])?;
        let hooks = PathBuf::from(output.trim());
        Ok(if hooks.is_absolute() {
            hooks
        } else {
            self.root.join(hooks)
        })
    }

    /// Run git in the repository root and return its stdout as text
    fn git(&self, args: &[&str]) -> Result<String, ExecutionError> {
        String::from_utf8(self.git_bytes(args)?).map_err(|e| ExecutionError::InvalidUtf8 {
            command: format!("git {}", args.join(" ")),
            message: e.to_string(),
        })
    }

    /// Run git in the repository root and return its raw stdout
    fn git_bytes(&self, args: &[&str]) -> Result<Vec<u8>, ExecutionError> {
        let command = format!("git {}", args.join(" "));
        trace!(%command, "running");

        let output = Command::new("git")
            .arg("-C")
            .arg(&self.root)
            .args(args)
            .output()
            .map_err(|e| ExecutionError::SpawnFailed {
                command: command.clone(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExecutionError::CommandFailed {
                command,
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn discover_outside_repository_fails() {
        let dir = TempDir::new().unwrap();
        let result = Repository::discover(dir.path());
        assert!(matches!(
            result,
            Err(RepositoryError::NotARepository { .. })
        ));
    }

    #[test]
    fn discover_finds_root_from_subdirectory() {
        let dir = TempDir::new().unwrap();
        git2::Repository::init(dir.path()).unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();

        let repo = Repository::discover(&nested).unwrap();
        assert_eq!(
            repo.root().canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn failing_command_reports_stderr() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::at(dir.path());
        let result = repo.stage("missing.txt");
        assert!(matches!(result, Err(ExecutionError::CommandFailed { .. })));
    }
}
