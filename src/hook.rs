//! Installing the pre-commit hook.

use crate::repo::{ExecutionError, Repository};
use error_set::error_set;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

error_set! {
    /// Errors from installing the hook
    HookError := {
        #[display("A pre-commit hook is already installed at {path}; remove it before installing")]
        AlreadyInstalled { path: String },
        #[display("Failed to write {path}: {message}")]
        WriteFailed { path: String, message: String },
        ExecutionError(ExecutionError),
    }
}

/// Script git runs before each commit. Git hooks get no terminal on stdin, so
/// the prompt is re-attached to it when there is one.
pub const HOOK_SCRIPT: &str = "#!/bin/sh
# Installed by stylish-commit
if (: < /dev/tty) 2>/dev/null; then
  exec stylish-commit run < /dev/tty
fi
exec stylish-commit run
";

/// Write the pre-commit hook into the hooks directory of `repo`.
///
/// # Errors
///
/// [`HookError::AlreadyInstalled`] if a pre-commit hook exists already.
pub fn install(repo: &Repository) -> Result<PathBuf, HookError> {
    let hooks = repo.hooks_dir()?;
    let destination = hooks.join("pre-commit");

    if destination.exists() {
        return Err(HookError::AlreadyInstalled {
            path: destination.display().to_string(),
        });
    }

    fs::create_dir_all(&hooks).map_err(|e| write_failed(&hooks, e))?;
    fs::write(&destination, HOOK_SCRIPT).map_err(|e| write_failed(&destination, e))?;
    make_executable(&destination)?;

    info!(path = %destination.display(), "installed pre-commit hook");
    Ok(destination)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), HookError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(|e| write_failed(path, e))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<(), HookError> {
    Ok(())
}

fn write_failed(path: &Path, e: std::io::Error) -> HookError {
    HookError::WriteFailed {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}
