//! Writing accepted suggestions back to the working tree.

use crate::repo::{ExecutionError, Repository};
use crate::suggestion::PatchRequest;
use error_set::error_set;
use std::fs;
use tracing::{debug, info};

error_set! {
    /// Errors from applying suggestions to working-tree files
    ApplyError := {
        #[display("{path}:{line_number} has changed since the suggestion was made (expected '{expected}', found '{found}')")]
        PatchConflict {
            path: String,
            line_number: u32,
            expected: String,
            found: String,
        },
        #[display("Failed to read {path}: {message}")]
        ReadFailed { path: String, message: String },
        #[display("Failed to write {path}: {message}")]
        WriteFailed { path: String, message: String },
        ExecutionError(ExecutionError),
    }
}

/// Apply `requests` in order, re-staging each file after it is written.
///
/// Every request re-reads its file, so several requests may target the same
/// file as long as each one only replaces a line. Stops at the first failure;
/// files already written stay written.
///
/// # Errors
///
/// [`ApplyError::PatchConflict`] if a line no longer holds the expected text,
/// I/O errors for unreadable or unwritable files, and [`ExecutionError`] if
/// staging fails.
pub fn apply_suggestions(repo: &Repository, requests: &[PatchRequest]) -> Result<(), ApplyError> {
    for request in requests {
        apply_one(repo, request)?;
        repo.stage(&request.path)?;
        info!(path = %request.path, line = request.line_number, "applied suggestion");
    }
    Ok(())
}

/// Replace one line of one file, leaving the file untouched on conflict.
pub fn apply_one(repo: &Repository, request: &PatchRequest) -> Result<(), ApplyError> {
    let path = repo.path_of(&request.path);
    let content = fs::read_to_string(&path).map_err(|e| ApplyError::ReadFailed {
        path: request.path.clone(),
        message: e.to_string(),
    })?;

    let updated = replace_line(&content, request)?;

    fs::write(&path, updated).map_err(|e| ApplyError::WriteFailed {
        path: request.path.clone(),
        message: e.to_string(),
    })?;
    debug!(path = %request.path, line = request.line_number, "rewrote file");
    Ok(())
}

/// Return `content` with line `request.line_number` replaced, keeping line
/// terminators exactly as they were.
fn replace_line(content: &str, request: &PatchRequest) -> Result<String, ApplyError> {
    let mut lines: Vec<&str> = content.split_inclusive('\n').collect();
    let index = (request.line_number as usize).checked_sub(1);

    let Some((slot, (body, terminator))) = index
        .and_then(|i| lines.get(i).map(|line| (i, split_terminator(line))))
    else {
        return Err(ApplyError::PatchConflict {
            path: request.path.clone(),
            line_number: request.line_number,
            expected: request.expected.clone(),
            found: "<end of file>".to_string(),
        });
    };

    if body != request.expected {
        return Err(ApplyError::PatchConflict {
            path: request.path.clone(),
            line_number: request.line_number,
            expected: request.expected.clone(),
            found: body.to_string(),
        });
    }

    let replaced = format!("{}{}", request.replacement, terminator);
    lines[slot] = &replaced;
    Ok(lines.concat())
}

/// Split a line into its content and its `\n` / `\r\n` terminator
fn split_terminator(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;
    use tempfile::TempDir;

    fn request(line_number: u32, expected: &str, replacement: &str) -> PatchRequest {
        PatchRequest {
            path: "file.js".to_string(),
            line_number,
            expected: expected.to_string(),
            replacement: replacement.to_string(),
        }
    }

    #[test]
    fn replaces_single_line() {
        let out = replace_line("a\nb  \nc\n", &request(2, "b  ", "b")).unwrap();
        assert_eq!(out, "a\nb\nc\n");
    }

    #[test]
    fn keeps_crlf_terminators() {
        let out = replace_line("a\r\nb \r\nc", &request(2, "b ", "b")).unwrap();
        assert_eq!(out, "a\r\nb\r\nc");
    }

    #[test]
    fn last_line_without_newline() {
        let out = replace_line("a\nb ", &request(2, "b ", "b")).unwrap();
        assert_eq!(out, "a\nb");
    }

    #[test]
    fn mismatch_is_conflict() {
        let result = replace_line("a\nb\n", &request(2, "b  ", "b"));
        assert!(matches!(
            result,
            Err(ApplyError::PatchConflict { found, .. }) if found == "b"
        ));
    }

    #[test]
    fn line_past_end_is_conflict() {
        assert!(matches!(
            replace_line("a\n", &request(5, "x", "y")),
            Err(ApplyError::PatchConflict { .. })
        ));
        assert!(matches!(
            replace_line("a\n", &request(0, "a", "y")),
            Err(ApplyError::PatchConflict { .. })
        ));
    }

    #[test]
    fn conflict_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::at(dir.path());
        fs::write(dir.path().join("file.js"), "one\ntwo\n").unwrap();

        let result = apply_one(&repo, &request(1, "uno", "eins"));
        assert!(matches!(result, Err(ApplyError::PatchConflict { .. })));
        assert_eq!(
            fs::read_to_string(dir.path().join("file.js")).unwrap(),
            "one\ntwo\n"
        );
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::at(dir.path());
        let result = apply_one(&repo, &request(1, "a", "b"));
        assert!(matches!(result, Err(ApplyError::ReadFailed { .. })));
    }
}
