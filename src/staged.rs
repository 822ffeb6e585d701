//! Extraction of the lines a commit is about to add.

use crate::diff::Diff;
use crate::repo::{ExecutionError, Repository};
use std::collections::BTreeSet;
use tracing::debug;

/// A line present in the staged version of a file but not in the last commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedLine {
    /// 1-based position in the staged file content
    pub line_number: u32,
    pub text: String,
}

/// The added lines of one staged file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    /// Repository-relative path
    pub path: String,
    /// False when the working copy has edits beyond what is staged, in which
    /// case staged line numbers cannot be trusted against the file on disk.
    pub safe_to_patch: bool,
    pub added_lines: Vec<AddedLine>,
}

impl StagedFile {
    /// Treat every line of `content` as added, numbered from 1.
    pub fn whole_file(path: impl Into<String>, content: &str) -> Self {
        Self {
            path: path.into(),
            safe_to_patch: true,
            added_lines: content
                .lines()
                .enumerate()
                .map(|(i, text)| AddedLine {
                    line_number: i as u32 + 1,
                    text: text.to_string(),
                })
                .collect(),
        }
    }

    pub fn texts(&self) -> Vec<String> {
        self.added_lines.iter().map(|l| l.text.clone()).collect()
    }
}

/// Snapshot the staged changes of `repo`, one entry per file with added lines.
///
/// # Errors
///
/// Returns [`ExecutionError`] if git fails.
pub fn staged_changes(repo: &Repository) -> Result<Vec<StagedFile>, ExecutionError> {
    let raw = repo.staged_diff()?;
    debug!(bytes = raw.len(), "read staged diff");

    let unstaged = repo.unstaged_paths()?;
    let files = from_diff(&raw, &unstaged);
    debug!(files = files.len(), "extracted staged files with additions");

    Ok(files)
}

/// Build [`StagedFile`]s from raw `git diff --cached -U0` output.
///
/// Files listed in `unstaged` are marked unsafe to patch.
pub fn from_diff(raw: &[u8], unstaged: &BTreeSet<String>) -> Vec<StagedFile> {
    Diff::parse_bytes(raw)
        .files
        .into_iter()
        .filter_map(|file| {
            let added_lines: Vec<AddedLine> = file
                .added_lines()
                .map(|(line_number, text)| AddedLine {
                    line_number,
                    text: text.to_string(),
                })
                .collect();

            if added_lines.is_empty() {
                return None;
            }

            let safe_to_patch = !unstaged.contains(&file.path);
            debug!(
                path = %file.path,
                added = added_lines.len(),
                safe_to_patch,
                "staged file"
            );

            Some(StagedFile {
                path: file.path,
                safe_to_patch,
                added_lines,
            })
        })
        .collect()
}
