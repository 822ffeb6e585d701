//! Parsing of zero-context (`-U0`) unified diffs as produced by `git diff`.

pub mod file;
pub mod full;
pub mod hunk;

pub use file::FileDiff;
pub use full::Diff;
pub use hunk::{Hunk, HunkRange};
