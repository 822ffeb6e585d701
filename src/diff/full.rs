use super::file::FileDiff;
use std::str;
use tracing::warn;

/// A parsed `git diff` covering any number of files
pub struct Diff {
    pub files: Vec<FileDiff>,
}

impl Diff {
    /// Parse complete `git diff` output, one [`FileDiff`] per `diff --git` section.
    ///
    /// Sections that carry no hunks on the new side (deletions, binary files,
    /// mode changes) are dropped.
    pub fn parse(text: &str) -> Self {
        Self::parse_bytes(text.as_bytes())
    }

    /// Like [`Diff::parse`], but decodes each file's section separately.
    /// A section that is not valid UTF-8 is skipped with a warning and does
    /// not affect the other files.
    pub fn parse_bytes(raw: &[u8]) -> Self {
        let files = sections(raw)
            .into_iter()
            .filter_map(|section| match str::from_utf8(section) {
                Ok(text) => FileDiff::parse(text),
                Err(e) => {
                    let header = section.split(|&b| b == b'\n').next().unwrap_or_default();
                    warn!(
                        section = %String::from_utf8_lossy(header),
                        error = %e,
                        "skipping file whose diff is not UTF-8"
                    );
                    None
                }
            })
            .collect();

        Diff { files }
    }
}

/// Split raw diff output at every line starting with `diff --git `.
/// Anything before the first such line is dropped.
fn sections(raw: &[u8]) -> Vec<&[u8]> {
    let mut starts = Vec::new();
    let mut offset = 0;
    for line in raw.split_inclusive(|&b| b == b'\n') {
        if line.starts_with(b"diff --git ") {
            starts.push(offset);
        }
        offset += line.len();
    }

    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(raw.len());
            &raw[start..end]
        })
        .collect()
}
