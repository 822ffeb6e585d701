//! Suggestions produced by the rule engine and their flattened addressing.

use similar::{ChangeTag, TextDiff};
use std::fmt;

/// One rule's replacement for one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSuggestion {
    pub rule_name: String,
    pub suggested: String,
}

/// Every suggestion for one added line, in rule registration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSuggestions {
    pub line_number: u32,
    pub original: String,
    /// Never empty
    pub suggestions: Vec<RuleSuggestion>,
}

/// All suggestions for one file, in line order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSuggestions {
    pub path: String,
    pub safe_to_patch: bool,
    /// Never empty
    pub lines: Vec<LineSuggestions>,
}

/// A single entry of the flattened suggestion list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub path: String,
    pub line_number: u32,
    pub rule_name: String,
    pub original: String,
    pub suggested: String,
}

impl Suggestion {
    /// `path:line`
    pub fn location(&self) -> String {
        format!("{}:{}", self.path, self.line_number)
    }

    pub fn to_patch_request(&self) -> PatchRequest {
        PatchRequest {
            path: self.path.clone(),
            line_number: self.line_number,
            expected: self.original.clone(),
            replacement: self.suggested.clone(),
        }
    }

    /// Character-level difference between the original and suggested text.
    pub fn diff(&self) -> Vec<DiffSegment> {
        char_diff(&self.original, &self.suggested)
    }
}

/// A request to replace one line of a working-tree file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchRequest {
    pub path: String,
    /// 1-based
    pub line_number: u32,
    /// Text the line must still have for the replacement to go ahead
    pub expected: String,
    pub replacement: String,
}

/// Flatten files, then lines, then rule suggestions into the canonical order
/// used to address suggestions by index.
pub fn flatten(files: &[FileSuggestions]) -> Vec<Suggestion> {
    files
        .iter()
        .flat_map(|file| {
            file.lines.iter().flat_map(move |line| {
                line.suggestions.iter().map(move |s| Suggestion {
                    path: file.path.clone(),
                    line_number: line.line_number,
                    rule_name: s.rule_name.clone(),
                    original: line.original.clone(),
                    suggested: s.suggested.clone(),
                })
            })
        })
        .collect()
}

/// Whether a segment is shared, only in the original, or only in the suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Equal,
    Removed,
    Added,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffSegment {
    pub kind: SegmentKind,
    pub text: String,
}

/// Longest-common-subsequence character diff, with runs of the same kind merged.
pub fn char_diff(original: &str, suggested: &str) -> Vec<DiffSegment> {
    let diff = TextDiff::configure()
        .algorithm(similar::Algorithm::Lcs)
        .diff_chars(original, suggested);

    let mut segments: Vec<DiffSegment> = Vec::new();
    for change in diff.iter_all_changes() {
        let kind = match change.tag() {
            ChangeTag::Equal => SegmentKind::Equal,
            ChangeTag::Delete => SegmentKind::Removed,
            ChangeTag::Insert => SegmentKind::Added,
        };
        match segments.last_mut() {
            Some(last) if last.kind == kind => last.text.push_str(change.value()),
            _ => segments.push(DiffSegment {
                kind,
                text: change.value().to_string(),
            }),
        }
    }
    segments
}

/// Plain-text rendering: removed text as `[-x-]`, added text as `{+x+}`.
pub struct InlineDiff<'a>(pub &'a [DiffSegment]);

impl fmt::Display for InlineDiff<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in self.0 {
            match segment.kind {
                SegmentKind::Equal => write!(f, "{}", segment.text)?,
                SegmentKind::Removed => write!(f, "[-{}-]", segment.text)?,
                SegmentKind::Added => write!(f, "{{+{}+}}", segment.text)?,
            }
        }
        Ok(())
    }
}
