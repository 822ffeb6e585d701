//! Runs rules over staged lines and collects where they disagree with the text.

use crate::rule::{Rule, RuleContext};
use crate::staged::StagedFile;
use crate::suggestion::{FileSuggestions, LineSuggestions, RuleSuggestion};
use std::fmt;
use tracing::{debug, trace, warn};

/// Why a rule's output for a file was discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The transform returned an error
    Failed(String),
    /// The transform returned the wrong number of lines
    LengthMismatch { expected: usize, actual: usize },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Failed(message) => write!(f, "{message}"),
            FailureReason::LengthMismatch { expected, actual } => {
                write!(f, "returned {actual} lines for {expected} input lines")
            }
        }
    }
}

/// A rule that contributed nothing for one file because it misbehaved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleFailure {
    pub rule: String,
    pub path: String,
    pub reason: FailureReason,
}

/// Result of running every rule over every staged file.
#[derive(Debug, Default)]
pub struct Evaluation {
    /// Files with at least one suggestion, in input order
    pub suggestions: Vec<FileSuggestions>,
    /// Rule contributions that were dropped
    pub failures: Vec<RuleFailure>,
}

/// Evaluate `rules` (in registration order) against each file's added lines.
pub fn run(files: &[StagedFile], rules: &[Rule]) -> Evaluation {
    let mut evaluation = Evaluation::default();

    for file in files {
        let originals = file.texts();
        let context = RuleContext { path: &file.path };

        // (rule name, rewritten lines) for each rule whose output is usable
        let mut results: Vec<(&str, Vec<String>)> = Vec::new();

        for rule in rules {
            if !rule.matches(&file.path) {
                trace!(rule = %rule.name, path = %file.path, "rule does not apply");
                continue;
            }

            debug!(rule = %rule.name, path = %file.path, lines = originals.len(), "running rule");
            let reason = match rule.apply(&originals, &context) {
                Ok(Some(output)) if output.len() == originals.len() => {
                    results.push((rule.name.as_str(), output));
                    continue;
                }
                Ok(None) => continue,
                Ok(Some(output)) => FailureReason::LengthMismatch {
                    expected: originals.len(),
                    actual: output.len(),
                },
                Err(e) => FailureReason::Failed(e.to_string()),
            };

            warn!(rule = %rule.name, path = %file.path, %reason, "ignoring rule output");
            evaluation.failures.push(RuleFailure {
                rule: rule.name.clone(),
                path: file.path.clone(),
                reason,
            });
        }

        let lines: Vec<LineSuggestions> = file
            .added_lines
            .iter()
            .enumerate()
            .filter_map(|(i, line)| {
                let suggestions: Vec<RuleSuggestion> = results
                    .iter()
                    .filter(|(_, output)| output[i] != line.text)
                    .map(|(name, output)| RuleSuggestion {
                        rule_name: name.to_string(),
                        suggested: output[i].clone(),
                    })
                    .collect();

                (!suggestions.is_empty()).then(|| LineSuggestions {
                    line_number: line.line_number,
                    original: line.text.clone(),
                    suggestions,
                })
            })
            .collect();

        if !lines.is_empty() {
            debug!(path = %file.path, lines = lines.len(), "suggestions found");
            evaluation.suggestions.push(FileSuggestions {
                path: file.path.clone(),
                safe_to_patch: file.safe_to_patch,
                lines,
            });
        }
    }

    evaluation
}
