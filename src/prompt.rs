//! The interactive selection protocol.
//!
//! [`SelectionController`] asks one [`Question`] at a time through a
//! [`Prompter`] and ends in a [`Disposition`]. The only state carried between
//! questions is the set of suggestions the user chose to ignore; everything
//! shown is recomputed from the flattened suggestion list on every question.
//!
//! ```text
//!            ┌──────── select ────────┐
//!            ▼                        │
//! start ─▶ Main ─── apply ──▶ ConfirmApply ─▶ Done(Apply | Ignored | Aborted)
//!            │
//!            └── continue / cancel ──▶ Done(Ignored | Aborted)
//! ```

use crate::suggestion::{
    DiffSegment, FileSuggestions, InlineDiff, PatchRequest, Suggestion, flatten,
};
use error_set::error_set;
use std::collections::BTreeSet;
use tracing::debug;

error_set! {
    /// Errors from the interaction layer
    PromptError := {
        #[display("Unexpected response: {response}")]
        UnexpectedResponse { response: String },
        #[display("Failed to read answer: {message}")]
        InputFailed { message: String },
    }
}

const IGNORE_CHANGES: &str = "continue (ignores suggestions)";
const SELECT_CHANGES: &str = "select suggestions to apply";
const COMMIT_ONLY: &str = "commit only (ignores suggestions)";
const CANCEL: &str = "cancel";

const SELECT_MESSAGE: &str = "Select suggestions to apply (toggle, then confirm to go back):";
const CONFIRM_MESSAGE: &str = "Applying suggestions is an experimental feature. It is highly \
recommended you check the changes before committing them.\n\nHow do you wish to proceed?";

/// How the user answers a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    /// Pick exactly one choice by label
    Choose,
    /// Check any subset of the choices
    Toggle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub label: String,
    /// Initial state of the item; only set for [`QuestionKind::Toggle`]
    pub checked: Option<bool>,
}

/// Rendering data for one suggestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionView {
    pub rule_name: String,
    /// `path:line`
    pub location: String,
    pub diff: Vec<DiffSegment>,
    /// Whether the suggestion is currently selected, when selection is possible
    pub selected: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub kind: QuestionKind,
    pub message: String,
    pub choices: Vec<Choice>,
    pub suggestions: Vec<SuggestionView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Label of the chosen [`Choice`]
    Choice(String),
    /// Indices of the checked choices
    Selection(Vec<usize>),
}

/// Something that can put a question to the user and wait for the answer.
pub trait Prompter {
    fn ask(&mut self, question: &Question) -> Result<Answer, PromptError>;
}

/// Final outcome of the interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Commit without changes
    Ignored,
    /// Abort the commit
    Aborted,
    /// Apply `requests`, then commit unless `abort_commit`
    Apply {
        requests: Vec<PatchRequest>,
        abort_commit: bool,
    },
}

enum State {
    Main,
    Select,
    ConfirmApply,
    Done(Disposition),
}

/// Drives the question/answer protocol over a fixed set of suggestions.
pub struct SelectionController {
    suggestions: Vec<Suggestion>,
    can_apply: bool,
    ignored: BTreeSet<usize>,
}

impl SelectionController {
    pub fn new(files: &[FileSuggestions]) -> Self {
        Self {
            suggestions: flatten(files),
            can_apply: files.iter().all(|f| f.safe_to_patch),
            ignored: BTreeSet::new(),
        }
    }

    /// Ask questions until the user reaches a final decision.
    ///
    /// # Errors
    ///
    /// [`PromptError::UnexpectedResponse`] if an answer is not one of the
    /// offered choices; any error from the prompter is passed through.
    pub fn run<P: Prompter + ?Sized>(mut self, prompter: &mut P) -> Result<Disposition, PromptError> {
        if self.suggestions.is_empty() {
            debug!("no suggestions, proceeding with ignore");
            return Ok(Disposition::Ignored);
        }

        let mut state = State::Main;
        loop {
            state = match state {
                State::Main => self.ask_main(prompter)?,
                State::Select => self.ask_select(prompter)?,
                State::ConfirmApply => self.ask_confirm(prompter)?,
                State::Done(disposition) => {
                    debug!(?disposition, "selection finished");
                    return Ok(disposition);
                }
            };
        }
    }

    /// Flattened suggestions minus the ignored ones, in flattened order
    fn selected(&self) -> Vec<&Suggestion> {
        self.suggestions
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.ignored.contains(i))
            .map(|(_, s)| s)
            .collect()
    }

    fn ask_main<P: Prompter + ?Sized>(&self, prompter: &mut P) -> Result<State, PromptError> {
        let apply = apply_label(self.selected().len());
        debug!(selected = self.selected().len(), "asking main question");

        let mut labels = vec![IGNORE_CHANGES.to_string()];
        if self.can_apply {
            labels.push(apply.clone());
            labels.push(SELECT_CHANGES.to_string());
        }
        labels.push(CANCEL.to_string());

        let question = self.choose(self.summary(), labels);
        let label = expect_choice(prompter.ask(&question)?, &question)?;

        Ok(match label.as_str() {
            IGNORE_CHANGES => State::Done(Disposition::Ignored),
            SELECT_CHANGES => State::Select,
            CANCEL => State::Done(Disposition::Aborted),
            _ if label == apply => State::ConfirmApply,
            _ => return Err(PromptError::UnexpectedResponse { response: label }),
        })
    }

    fn ask_select<P: Prompter + ?Sized>(&mut self, prompter: &mut P) -> Result<State, PromptError> {
        debug!("asking for suggestion selection");
        let views = self.views(false);
        let widths = column_widths(&views);
        let question = Question {
            kind: QuestionKind::Toggle,
            message: SELECT_MESSAGE.to_string(),
            choices: views
                .iter()
                .enumerate()
                .map(|(i, view)| Choice {
                    label: describe(view, widths),
                    checked: Some(!self.ignored.contains(&i)),
                })
                .collect(),
            suggestions: views,
        };

        let chosen = match prompter.ask(&question)? {
            Answer::Selection(indices) => indices,
            Answer::Choice(label) => {
                return Err(PromptError::UnexpectedResponse { response: label });
            }
        };

        let total = self.suggestions.len();
        if let Some(bad) = chosen.iter().find(|&&i| i >= total) {
            return Err(PromptError::UnexpectedResponse {
                response: format!("selection index {bad} out of range 0..{total}"),
            });
        }

        let chosen: BTreeSet<usize> = chosen.into_iter().collect();
        self.ignored = (0..total).filter(|i| !chosen.contains(i)).collect();
        debug!(selected = chosen.len(), ignored = self.ignored.len(), "selection updated");

        Ok(State::Main)
    }

    fn ask_confirm<P: Prompter + ?Sized>(&self, prompter: &mut P) -> Result<State, PromptError> {
        let selected = self.selected();
        let apply = apply_label(selected.len());
        let apply_and_cancel = format!("{apply} and cancel commit");
        let apply_and_commit = format!("{apply} and commit");
        debug!(selected = selected.len(), "asking apply confirmation");

        let question = self.choose(
            format!("{}\n\n{}", self.summary(), CONFIRM_MESSAGE),
            vec![
                apply_and_cancel.clone(),
                apply_and_commit.clone(),
                COMMIT_ONLY.to_string(),
                CANCEL.to_string(),
            ],
        );
        let label = expect_choice(prompter.ask(&question)?, &question)?;

        let requests = || -> Vec<PatchRequest> { selected.iter().map(|s| s.to_patch_request()).collect() };
        Ok(State::Done(match label.as_str() {
            COMMIT_ONLY => Disposition::Ignored,
            CANCEL => Disposition::Aborted,
            _ if label == apply_and_cancel => Disposition::Apply {
                requests: requests(),
                abort_commit: true,
            },
            _ if label == apply_and_commit => Disposition::Apply {
                requests: requests(),
                abort_commit: false,
            },
            _ => return Err(PromptError::UnexpectedResponse { response: label }),
        }))
    }

    fn choose(&self, message: String, labels: Vec<String>) -> Question {
        Question {
            kind: QuestionKind::Choose,
            message,
            choices: labels
                .into_iter()
                .map(|label| Choice {
                    label,
                    checked: None,
                })
                .collect(),
            suggestions: self.views(self.can_apply),
        }
    }

    fn views(&self, show_selected: bool) -> Vec<SuggestionView> {
        self.suggestions
            .iter()
            .enumerate()
            .map(|(i, s)| SuggestionView {
                rule_name: s.rule_name.clone(),
                location: s.location(),
                diff: s.diff(),
                selected: show_selected.then(|| !self.ignored.contains(&i)),
            })
            .collect()
    }

    /// Heading plus one line per suggestion
    fn summary(&self) -> String {
        let views = self.views(self.can_apply);
        let heading = if self.can_apply {
            "Suggested changes (can be automatically applied):"
        } else {
            "Suggested changes (can not be automatically applied):"
        };

        let widths = column_widths(&views);
        let mut lines = vec![heading.to_string()];
        lines.extend(views.iter().map(|view| format!("  {}", describe(view, widths))));
        lines.join("\n")
    }
}

/// `apply 1 suggestion`, `apply 3 suggestions`
fn apply_label(count: usize) -> String {
    let plural = if count == 1 { "" } else { "s" };
    format!("apply {count} suggestion{plural}")
}

/// Widest rule name and location, in characters
fn column_widths(views: &[SuggestionView]) -> (usize, usize) {
    views.iter().fold((0, 0), |(name, location), v| {
        (
            name.max(v.rule_name.chars().count()),
            location.max(v.location.chars().count()),
        )
    })
}

/// One aligned line: optional marker, rule name, location and inline diff
fn describe(view: &SuggestionView, (name_width, location_width): (usize, usize)) -> String {
    let marker = match view.selected {
        Some(true) => "(*) ",
        Some(false) => "( ) ",
        None => "",
    };
    format!(
        "{marker}[{:<name_width$}] {:<location_width$}  {}",
        view.rule_name,
        view.location,
        InlineDiff(&view.diff)
    )
}

/// Extract a label that is one of the question's choices
fn expect_choice(answer: Answer, question: &Question) -> Result<String, PromptError> {
    match answer {
        Answer::Choice(label) if question.choices.iter().any(|c| c.label == label) => Ok(label),
        Answer::Choice(label) => Err(PromptError::UnexpectedResponse { response: label }),
        Answer::Selection(indices) => Err(PromptError::UnexpectedResponse {
            response: format!("{indices:?}"),
        }),
    }
}
