//! Line-oriented [`Prompter`] for a terminal.

use crate::prompt::{Answer, Prompter, PromptError, Question, QuestionKind};
use std::io::{BufRead, Write};
use tracing::trace;

/// Asks questions on `output` and reads numbered answers from `input`.
pub struct TerminalPrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalPrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Read one line without its terminator; `None` at end of input
    fn read_line(&mut self) -> Result<Option<String>, PromptError> {
        let mut line = String::new();
        let read = self.input.read_line(&mut line).map_err(input_failed)?;
        if read == 0 {
            return Ok(None);
        }
        trace!(answer = %line.trim_end(), "read answer");
        Ok(Some(line.trim().to_string()))
    }

    fn choose(&mut self, question: &Question) -> Result<Answer, PromptError> {
        let count = question.choices.len();
        loop {
            writeln!(self.output, "\n{}\n", question.message).map_err(input_failed)?;
            for (i, choice) in question.choices.iter().enumerate() {
                writeln!(self.output, "  {}) {}", i + 1, choice.label).map_err(input_failed)?;
            }
            write!(self.output, "> ").map_err(input_failed)?;
            self.output.flush().map_err(input_failed)?;

            let Some(line) = self.read_line()? else {
                return Err(end_of_input());
            };

            match line.parse::<usize>() {
                Ok(n) if (1..=count).contains(&n) => {
                    return Ok(Answer::Choice(question.choices[n - 1].label.clone()));
                }
                _ => writeln!(self.output, "Enter a number from 1 to {count}.")
                    .map_err(input_failed)?,
            }
        }
    }

    fn toggle(&mut self, question: &Question) -> Result<Answer, PromptError> {
        let count = question.choices.len();
        let mut checked: Vec<bool> = question
            .choices
            .iter()
            .map(|c| c.checked.unwrap_or(false))
            .collect();

        loop {
            writeln!(self.output, "\n{}\n", question.message).map_err(input_failed)?;
            for (i, choice) in question.choices.iter().enumerate() {
                let mark = if checked[i] { 'x' } else { ' ' };
                writeln!(self.output, "  {}) [{mark}] {}", i + 1, choice.label)
                    .map_err(input_failed)?;
            }
            write!(self.output, "Numbers to toggle, empty line to confirm > ")
                .map_err(input_failed)?;
            self.output.flush().map_err(input_failed)?;

            let Some(line) = self.read_line()? else {
                return Err(end_of_input());
            };
            if line.is_empty() {
                return Ok(Answer::Selection(
                    (0..count).filter(|&i| checked[i]).collect(),
                ));
            }

            match parse_toggles(&line, count) {
                Some(indices) => {
                    for i in indices {
                        checked[i] = !checked[i];
                    }
                }
                None => writeln!(
                    self.output,
                    "Enter numbers from 1 to {count} separated by spaces."
                )
                .map_err(input_failed)?,
            }
        }
    }
}

impl<R: BufRead, W: Write> Prompter for TerminalPrompter<R, W> {
    fn ask(&mut self, question: &Question) -> Result<Answer, PromptError> {
        match question.kind {
            QuestionKind::Choose => self.choose(question),
            QuestionKind::Toggle => self.toggle(question),
        }
    }
}

/// `"1 3,4"` → `[0, 2, 3]`; `None` if any token is not a valid item number
fn parse_toggles(line: &str, count: usize) -> Option<Vec<usize>> {
    line.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(|token| match token.parse::<usize>() {
            Ok(n) if (1..=count).contains(&n) => Some(n - 1),
            _ => None,
        })
        .collect()
}

fn input_failed(e: std::io::Error) -> PromptError {
    PromptError::InputFailed {
        message: e.to_string(),
    }
}

fn end_of_input() -> PromptError {
    PromptError::InputFailed {
        message: "end of input".to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::prompt::Choice;
    use similar_asserts::assert_eq;
    use std::io::Cursor;

    fn question(kind: QuestionKind, labels: &[&str], checked: Option<bool>) -> Question {
        Question {
            kind,
            message: "Pick one".to_string(),
            choices: labels
                .iter()
                .map(|label| Choice {
                    label: label.to_string(),
                    checked,
                })
                .collect(),
            suggestions: Vec::new(),
        }
    }

    fn ask(input: &str, question: &Question) -> (Result<Answer, PromptError>, String) {
        let mut output = Vec::new();
        let result =
            TerminalPrompter::new(Cursor::new(input.to_string()), &mut output).ask(question);
        (result, String::from_utf8(output).unwrap())
    }

    #[test]
    fn choose_by_number() {
        let q = question(QuestionKind::Choose, &["continue", "cancel"], None);
        let (answer, output) = ask("2\n", &q);
        assert_eq!(answer.unwrap(), Answer::Choice("cancel".to_string()));
        assert_eq!(output, "\nPick one\n\n  1) continue\n  2) cancel\n> ");
    }

    #[test]
    fn invalid_choice_asks_again() {
        let q = question(QuestionKind::Choose, &["continue", "cancel"], None);
        let (answer, output) = ask("9\nyes\n1\n", &q);
        assert_eq!(answer.unwrap(), Answer::Choice("continue".to_string()));
        assert_eq!(output.matches("Enter a number from 1 to 2.").count(), 2);
    }

    #[test]
    fn end_of_input_fails() {
        let q = question(QuestionKind::Choose, &["continue"], None);
        let (answer, _) = ask("", &q);
        assert!(matches!(answer, Err(PromptError::InputFailed { .. })));
    }

    #[test]
    fn toggle_then_confirm() {
        let q = question(QuestionKind::Toggle, &["a", "b", "c"], Some(true));
        let (answer, output) = ask("2\n1, 2\n\n", &q);
        assert_eq!(answer.unwrap(), Answer::Selection(vec![1, 2]));
        assert!(output.contains("  2) [ ] b"));
    }

    #[test]
    fn toggle_starts_from_checked_state() {
        let q = question(QuestionKind::Toggle, &["a", "b"], Some(false));
        let (answer, _) = ask("\n", &q);
        assert_eq!(answer.unwrap(), Answer::Selection(vec![]));
    }

    #[test]
    fn bad_toggle_is_ignored() {
        let q = question(QuestionKind::Toggle, &["a", "b"], Some(true));
        let (answer, output) = ask("1 5\n\n", &q);
        assert_eq!(answer.unwrap(), Answer::Selection(vec![0, 1]));
        assert!(output.contains("Enter numbers from 1 to 2"));
    }

    #[test]
    fn toggle_tokens() {
        assert_eq!(parse_toggles("1 3,4", 4), Some(vec![0, 2, 3]));
        assert_eq!(parse_toggles("0", 4), None);
        assert_eq!(parse_toggles("x", 4), None);
    }
}
