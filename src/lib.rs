use error_set::error_set;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

pub mod apply;
pub mod config;
pub mod diff;
pub mod engine;
pub mod hook;
pub mod prompt;
pub mod repo;
pub mod rule;
pub mod staged;
pub mod suggestion;
pub mod terminal;

pub use apply::{ApplyError, apply_suggestions};
pub use config::ConfigError;
pub use engine::{Evaluation, RuleFailure};
pub use hook::HookError;
pub use prompt::{Answer, Disposition, PromptError, Prompter, Question, SelectionController};
pub use repo::{ExecutionError, Repository, RepositoryError};
pub use rule::{Rule, RuleContext, RuleError};
pub use staged::{AddedLine, StagedFile};
pub use suggestion::{FileSuggestions, PatchRequest, Suggestion};
pub use terminal::TerminalPrompter;

error_set! {
    /// Top-level error for stylish-commit operations
    StylishCommitError := {
        #[display("Failed to read {path}: {message}")]
        ReadFailed { path: String, message: String },
        #[display("Failed to write output: {message}")]
        OutputFailed { message: String },
        RepositoryError(RepositoryError),
        ExecutionError(ExecutionError),
        ConfigError(ConfigError),
        PromptError(PromptError),
        ApplyError(ApplyError),
        HookError(HookError),
    }
}

/// Whether the commit should go ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Commit,
    Abort,
}

/// Main interface: a repository plus the rules to check it with
pub struct StylishCommit {
    repo: Repository,
    rules: Vec<Rule>,
}

impl StylishCommit {
    pub fn new(repo: Repository, rules: Vec<Rule>) -> Self {
        Self { repo, rules }
    }

    /// Find the repository enclosing `start` and load its rules from `config`,
    /// or from `.stylish-commit.toml` at the repository root.
    ///
    /// # Examples
    /// ```no_run
    /// # use stylish_commit::StylishCommit;
    /// # use std::path::Path;
    /// let checker = StylishCommit::open(Path::new("."), None).unwrap();
    /// let evaluation = checker.evaluate().unwrap();
    /// ```
    pub fn open(start: &Path, config: Option<&Path>) -> Result<Self, StylishCommitError> {
        let repo = Repository::discover(start)?;
        let rules = match config {
            Some(path) => config::load(path)?,
            None => config::load(&repo.root().join(config::CONFIG_FILE))?,
        };
        info!(rules = rules.len(), root = %repo.root().display(), "loaded rules");
        Ok(Self::new(repo, rules))
    }

    /// Run every rule over the staged additions.
    pub fn evaluate(&self) -> Result<Evaluation, StylishCommitError> {
        let files = staged::staged_changes(&self.repo)?;
        Ok(engine::run(&files, &self.rules))
    }

    /// The pre-commit flow: evaluate, ask, then apply whatever was accepted.
    ///
    /// Accepted suggestions are written to the working tree and re-staged
    /// before returning.
    pub fn run<P: Prompter + ?Sized>(&self, prompter: &mut P) -> Result<Outcome, StylishCommitError> {
        let evaluation = self.evaluate()?;
        let disposition = SelectionController::new(&evaluation.suggestions).run(prompter)?;

        Ok(match disposition {
            Disposition::Ignored => Outcome::Commit,
            Disposition::Aborted => Outcome::Abort,
            Disposition::Apply {
                requests,
                abort_commit,
            } => {
                apply_suggestions(&self.repo, &requests)?;
                info!(applied = requests.len(), abort_commit, "applied suggestions");
                if abort_commit {
                    Outcome::Abort
                } else {
                    Outcome::Commit
                }
            }
        })
    }

    /// Run the rules over every line of `path` as if the whole file were
    /// staged and ask what to do. Nothing is written.
    pub fn check<P: Prompter + ?Sized>(
        &self,
        path: &Path,
        prompter: &mut P,
    ) -> Result<Disposition, StylishCommitError> {
        let content = fs::read_to_string(path).map_err(|e| StylishCommitError::ReadFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let file = StagedFile::whole_file(path.to_string_lossy(), &content);
        debug!(path = %file.path, lines = file.added_lines.len(), "checking whole file");

        let evaluation = engine::run(std::slice::from_ref(&file), &self.rules);
        Ok(SelectionController::new(&evaluation.suggestions).run(prompter)?)
    }
}
