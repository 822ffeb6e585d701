use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use stylish_commit::{
    Disposition, Outcome, Repository, StylishCommit, StylishCommitError, TerminalPrompter, hook,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stylish-commit")]
#[command(about = "Suggests style fixes for the lines you are about to commit")]
#[command(version)]
struct Cli {
    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check staged lines and offer fixes (run from the pre-commit hook)
    Run {
        /// Rule file (default: .stylish-commit.toml at the repository root)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Try the rules against every line of one file
    Check {
        file: PathBuf,
        /// Rule file (default: .stylish-commit.toml at the repository root)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Install the pre-commit hook in the current repository
    Install,
    /// Print shell completions
    Completions { shell: Shell },
    /// Print the man page
    Man,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match execute(cli.command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("stylish-commit: {e}");
            ExitCode::FAILURE
        }
    }
}

fn execute(command: Commands) -> Result<ExitCode, StylishCommitError> {
    match command {
        Commands::Run { config } => {
            let checker = StylishCommit::open(Path::new("."), config.as_deref())?;
            let mut prompter = TerminalPrompter::new(io::stdin().lock(), io::stderr());
            Ok(match checker.run(&mut prompter)? {
                Outcome::Commit => ExitCode::SUCCESS,
                Outcome::Abort => {
                    eprintln!("Commit cancelled.");
                    ExitCode::FAILURE
                }
            })
        }
        Commands::Check { file, config } => {
            let checker = StylishCommit::open(Path::new("."), config.as_deref())?;
            let mut prompter = TerminalPrompter::new(io::stdin().lock(), io::stderr());
            if let Disposition::Apply { requests, .. } = checker.check(&file, &mut prompter)? {
                eprintln!(
                    "Would apply {} suggestion(s); check mode does not modify files.",
                    requests.len()
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Install => {
            let repo = Repository::discover(Path::new("."))?;
            let path = hook::install(&repo)?;
            eprintln!("Pre-commit hook installed at {}", path.display());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "stylish-commit", &mut io::stdout());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Man => {
            clap_mangen::Man::new(Cli::command())
                .render(&mut io::stdout())
                .map_err(|e| StylishCommitError::OutputFailed {
                    message: e.to_string(),
                })?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Log to stderr; `RUST_LOG` wins over `-v`
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .with_target(false)
        .init();
}
