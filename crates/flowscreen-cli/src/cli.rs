use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "FlowScreen Developers",
    version,
    about = "FlowScreen CLI - Runs parametric reactor and distillation screening studies against a process-simulation engine and collects the results into one table.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the configured screening studies and export every case to a CSV file.
    Run(RunArgs),
    /// Show the properties a unit exposes and how a reactor would be bound to its reaction set.
    Inspect(InspectArgs),
}

/// Which of the configured studies a run should execute.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StudySelection {
    Reactor,
    Distillation,
    #[default]
    All,
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    // --- Core Arguments ---
    /// Path to the screening configuration file in TOML format.
    /// Built-in studies are used when omitted.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Path of the CSV file to write. Overwritten if it exists.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Restrict the run to one study.
    #[arg(long, value_enum, default_value_t = StudySelection::All)]
    pub study: StudySelection,

    /// Override the simulation engine backend.
    #[arg(short, long, value_name = "NAME")]
    pub backend: Option<String>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S reactor.temperatures=300,320
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `inspect` subcommand.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Kind of unit to create (pfr, shortcut-column, material-stream, energy-stream).
    #[arg(short, long, default_value = "pfr", value_name = "KIND")]
    pub kind: String,

    /// Only list properties whose name contains this text (case-insensitive).
    #[arg(short, long, value_name = "TEXT")]
    pub filter: Option<String>,

    /// Simulation engine backend to inspect.
    #[arg(short, long, default_value = "reference", value_name = "NAME")]
    pub backend: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_accepts_repeated_set_values() {
        let cli = Cli::parse_from([
            "flowscreen",
            "-vv",
            "run",
            "--study",
            "reactor",
            "-S",
            "reactor.volumes=1,2",
            "-S",
            "output.path=out.csv",
        ]);
        assert_eq!(cli.verbose, 2);
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.study, StudySelection::Reactor);
        assert_eq!(args.set_values.len(), 2);
        assert!(args.config.is_none());
    }

    #[test]
    fn inspect_defaults_to_reactor_on_reference_backend() {
        let cli = Cli::parse_from(["flowscreen", "inspect"]);
        let Commands::Inspect(args) = cli.command else {
            panic!("expected inspect command");
        };
        assert_eq!(args.kind, "pfr");
        assert_eq!(args.backend, "reference");
        assert!(args.filter.is_none());
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["flowscreen", "-q", "-v", "inspect"]).is_err());
    }
}
