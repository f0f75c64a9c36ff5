use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "logicgit",
    about = "Version control for rule executions",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Run as if started in this directory
    #[arg(short = 'C', long = "repo", global = true, default_value = ".")]
    pub repo: PathBuf,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize a new repository
    Init(InitArgs),
    /// Run a rule set against each record of a data file and commit the results
    Execute(ExecuteArgs),
    /// Show execution history
    Log(LogArgs),
    /// Show one stored execution with its audit trail
    Show(ShowArgs),
    /// Compare two executions
    Diff(DiffArgs),
    /// List or create branches
    Branch(BranchArgs),
    /// Switch to a different branch
    #[command(alias = "checkout")]
    Switch(SwitchArgs),
    /// Write a stored execution to a JSON file
    Export(ExportArgs),
    /// Get or set configuration
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct InitArgs {
    pub path: Option<PathBuf>,
}

#[derive(Args)]
pub struct ExecuteArgs {
    /// Rules file (.yaml, .yml, .json), looked up in the rules directory if not found as given
    pub rules: PathBuf,
    /// Data file (.json, .csv), looked up in the data directory if not found as given
    pub data: PathBuf,
    /// Commit message used for every record
    pub message: Option<String>,
    #[arg(short = 'm', long = "message", conflicts_with = "message")]
    pub message_flag: Option<String>,
}

impl ExecuteArgs {
    pub fn message(&self) -> Option<&str> {
        self.message_flag.as_deref().or(self.message.as_deref())
    }
}

#[derive(Args)]
pub struct LogArgs {
    pub branch: Option<String>,
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
    #[arg(long)]
    pub oneline: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Execution or commit hash prefix
    pub hash: String,
}

#[derive(Args)]
pub struct DiffArgs {
    pub from: String,
    pub to: String,
}

#[derive(Args)]
pub struct BranchArgs {
    pub name: Option<String>,
}

#[derive(Args)]
pub struct SwitchArgs {
    pub branch: String,
    #[arg(short = 'c', long)]
    pub create: bool,
}

#[derive(Args)]
pub struct ExportArgs {
    pub hash: String,
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct ConfigArgs {
    pub key: Option<String>,
    pub value: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_init() {
        let cli = Cli::try_parse_from(["logicgit", "init"]).unwrap();
        assert!(matches!(cli.command, Command::Init(_)));
        assert_eq!(cli.repo, PathBuf::from("."));
    }

    #[test]
    fn parse_execute_with_positional_message() {
        let cli = Cli::try_parse_from(["logicgit", "execute", "loan.yaml", "applicants.csv", "batch one"]).unwrap();
        if let Command::Execute(args) = cli.command {
            assert_eq!(args.rules, PathBuf::from("loan.yaml"));
            assert_eq!(args.data, PathBuf::from("applicants.csv"));
            assert_eq!(args.message(), Some("batch one"));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_execute_with_flag_message() {
        let cli = Cli::try_parse_from(["logicgit", "execute", "r.json", "d.json", "-m", "hi"]).unwrap();
        if let Command::Execute(args) = cli.command {
            assert_eq!(args.message(), Some("hi"));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn execute_message_given_twice_is_rejected() {
        assert!(Cli::try_parse_from(["logicgit", "execute", "r.json", "d.json", "a", "-m", "b"]).is_err());
    }

    #[test]
    fn parse_log_oneline() {
        let cli = Cli::try_parse_from(["logicgit", "log", "--oneline", "-n", "5", "feature"]).unwrap();
        if let Command::Log(args) = cli.command {
            assert!(args.oneline);
            assert_eq!(args.limit, Some(5));
            assert_eq!(args.branch, Some("feature".into()));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_diff() {
        let cli = Cli::try_parse_from(["logicgit", "diff", "a1b2", "c3d4"]).unwrap();
        if let Command::Diff(args) = cli.command {
            assert_eq!(args.from, "a1b2");
            assert_eq!(args.to, "c3d4");
        } else { panic!("wrong command"); }
    }

    #[test]
    fn checkout_is_an_alias_for_switch() {
        let cli = Cli::try_parse_from(["logicgit", "checkout", "-c", "feature"]).unwrap();
        if let Command::Switch(args) = cli.command {
            assert!(args.create);
            assert_eq!(args.branch, "feature");
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_export_output() {
        let cli = Cli::try_parse_from(["logicgit", "export", "a1b2", "-o", "out.json"]).unwrap();
        if let Command::Export(args) = cli.command {
            assert_eq!(args.output, Some(PathBuf::from("out.json")));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["logicgit", "log", "--verbose", "-C", "/tmp/repo", "--format", "json"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.repo, PathBuf::from("/tmp/repo"));
        assert!(matches!(cli.format, OutputFormat::Json));
    }
}
