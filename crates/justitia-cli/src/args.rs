use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "justitia",
    version,
    about = "Validate compiled policy rules against labeled test cases"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug logging (overridden by JUSTITIA_LOG)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a test suite against a policy
    Test(TestArgs),

    /// Load and compile a policy without running any cases
    Check {
        /// Policy JSON file
        #[arg(long, short)]
        policy: PathBuf,

        #[command(flatten)]
        matching: MatchArgs,
    },
}

#[derive(Debug, ClapArgs)]
pub struct TestArgs {
    /// Policy JSON file
    #[arg(long, short)]
    pub policy: PathBuf,

    /// Test cases JSON file
    #[arg(long, short)]
    pub cases: PathBuf,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,

    /// Write output to a file instead of stdout
    #[arg(long, short)]
    pub out: Option<PathBuf>,

    /// Worker threads (defaults to available CPUs)
    #[arg(long, conflicts_with = "sequential")]
    pub threads: Option<NonZeroUsize>,

    /// Evaluate cases one at a time on the main thread
    #[arg(long)]
    pub sequential: bool,

    #[command(flatten)]
    pub matching: MatchArgs,
}

#[derive(Debug, ClapArgs)]
pub struct MatchArgs {
    /// Match patterns case-sensitively
    #[arg(long)]
    pub case_sensitive: bool,

    /// Let `^` and `$` match only at the start and end of the text
    #[arg(long)]
    pub single_line: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}
