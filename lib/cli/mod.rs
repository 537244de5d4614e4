use crate::build_info;
use clap::builder::RangedU64ValueParser;
use clap::error::ErrorKind;
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

const VERBS_HELP: &str = "\
In the process command, %p is replaced by the path to the file it should
process, %f is replaced by only the filename, and %% will be replaced with
a percent sign. The command should return a zero exit status only if it
succeeds.

The newest segment in XLOGDIR is never processed: pg_receivexlog may still be
writing it and needs it to know where to resume streaming.";

#[derive(Parser, Debug, Clone)]
#[command(
    name = "xlog-processor",
    about = "Processes files in an xlog archive populated by pg_receivexlog",
    version = build_info::VERSION_WITH_COMMIT,
    long_version = build_info::VERSION_WITH_COMMIT,
    after_help = VERBS_HELP
)]
pub struct Cli {
    #[arg(
        short = 'j',
        value_name = "WORKERS",
        default_value_t = 1,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    /// Number of files to process concurrently
    pub workers: usize,

    #[arg(long = "dryrun", default_value_t = false)]
    /// Dry run, show what the program would do
    pub dry_run: bool,

    #[arg(
        long = "queue-capacity",
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    /// Pending work items buffered ahead of the workers (default: WORKERS)
    pub queue_capacity: Option<usize>,

    #[arg(long = "log-level", default_value = "warn")]
    /// Log filter used when RUST_LOG is not set
    pub log_level: String,

    #[arg(value_name = "XLOGDIR")]
    /// Directory written by pg_receivexlog
    pub xlog_dir: PathBuf,

    #[arg(value_name = "PROCESS_COMMAND", allow_hyphen_values = true)]
    /// Command to run for every segment that is safe to process
    pub process_command: String,
}

pub fn parse_args() -> Result<Cli, clap::Error> {
    Cli::try_parse()
}

pub fn parse_args_from<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::try_parse_from(args)
}

/// Exit status for a parse result that did not produce a `Cli`: help and version are
/// successful exits, everything else is a usage error.
pub fn parse_error_exit_code(err: &clap::Error) -> i32 {
    match err.kind() {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => 0,
        _ => 1,
    }
}
