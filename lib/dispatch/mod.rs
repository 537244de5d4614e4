//! Runs the process command over the eligible segments of a plan.
//!
//! Dry runs print what would happen, in order, without touching the executor.
//! Live runs fan work items out to a fixed pool of workers through a bounded
//! queue; the first failure cancels everything else and is returned to the caller.

mod dry_run;
mod error;
mod executor;
mod supervisor;

pub use dry_run::print_plan;
pub use error::DispatchError;
pub use executor::{CommandExecutor, CommandOutput, ShellExecutor, DEFAULT_SHELL};
pub use supervisor::{DispatchProgress, Dispatcher};

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::segments::SegmentName;
use crate::template::CommandTemplate;

#[cfg(test)]
mod test_support;

/// Configuration for one dispatch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Number of concurrent workers. Always at least 1.
    pub worker_count: usize,
    /// Capacity of the bounded work queue between the producer and the workers.
    pub queue_capacity: usize,
    /// Print intended commands instead of running them.
    pub dry_run: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            worker_count: 1,
            queue_capacity: 1,
            dry_run: false,
        }
    }
}

/// Outcome of a dispatch run that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSummary {
    pub eligible: usize,
    /// Items handed to the queue (live) or printed (dry run).
    pub dispatched: usize,
    /// Commands that exited successfully. Always 0 for dry runs.
    pub completed: usize,
    pub frontier: SegmentName,
    pub dry_run: bool,
}

/// One segment and the command to run on it.
///
/// The command is kept as an `OsString` so a directory path that is not valid
/// UTF-8 reaches the shell byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub directory: PathBuf,
    pub segment: SegmentName,
    pub command: OsString,
}

impl WorkItem {
    pub fn new(directory: &Path, segment: &SegmentName, template: &CommandTemplate) -> Self {
        let full_path = directory.join(segment.as_str());
        let command = template.render_os(full_path.as_os_str(), segment.as_str());
        Self {
            directory: directory.to_path_buf(),
            segment: segment.clone(),
            command,
        }
    }
}
