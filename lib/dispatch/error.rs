use std::ffi::OsString;
use std::io;

use thiserror::Error;
use tokio::task::JoinError;

use crate::segments::SegmentName;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("process command for {segment} failed: {}", describe_exit(.code))]
    CommandFailed {
        segment: SegmentName,
        command: OsString,
        /// `None` when the shell was killed by a signal.
        code: Option<i32>,
        stderr: String,
    },

    #[error("could not start process command for {segment}")]
    Spawn {
        segment: SegmentName,
        #[source]
        source: io::Error,
    },

    #[error("dispatch interrupted before all segments were processed")]
    Interrupted,

    #[error("worker task failed")]
    WorkerJoin(#[from] JoinError),

    #[error("could not write dry-run output")]
    Output(#[from] io::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {code}"),
        None => "terminated by signal".to_string(),
    }
}
