use std::collections::HashSet;
use std::ffi::OsStr;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::Semaphore;

use super::{CommandExecutor, CommandOutput};
use crate::segments::{filter_segments, plan_segments, SegmentPlan};

/// Builds a plan over `count` consecutive segments on timeline 1.
pub(super) fn sequential_plan(count: usize) -> SegmentPlan {
    let names: Vec<String> = (1..=count)
        .map(|n| format!("00000001{:016X}", n))
        .collect();
    plan_segments(filter_segments(&names))
        .expect("sequential names are unique")
        .expect("at least two segments")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Behavior {
    Succeed,
    Fail { code: i32 },
    SpawnError,
    /// Never finishes; only cancellation gets a worker out of it.
    Hang,
}

/// Executor that records every command it is asked to run and answers according to
/// substring rules. Commands that match no rule succeed.
#[derive(Default)]
pub(super) struct ScriptedExecutor {
    rules: Vec<(String, Behavior)>,
    delay: Duration,
    gate: Option<Arc<Semaphore>>,
    executed: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    pub(super) fn with_rule(mut self, needle: &str, behavior: Behavior) -> Self {
        self.rules.push((needle.to_string(), behavior));
        self
    }

    pub(super) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Every command waits for a permit from `gate` before answering.
    pub(super) fn with_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub(super) fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .expect("executed mutex poisoned")
            .clone()
    }

    pub(super) fn executed_set(&self) -> HashSet<String> {
        self.executed().into_iter().collect()
    }

    fn behavior_for(&self, command: &str) -> Behavior {
        self.rules
            .iter()
            .find(|(needle, _)| command.contains(needle.as_str()))
            .map(|(_, behavior)| *behavior)
            .unwrap_or(Behavior::Succeed)
    }
}

impl CommandExecutor for ScriptedExecutor {
    fn execute<'a>(&'a self, command: &'a OsStr) -> BoxFuture<'a, io::Result<CommandOutput>> {
        Box::pin(async move {
            let command = command.to_string_lossy().into_owned();
            self.executed
                .lock()
                .expect("executed mutex poisoned")
                .push(command.clone());

            if let Some(gate) = &self.gate {
                gate.acquire().await.expect("gate closed").forget();
            }
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            match self.behavior_for(&command) {
                Behavior::Succeed => Ok(CommandOutput {
                    code: Some(0),
                    stderr: Vec::new(),
                }),
                Behavior::Fail { code } => Ok(CommandOutput {
                    code: Some(code),
                    stderr: format!("{command}: failed\n").into_bytes(),
                }),
                Behavior::SpawnError => Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    "shell not found",
                )),
                Behavior::Hang => futures::future::pending().await,
            }
        })
    }
}
