use crate::{
    cli::Cli,
    config::Config,
    dispatch::{CommandExecutor, DispatchConfig, DispatchSummary, Dispatcher, ShellExecutor},
    error::Error,
    logging::{format_error_chain, init_logging},
    scan::{DirectoryLister, FsDirectoryLister},
    segments::{filter_segments, plan_segments},
    template::CommandTemplate,
};
use dotenv::dotenv;
use std::io::{self, Write};
use std::path::Path;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Lifecycle of one run. `Completed` and `Aborted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Scanning,
    Filtering,
    Ordering,
    Idle,
    Dispatching,
    Completed,
    Aborted,
}

impl RunState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scanning => "scanning",
            Self::Filtering => "filtering",
            Self::Ordering => "ordering",
            Self::Idle => "idle",
            Self::Dispatching => "dispatching",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        }
    }
}

fn enter(state: RunState) {
    debug!(
        event = "state_transition",
        state = state.as_str(),
        "entering {}",
        state.as_str()
    );
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Fewer than two segments; the only candidate is the frontier.
    Idle { segments: usize },
    Processed(DispatchSummary),
}

/// Merges CLI flags into the dispatcher configuration. The queue holds one pending
/// item per worker unless overridden.
pub fn resolve_dispatch_config(args: &Cli) -> DispatchConfig {
    let worker_count = args.workers.max(1);
    DispatchConfig {
        worker_count,
        queue_capacity: args.queue_capacity.unwrap_or(worker_count).max(1),
        dry_run: args.dry_run,
    }
}

/// Scans `xlog_dir`, picks the safe segments and hands them to `dispatcher`.
pub async fn process_xlog_dir<L, E, W>(
    xlog_dir: &Path,
    process_command: &str,
    lister: &L,
    dispatcher: &Dispatcher<E>,
    out: &mut W,
) -> Result<RunOutcome, Error>
where
    L: DirectoryLister,
    E: CommandExecutor + 'static,
    W: Write,
{
    let result = run_states(xlog_dir, process_command, lister, dispatcher, out).await;
    match &result {
        Ok(_) => enter(RunState::Completed),
        Err(_) => enter(RunState::Aborted),
    }
    result
}

async fn run_states<L, E, W>(
    xlog_dir: &Path,
    process_command: &str,
    lister: &L,
    dispatcher: &Dispatcher<E>,
    out: &mut W,
) -> Result<RunOutcome, Error>
where
    L: DirectoryLister,
    E: CommandExecutor + 'static,
    W: Write,
{
    enter(RunState::Scanning);
    let names = lister.list(xlog_dir).map_err(|source| Error::Listing {
        dir: xlog_dir.to_path_buf(),
        source,
    })?;

    enter(RunState::Filtering);
    let entries = names.len();
    let segments = filter_segments(names);
    debug!(
        event = "segments_filtered",
        entries,
        segments = segments.len(),
        "filtered directory listing"
    );

    enter(RunState::Ordering);
    let segment_count = segments.len();
    let Some(plan) = plan_segments(segments)? else {
        enter(RunState::Idle);
        info!(
            event = "nothing_to_do",
            segments = segment_count,
            "fewer than two segments, nothing to process"
        );
        return Ok(RunOutcome::Idle {
            segments: segment_count,
        });
    };

    let template = CommandTemplate::parse(process_command)?;

    enter(RunState::Dispatching);
    info!(
        event = "segments_planned",
        eligible = plan.eligible.len(),
        frontier = %plan.frontier,
        dry_run = dispatcher.config().dry_run,
        "planned segment processing"
    );
    let summary = dispatcher.run(xlog_dir, &plan, &template, out).await?;

    Ok(RunOutcome::Processed(summary))
}

/// Cancels `shutdown` on the first SIGTERM or SIGINT.
async fn handle_shutdown_signals(shutdown: CancellationToken) {
    let (mut sigterm, mut sigint) =
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
            (Err(err), _) | (_, Err(err)) => {
                warn!(
                    event = "signal_handler_unavailable",
                    error = %err,
                    "could not register shutdown signal handlers"
                );
                return;
            }
        };

    tokio::select! {
        _ = sigterm.recv() => {
            info!("SIGTERM received, shutting down.");
        }
        _ = sigint.recv() => {
            info!("SIGINT received, shutting down.");
        }
    }

    shutdown.cancel();
}

/// Runs one pass over the xlog directory and returns the process exit status.
pub async fn run_xlog_processor(args: Cli) -> i32 {
    dotenv().ok();

    let logging_context = init_logging("xlog-processor", &args.log_level);
    let run_span = tracing::info_span!(
        "xlog_run",
        service = %logging_context.service,
        run_id = %logging_context.run_id,
        build_version = %logging_context.build_version,
        build_commit = %logging_context.build_commit
    );
    let _run_guard = run_span.enter();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(event = "config_invalid", error = %err, "invalid configuration");
            return 1;
        }
    };

    let dispatch_config = resolve_dispatch_config(&args);
    debug!(
        event = "run_starting",
        xlog_dir = %args.xlog_dir.display(),
        workers = dispatch_config.worker_count,
        queue_capacity = dispatch_config.queue_capacity,
        dry_run = dispatch_config.dry_run,
        shell = %config.shell,
        "starting xlog processing run"
    );

    let shutdown = CancellationToken::new();
    let signal_handle = tokio::spawn(handle_shutdown_signals(shutdown.clone()));

    let dispatcher = Dispatcher::new(ShellExecutor::new(config.shell), dispatch_config, shutdown);
    let mut stdout = io::stdout().lock();
    let result = process_xlog_dir(
        &args.xlog_dir,
        &args.process_command,
        &FsDirectoryLister,
        &dispatcher,
        &mut stdout,
    )
    .await;

    signal_handle.abort();

    match result {
        Ok(outcome) => {
            debug!(event = "run_complete", outcome = ?outcome, "run completed");
            0
        }
        Err(err) => {
            error!(
                event = "run_failed",
                error = %format_error_chain(&err),
                "xlog processing failed"
            );
            1
        }
    }
}
