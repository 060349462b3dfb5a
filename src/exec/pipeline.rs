//! Forks one process per pipeline stage and wires them together.

use super::fd::{Handle, PipeSet};
use super::job::{Job, JobReport};
use crate::command::{EXIT_NOT_FOUND, ExitCode};
use crate::parser::{Command, Pipeline};
use crate::signals;
use log::debug;
use nix::libc;
use nix::unistd::{ForkResult, Pid, execvp, fork};
use std::ffi::{CString, NulError};
use std::io::{self, Write};
use std::path::Path;
use thiserror::Error;

/// Exit code of a child whose redirection could not be set up.
const EXIT_REDIRECT_FAILED: ExitCode = 1;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("cannot create pipe: {0}")]
    Pipe(#[source] nix::Error),
    #[error("cannot fork: {0}")]
    Fork(#[source] nix::Error),
    #[error("argument contains a NUL byte: {0}")]
    Argument(#[from] NulError),
    #[error("cannot wait for child: {0}")]
    Wait(#[source] nix::Error),
}

/// What the parent holds once a pipeline has been launched.
#[derive(Debug)]
pub enum Launched {
    /// The foreground job ran to completion.
    Foreground(JobReport),
    /// A background job was detached; the leading process id.
    Background(Pid),
}

/// Launches `pipeline`, waiting for it unless it is a background job.
///
/// `in_child` is consulted in each forked child before `exec`: returning
/// `Some(code)` means the stage was handled in-process (a built-in inside a
/// pipeline) and the child exits with `code`.
pub fn launch<F>(pipeline: &Pipeline, mut in_child: F) -> Result<Launched, LaunchError>
where
    F: FnMut(&Command) -> Option<ExitCode>,
{
    let argvs = pipeline
        .commands
        .iter()
        .map(|stage| to_cstrings(&stage.argv))
        .collect::<Result<Vec<_>, _>>()?;

    let mut pipes = PipeSet::new(pipeline.len().saturating_sub(1)).map_err(LaunchError::Pipe)?;
    let mut job = Job::default();
    let mut fork_error = None;

    // Buffered output would otherwise be flushed once per child.
    let _ = io::stdout().flush();
    let _ = io::stderr().flush();

    for (idx, (stage, argv)) in pipeline.commands.iter().zip(&argvs).enumerate() {
        // SAFETY: the interpreter is single-threaded; the child only rewires
        // descriptors and execs (or runs a built-in) before `_exit`.
        match unsafe { fork() } {
            Ok(ForkResult::Parent { child }) => {
                debug!("forked {} for stage {}: {:?}", child, idx, stage.argv);
                job.push(child);
            }
            Ok(ForkResult::Child) => {
                let pipes = std::mem::take(&mut pipes);
                run_child(idx, stage, argv, pipes, pipeline.is_background, &mut in_child);
            }
            Err(e) => {
                fork_error = Some(e);
                break;
            }
        }
    }

    // Parent keeps no pipe ends: readers see EOF once all writers exit.
    drop(pipes);

    if pipeline.is_background {
        if let Some(e) = fork_error {
            return Err(LaunchError::Fork(e));
        }
        return match job.leader() {
            Some(leader) => Ok(Launched::Background(leader)),
            None => Ok(Launched::Foreground(JobReport { stages: Vec::new() })),
        };
    }

    // Stages forked before a failure are still reaped.
    let report = job.wait().map_err(LaunchError::Wait)?;
    match fork_error {
        Some(e) => Err(LaunchError::Fork(e)),
        None => Ok(Launched::Foreground(report)),
    }
}

fn to_cstrings(argv: &[String]) -> Result<Vec<CString>, NulError> {
    argv.iter().map(|arg| CString::new(arg.as_bytes())).collect()
}

/// Body of a forked stage. Never returns.
fn run_child<F>(
    idx: usize,
    stage: &Command,
    argv: &[CString],
    pipes: PipeSet,
    background: bool,
    in_child: &mut F,
) -> !
where
    F: FnMut(&Command) -> Option<ExitCode>,
{
    signals::reset_for_child(background);

    // Closes both ends of every pipe this stage does not read or write.
    if let Err(e) = pipes.wire_stage(idx) {
        child_exit(stage.program(), &e, EXIT_REDIRECT_FAILED);
    }

    if let Err((path, e)) = redirect(stage) {
        child_exit(&path.display().to_string(), &e, EXIT_REDIRECT_FAILED);
    }

    if let Some(code) = in_child(stage) {
        let _ = io::stdout().flush();
        exit_now(code);
    }

    let Some(program) = argv.first() else {
        exit_now(0);
    };
    let err = match execvp(program, argv) {
        Err(errno) => io::Error::from(errno),
        Ok(never) => match never {},
    };
    child_exit(stage.program(), &err, EXIT_NOT_FOUND);
}

/// Applies the stage's own file redirections on top of any pipe wiring.
fn redirect(stage: &Command) -> Result<(), (&Path, io::Error)> {
    if let Some(path) = &stage.input {
        Handle::open_input(path)
            .and_then(|handle| handle.install_as(libc::STDIN_FILENO))
            .map_err(|e| (path.as_path(), e))?;
    }
    if let Some(path) = &stage.output {
        Handle::open_output(path, stage.append)
            .and_then(|handle| handle.install_as(libc::STDOUT_FILENO))
            .map_err(|e| (path.as_path(), e))?;
    }
    Ok(())
}

fn child_exit(what: &str, err: &io::Error, code: ExitCode) -> ! {
    let _ = writeln!(io::stderr(), "liteshell: {what}: {err}");
    exit_now(code)
}

fn exit_now(code: ExitCode) -> ! {
    // SAFETY: `_exit` skips atexit handlers and stdio buffers that belong to
    // the parent.
    unsafe { libc::_exit(code) }
}
