use crate::command::ExitCode;
use log::{debug, warn};
use nix::errno::Errno;
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::Pid;

/// Processes forked for one pipeline launch, in stage order.
#[derive(Debug, Default)]
pub struct Job {
    processes: Vec<Pid>,
}

/// Final wait status of one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageStatus {
    pub pid: Pid,
    pub status: WaitStatus,
}

/// Every stage's status once a foreground job has been reaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub stages: Vec<StageStatus>,
}

impl JobReport {
    /// Status of the last stage, the one whose output reaches the terminal.
    pub fn last_status(&self) -> Option<WaitStatus> {
        self.stages.last().map(|stage| stage.status)
    }

    /// Exit code of the last stage.
    pub fn exit_code(&self) -> ExitCode {
        self.last_status().map(exit_code).unwrap_or(0)
    }

    /// Exit codes of all stages in stage order.
    pub fn exit_codes(&self) -> Vec<ExitCode> {
        self.stages.iter().map(|stage| exit_code(stage.status)).collect()
    }
}

impl Job {
    pub fn push(&mut self, pid: Pid) {
        self.processes.push(pid);
    }

    /// The first stage's process id, reported for background jobs.
    pub fn leader(&self) -> Option<Pid> {
        self.processes.first().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    pub fn pids(&self) -> &[Pid] {
        &self.processes
    }

    /// Blocks until every process in the job has terminated.
    ///
    /// Waits on each process id in turn; a stage that exits early is simply
    /// reaped when its turn comes, so no terminated child is left behind.
    /// A failed wait does not stop the others; the first error is returned
    /// once every process has been tried.
    pub fn wait(self) -> nix::Result<JobReport> {
        let mut stages = Vec::with_capacity(self.processes.len());
        let mut first_error = None;
        for pid in self.processes {
            match wait_for(pid) {
                Ok(status) => {
                    debug!("reaped {}: {:?}", pid, status);
                    stages.push(StageStatus { pid, status });
                }
                Err(e) => {
                    warn!("cannot wait for {}: {}", pid, e);
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(JobReport { stages }),
        }
    }
}

/// `waitpid` until `pid` has terminated, retrying on `EINTR`.
fn wait_for(pid: Pid) -> nix::Result<WaitStatus> {
    loop {
        match waitpid(pid, None) {
            Ok(status @ (WaitStatus::Exited(..) | WaitStatus::Signaled(..))) => return Ok(status),
            Ok(_) | Err(Errno::EINTR) => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Maps a wait status to a shell exit code: the exit code, or `128 + signal`.
pub fn exit_code(status: WaitStatus) -> ExitCode {
    match status {
        WaitStatus::Exited(_, code) => code,
        WaitStatus::Signaled(_, signal, _) => 128 + signal as i32,
        _ => -1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::sys::signal::Signal;

    fn report(codes: &[WaitStatus]) -> JobReport {
        JobReport {
            stages: codes
                .iter()
                .map(|&status| StageStatus {
                    pid: Pid::from_raw(1),
                    status,
                })
                .collect(),
        }
    }

    #[test]
    fn exit_code_mapping() {
        let pid = Pid::from_raw(42);
        assert_eq!(exit_code(WaitStatus::Exited(pid, 3)), 3);
        assert_eq!(exit_code(WaitStatus::Signaled(pid, Signal::SIGKILL, false)), 137);
        assert_eq!(exit_code(WaitStatus::StillAlive), -1);
    }

    #[test]
    fn report_uses_last_stage() {
        let pid = Pid::from_raw(1);
        let report = report(&[WaitStatus::Exited(pid, 1), WaitStatus::Exited(pid, 0)]);
        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.exit_codes(), vec![1, 0]);
        assert_eq!(report.last_status(), Some(WaitStatus::Exited(pid, 0)));
    }

    #[test]
    fn failed_wait_still_reaps_the_rest() {
        use nix::sys::wait::WaitPidFlag;
        use std::process::Command;

        let child = Command::new("true").spawn().unwrap();
        let real = Pid::from_raw(child.id() as i32);

        let mut job = Job::default();
        // Not a child of this process: waitpid fails with ECHILD.
        job.push(Pid::from_raw(i32::MAX));
        job.push(real);

        assert_eq!(job.wait(), Err(Errno::ECHILD));
        assert_eq!(waitpid(real, Some(WaitPidFlag::WNOHANG)), Err(Errno::ECHILD));
    }

    #[test]
    fn empty_job() {
        let job = Job::default();
        assert!(job.is_empty());
        assert_eq!(job.leader(), None);
        assert_eq!(job.wait().unwrap().exit_code(), 0);
    }
}
