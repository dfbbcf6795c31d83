use crate::{
    shell::status::Status,
    sys::{self, Pid, WaitStatus},
};
use log::{debug, warn};
use nix::errno::Errno;

/// A launched stage, owned by the coordinator until it is reaped or detached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProcessHandle {
    pub pid:       Pid,
    pub pipeline:  usize,
    pub stage:     usize,
    pub must_wait: bool,
}

/// How a waited-for stage ended.
///
/// `pid` is `None` for a stage that failed before it could be forked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ExitReport {
    pub pid:      Option<Pid>,
    pub pipeline: usize,
    pub stage:    usize,
    pub status:   Status,
}

/// Everything a line left behind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Completion {
    /// Exit reports of waited stages, in line order.
    pub waited:   Vec<ExitReport>,
    /// Parallel stages that were never waited for.
    pub detached: Vec<Pid>,
}

impl Completion {
    /// Status of the last waited stage of the line, or success if there was none.
    pub fn last_status(&self) -> Status {
        self.waited.last().map_or(Status::SUCCESS, |report| report.status)
    }
}

/// Waits for `pid`, skipping any non-terminal status.
fn reap(pid: Pid) -> Status {
    loop {
        match sys::wait_for_child(pid) {
            Ok(status) => match Status::from_wait_status(status) {
                Some(status) => break status,
                None => continue,
            },
            Err(why) => {
                warn!("unable to wait for {}: {}", pid, why);
                break Status::FALSE;
            }
        }
    }
}

/// Collects the handles of one line and decides which of them to wait for.
#[derive(Debug, Default)]
pub struct Coordinator {
    pending:    Vec<ProcessHandle>,
    completion: Completion,
}

impl Coordinator {
    pub fn new() -> Self { Coordinator::default() }

    /// Takes ownership of a launched stage. Parallel stages are detached at once.
    pub fn track(&mut self, handle: ProcessHandle) {
        if handle.must_wait {
            self.pending.push(handle);
        } else {
            debug!("detached {} (pipeline {}, stage {})", handle.pid, handle.pipeline, handle.stage);
            self.completion.detached.push(handle.pid);
        }
    }

    /// Records a stage that never reached `fork`.
    pub fn record(&mut self, pipeline: usize, stage: usize, status: Status) {
        self.completion.waited.push(ExitReport { pid: None, pipeline, stage, status });
    }

    /// Reaps every pending handle exactly once.
    pub fn wait_all(&mut self) {
        for handle in self.pending.drain(..) {
            let status = reap(handle.pid);
            debug!("reaped {} with status {}", handle.pid, status);
            self.completion.waited.push(ExitReport {
                pid: Some(handle.pid),
                pipeline: handle.pipeline,
                stage: handle.stage,
                status,
            });
        }
    }

    /// Gives up on the pending handles without waiting for them, returning
    /// every pid that is still alive as far as the line is concerned.
    pub fn abandon(mut self) -> Vec<Pid> {
        let mut pids = self.completion.detached;
        pids.extend(self.pending.drain(..).map(|handle| handle.pid));
        pids
    }

    pub fn finish(mut self) -> Completion {
        self.wait_all();
        self.completion.waited.sort_by_key(|report| (report.pipeline, report.stage));
        self.completion
    }
}

/// Forgets the detached children that already terminated.
pub fn reap_detached(pids: &mut Vec<Pid>) {
    pids.retain(|&pid| match sys::try_wait(pid) {
        Ok(WaitStatus::StillAlive) => true,
        Ok(status) => match Status::from_wait_status(status) {
            Some(code) => {
                debug!("detached process {} exited with status {}", pid, code);
                false
            }
            None => true,
        },
        Err(Errno::ECHILD) => false,
        Err(why) => {
            warn!("unable to poll detached process {}: {}", pid, why);
            false
        }
    });
}
