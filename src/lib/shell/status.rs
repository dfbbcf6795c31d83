use crate::sys::{self, WaitStatus};
use std::fmt;

/// The exit status of a stage, in shell terms.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Status(i32);

impl Status {
    pub const COULD_NOT_EXEC: Self = Status(sys::COULD_NOT_EXEC);
    pub const FALSE: Self = Status(1);
    pub const NO_SUCH_COMMAND: Self = Status(sys::NO_SUCH_COMMAND);
    pub const SUCCESS: Self = Status(0);

    pub fn from_exit_code(code: i32) -> Self { Status(code) }

    /// Translates what `waitpid` reported for a terminated child.
    pub fn from_wait_status(status: WaitStatus) -> Option<Self> {
        sys::exit_code(status).map(Status::from_exit_code)
    }

    /// Reports `err` on stderr and returns a generic failure.
    pub fn error<T: AsRef<str>>(err: T) -> Self {
        let err = err.as_ref();
        if !err.is_empty() {
            eprintln!("{}", err);
        }
        Status::FALSE
    }

    pub fn as_os_code(self) -> i32 { self.0 }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl From<std::io::Result<()>> for Status {
    fn from(res: std::io::Result<()>) -> Self {
        match res {
            Ok(_) => Status::SUCCESS,
            Err(err) => Status::error(format!("mish: {}", err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sys::Pid;
    use nix::sys::signal::Signal;

    #[test]
    fn wait_statuses() {
        let pid = Pid::from_raw(42);
        assert_eq!(Status::from_wait_status(WaitStatus::Exited(pid, 0)), Some(Status::SUCCESS));
        assert_eq!(
            Status::from_wait_status(WaitStatus::Exited(pid, 127)),
            Some(Status::NO_SUCH_COMMAND)
        );
        assert_eq!(
            Status::from_wait_status(WaitStatus::Signaled(pid, Signal::SIGTERM, false)),
            Some(Status::from_exit_code(143))
        );
        assert_eq!(Status::from_wait_status(WaitStatus::StillAlive), None);
    }
}
