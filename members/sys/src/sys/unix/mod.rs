use nix::{
    errno::Errno,
    fcntl::{self, FcntlArg, FdFlag, OFlag},
    libc,
    sys::wait::{self, WaitPidFlag},
    unistd,
};
use std::{ffi::CString, os::unix::io::RawFd};

pub use nix::{
    sys::wait::WaitStatus,
    unistd::{ForkResult, Pid},
};

pub const STDOUT_FILENO: i32 = libc::STDOUT_FILENO;
pub const STDERR_FILENO: i32 = libc::STDERR_FILENO;
pub const STDIN_FILENO: i32 = libc::STDIN_FILENO;

/// Exit status of a child whose program could not be found.
pub const NO_SUCH_COMMAND: i32 = 127;
/// Exit status of a child whose program was found but could not be executed.
pub const COULD_NOT_EXEC: i32 = 126;

/// Retries `func` for as long as it is interrupted by a signal.
fn retry<T, F: FnMut() -> nix::Result<T>>(mut func: F) -> nix::Result<T> {
    loop {
        match func() {
            Err(Errno::EINTR) => continue,
            result => break result,
        }
    }
}

/// Creates an anonymous pipe, returning `(reader, writer)`.
///
/// Both ends are close-on-exec, so a descriptor only survives an `exec` when it
/// has been duplicated onto one of the standard stream slots.
pub fn pipe() -> nix::Result<(RawFd, RawFd)> { unistd::pipe2(OFlag::O_CLOEXEC) }

/// Makes `new` refer to the file behind `old`, with close-on-exec cleared.
///
/// `dup2` leaves a descriptor duplicated onto itself untouched, so in that case
/// the flag is cleared directly.
pub fn dup2(old: RawFd, new: RawFd) -> nix::Result<RawFd> {
    if old == new {
        fcntl::fcntl(new, FcntlArg::F_SETFD(FdFlag::empty()))?;
        return Ok(new);
    }
    retry(|| unistd::dup2(old, new))
}

pub fn close(fd: RawFd) -> nix::Result<()> { unistd::close(fd) }

/// # Safety
///
/// Unless the parent is single-threaded, the child may only perform
/// async-signal-safe work before it either replaces its image or calls
/// `fork_exit`.
pub unsafe fn fork() -> nix::Result<ForkResult> { unistd::fork() }

/// Replaces the current process image, searching `PATH` for `argv[0]`.
///
/// Only returns on failure.
pub fn execvp(argv: &[CString]) -> Errno {
    match argv.first() {
        Some(program) => match unistd::execvp(program, argv) {
            Ok(never) => match never {},
            Err(why) => why,
        },
        None => Errno::ENOENT,
    }
}

/// Terminates a forked child without running the parent's atexit handlers or
/// flushing its copied stdio buffers.
pub fn fork_exit(exit_status: i32) -> ! { unsafe { libc::_exit(exit_status) } }

/// Writes every byte of `bytes` straight to `fd`, bypassing any buffering.
pub fn write_all(fd: RawFd, mut bytes: &[u8]) -> nix::Result<()> {
    while !bytes.is_empty() {
        let written = retry(|| unistd::write(fd, bytes))?;
        if written == 0 {
            return Err(Errno::EIO);
        }
        bytes = &bytes[written..];
    }
    Ok(())
}

/// Blocks until `pid` terminates.
pub fn wait_for_child(pid: Pid) -> nix::Result<WaitStatus> { retry(|| wait::waitpid(pid, None)) }

/// Collects the status of `pid` if it already terminated.
pub fn try_wait(pid: Pid) -> nix::Result<WaitStatus> {
    retry(|| wait::waitpid(pid, Some(WaitPidFlag::WNOHANG)))
}

/// Translates a terminal wait status into a shell exit code.
///
/// Returns `None` when the child has not terminated yet.
pub fn exit_code(status: WaitStatus) -> Option<i32> {
    match status {
        WaitStatus::Exited(_, code) => Some(code),
        WaitStatus::Signaled(_, signal, _) => Some(128 + signal as i32),
        _ => None,
    }
}

/// Human readable description of an error number.
pub fn strerror(errno: Errno) -> &'static str { errno.desc() }

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs::File, io::Read, os::unix::io::FromRawFd};

    #[test]
    fn pipe_round_trip() {
        let (reader, writer) = pipe().unwrap();
        write_all(writer, b"through the pipe").unwrap();
        close(writer).unwrap();
        let mut reader = unsafe { File::from_raw_fd(reader) };
        let mut buffer = String::new();
        reader.read_to_string(&mut buffer).unwrap();
        assert_eq!(buffer, "through the pipe");
    }

    #[test]
    fn pipe_is_close_on_exec() {
        use nix::fcntl::{fcntl, FcntlArg, FdFlag};
        let (reader, writer) = pipe().unwrap();
        for fd in &[reader, writer] {
            let flags = FdFlag::from_bits_truncate(fcntl(*fd, FcntlArg::F_GETFD).unwrap());
            assert!(flags.contains(FdFlag::FD_CLOEXEC));
            close(*fd).unwrap();
        }
    }

    #[test]
    fn dup2_onto_itself_keeps_descriptor_across_exec() {
        use nix::fcntl::{fcntl, FcntlArg, FdFlag};
        let (reader, writer) = pipe().unwrap();
        assert_eq!(dup2(reader, reader).unwrap(), reader);
        let flags = FdFlag::from_bits_truncate(fcntl(reader, FcntlArg::F_GETFD).unwrap());
        assert!(!flags.contains(FdFlag::FD_CLOEXEC));
        for fd in &[reader, writer] {
            close(*fd).unwrap();
        }
    }

    #[test]
    fn exec_of_missing_program_reports_enoent() {
        let argv = [CString::new("mish-sys-definitely-not-a-program").unwrap()];
        assert_eq!(execvp(&argv), Errno::ENOENT);
        assert_eq!(execvp(&[]), Errno::ENOENT);
    }

    #[test]
    fn exit_codes() {
        let pid = Pid::from_raw(1);
        assert_eq!(exit_code(WaitStatus::Exited(pid, 3)), Some(3));
        assert_eq!(
            exit_code(WaitStatus::Signaled(pid, nix::sys::signal::Signal::SIGTERM, false)),
            Some(143)
        );
        assert_eq!(exit_code(WaitStatus::StillAlive), None);
    }
}
