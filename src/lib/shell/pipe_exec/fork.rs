use super::{
    redirection::Redirects,
    topology::{Pipes, Wiring},
};
use crate::{
    builtins::BuiltinFunction,
    parser::pipelines::Stage,
    sys::{self, ForkResult, Pid},
};
use log::trace;
use nix::errno::Errno;
use std::{
    ffi::CString,
    fs::File,
    io::Write,
    mem::ManuallyDrop,
    os::unix::io::{AsRawFd, FromRawFd, RawFd},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("failed to fork: {0}")]
    Fork(#[source] nix::Error),
    #[error("{command}: argument contains a nul byte")]
    InvalidArgument { command: String },
}

/// What the child runs once its streams are in place.
pub enum Program<'a> {
    External {
        argv:      Vec<CString>,
        /// Written when `execvp` reports `ENOENT`.
        not_found: String,
        /// Followed by the reason when `execvp` fails otherwise.
        failure:   String,
    },
    /// Runs as ordinary Rust code in the child, which may allocate. The shell
    /// forks from a single thread.
    Builtin {
        main: BuiltinFunction,
        args: &'a [String],
    },
}

impl<'a> Program<'a> {
    /// Builds everything the child needs ahead of time, so that nothing on the
    /// path from `fork` to `exec` allocates.
    pub fn external(stage: &Stage) -> Result<Self, SpawnError> {
        let argv = stage
            .args
            .iter()
            .map(|arg| CString::new(arg.as_bytes()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| SpawnError::InvalidArgument { command: stage.command().into() })?;
        Ok(Program::External {
            argv,
            not_found: format!("mish: command not found: {}\n", stage.command()),
            failure: format!("mish: {}: ", stage.command()),
        })
    }

    pub fn builtin(main: BuiltinFunction, stage: &'a Stage) -> Self {
        Program::Builtin { main, args: &stage.args }
    }
}

/// Use dup2 to replace `new` with `old`, reporting failures without allocating.
fn redir(old: RawFd, new: RawFd) {
    if sys::dup2(old, new).is_err() {
        let _ = sys::write_all(sys::STDERR_FILENO, b"mish: could not duplicate a descriptor\n");
    }
}

/// Puts the chosen descriptors on the standard stream slots. A stdout source
/// that sits on stdin's slot is moved before stdin replaces it.
fn install(stdin: Option<RawFd>, stdout: Option<RawFd>) {
    let streams = [(stdin, sys::STDIN_FILENO), (stdout, sys::STDOUT_FILENO)];
    let order = if stdout == Some(sys::STDIN_FILENO) { [1, 0] } else { [0, 1] };
    for &index in &order {
        if let (Some(fd), slot) = streams[index] {
            redir(fd, slot);
        }
    }
}

/// Whether `fd` is now one of the installed standard streams and must stay open.
fn installed(fd: RawFd, stdin: Option<RawFd>, stdout: Option<RawFd>) -> bool {
    (fd == sys::STDIN_FILENO && stdin.is_some()) || (fd == sys::STDOUT_FILENO && stdout.is_some())
}

/// Child side of a spawn: wire the streams, then become the program.
fn child(program: &Program<'_>, wiring: Wiring, pipes: &Pipes, redirects: &Redirects) -> ! {
    // Redirections win over pipes.
    let stdin = redirects.stdin.as_ref().map(File::as_raw_fd).or_else(|| wiring.stdin_fd(pipes));
    let stdout =
        redirects.stdout.as_ref().map(File::as_raw_fd).or_else(|| wiring.stdout_fd(pipes));
    install(stdin, stdout);

    let redirect_fds = redirects.stdin.iter().chain(redirects.stdout.iter()).map(File::as_raw_fd);
    for fd in pipes.raw_fds().chain(redirect_fds) {
        if !installed(fd, stdin, stdout) {
            let _ = sys::close(fd);
        }
    }

    match program {
        Program::External { argv, not_found, failure } => {
            let errno = sys::execvp(argv);
            if errno == Errno::ENOENT {
                let _ = sys::write_all(sys::STDERR_FILENO, not_found.as_bytes());
                sys::fork_exit(sys::NO_SUCH_COMMAND);
            }
            let _ = sys::write_all(sys::STDERR_FILENO, failure.as_bytes());
            let _ = sys::write_all(sys::STDERR_FILENO, sys::strerror(errno).as_bytes());
            let _ = sys::write_all(sys::STDERR_FILENO, b"\n");
            sys::fork_exit(sys::COULD_NOT_EXEC);
        }
        Program::Builtin { main, args } => {
            // Standard output belongs to the process, not to this handle.
            let mut stdout = ManuallyDrop::new(unsafe { File::from_raw_fd(sys::STDOUT_FILENO) });
            let status = (*main)(*args, &mut *stdout);
            let _ = stdout.flush();
            sys::fork_exit(status.as_os_code());
        }
    }
}

/// Forks a child for one stage of a pipeline and returns its pid.
///
/// The child never returns from this function.
pub fn spawn(
    program: &Program<'_>,
    wiring: Wiring,
    pipes: &Pipes,
    redirects: &Redirects,
) -> Result<Pid, SpawnError> {
    match unsafe { sys::fork() } {
        Ok(ForkResult::Child) => child(program, wiring, pipes, redirects),
        Ok(ForkResult::Parent { child }) => {
            trace!("forked {} ({:?})", child, wiring);
            Ok(child)
        }
        Err(why) => Err(SpawnError::Fork(why)),
    }
}
