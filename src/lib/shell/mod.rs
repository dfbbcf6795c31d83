pub mod pipe_exec;
pub mod status;

use self::{
    pipe_exec::{
        job_control::{self, Completion, ExitReport},
        PipelineError,
    },
    status::Status,
};
use crate::{
    builtins::{BuiltinFunction, BuiltinMap, BUILTINS},
    parser::{
        self,
        pipelines::{Line, Stage},
        ParseError, Statement,
    },
    sys::Pid,
};
use std::io::{self, Write};
use thiserror::Error;

/// Errors from execution
#[derive(Debug, Error)]
pub enum ShellError {
    /// Parsing failed; nothing was spawned
    #[error("{0}")]
    Parse(#[from] ParseError),
    /// A pipe or a fork failed; the rest of the line was abandoned
    #[error("pipeline execution error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Options for the shell
#[derive(Debug, Clone, Copy, Default, Hash, PartialEq, Eq)]
pub struct Options {
    /// Print commands that are to be executed.
    pub print_comms: bool,
    /// Do not execute any commands given to the shell.
    pub no_exec:     bool,
}

/// What became of a line.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Completed(Completion),
    /// The line was `exit`.
    Exit,
}

/// Whether the driver should keep reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// The shell holds what outlives a single line: its options, the built-ins it
/// knows about and the children it launched without waiting for them.
pub struct Shell {
    builtins:        &'static BuiltinMap,
    opts:            Options,
    /// Detached children that have not been reaped yet.
    background:      Vec<Pid>,
    previous_status: Status,
}

impl Default for Shell {
    fn default() -> Self { Self::new() }
}

impl Shell {
    pub fn new() -> Self { Self::with_options(Options::default()) }

    pub fn with_options(opts: Options) -> Self {
        Shell { builtins: BUILTINS, opts, background: Vec::new(), previous_status: Status::SUCCESS }
    }

    /// Status of the last line that ran.
    pub fn previous_status(&self) -> Status { self.previous_status }

    /// Detached children that were still running when last checked.
    pub fn background_jobs(&self) -> &[Pid] { &self.background }

    /// A lone built-in without redirections runs inside the shell, so `cd` and
    /// `export` affect the shell itself.
    fn in_process_builtin<'a>(&self, line: &'a Line) -> Option<(&'a Stage, BuiltinFunction)> {
        match line.stages.as_slice() {
            [stage] if !stage.runs_parallel && stage.redirections.is_empty() => {
                self.builtins.lookup(stage.command()).map(|main| (stage, main))
            }
            _ => None,
        }
    }

    /// Parses and runs one line of input.
    pub fn execute_line(&mut self, input: &str) -> Result<Outcome, ShellError> {
        job_control::reap_detached(&mut self.background);

        let line = match parser::parse(input)? {
            Statement::Default => return Ok(Outcome::Completed(Completion::default())),
            Statement::Exit => return Ok(Outcome::Exit),
            Statement::Pipeline(line) => line,
        };

        if self.opts.print_comms {
            eprintln!("> {}", line);
        }
        if self.opts.no_exec {
            return Ok(Outcome::Completed(Completion::default()));
        }

        let completion = match self.in_process_builtin(&line) {
            Some((stage, main)) => {
                let stdout = io::stdout();
                let mut stdout = stdout.lock();
                let status = main(&stage.args, &mut stdout);
                let _ = stdout.flush();
                Completion {
                    waited:   vec![ExitReport { pid: None, pipeline: 0, stage: 0, status }],
                    detached: Vec::new(),
                }
            }
            None => self.execute_pipelines(line)?,
        };

        self.background.extend_from_slice(&completion.detached);
        self.previous_status = completion.last_status();
        Ok(Outcome::Completed(completion))
    }

    /// Runs a line on behalf of the driver, reporting any error on stderr.
    pub fn on_command(&mut self, command: &str) -> Flow {
        match self.execute_line(command) {
            Ok(Outcome::Exit) => Flow::Exit,
            Ok(Outcome::Completed(_)) => Flow::Continue,
            Err(why) => {
                eprintln!("mish: {}", why);
                self.previous_status = Status::FALSE;
                Flow::Continue
            }
        }
    }
}
