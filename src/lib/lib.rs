#![allow(unknown_lints)]

extern crate mish_sys as sys;

pub mod builtins;
pub mod parser;
pub mod shell;

pub use crate::shell::{
    pipe_exec::{
        job_control::{Completion, ExitReport, ProcessHandle},
        PipelineError,
    },
    status::Status,
    Flow, Options, Outcome, Shell, ShellError,
};

pub fn version() -> &'static str { concat!("mish ", env!("CARGO_PKG_VERSION")) }
