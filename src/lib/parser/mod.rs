pub mod pipelines;
pub mod tokenizer;

use self::pipelines::{Collector, Line, RedirectKind};
use thiserror::Error;

/// A structural error in a line. Nothing is spawned for a line that fails to parse.
#[derive(Debug, Error, PartialEq, Eq, Hash, Clone)]
pub enum ParseError {
    #[error("syntax error: missing command before pipe")]
    MissingCommandBeforePipe,
    #[error("syntax error: missing command after pipe")]
    MissingCommandAfterPipe,
    #[error("syntax error: missing command before parallel operator")]
    MissingCommandBeforeParallel,
    #[error("syntax error: expected a file name after '{0}'")]
    MissingRedirectTarget(RedirectKind),
    #[error("syntax error: redirection without a command")]
    MissingCommand,
    #[error("exit: too many arguments")]
    ExitArguments,
}

/// What a line asks the shell to do.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Statement {
    /// A blank line.
    Default,
    /// The `exit` built-in.
    Exit,
    /// Stages to be spawned.
    Pipeline(Line),
}

/// Parses a single line of input.
pub fn parse(input: &str) -> Result<Statement, ParseError> {
    tokenizer::tokenize(input).and_then(Collector::run)
}
