mod collector;

pub use self::collector::*;

use itertools::Itertools;
use smallvec::SmallVec;
use std::fmt;

/// Arguments of a single stage: the program name followed by its arguments.
pub type Args = SmallVec<[String; 4]>;

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum RedirectKind {
    /// `>`: create or truncate the target and send stdout to it.
    Output,
    /// `>>`: create or append to the target and send stdout to it.
    Append,
    /// `<`: read stdin from the target.
    Input,
}

impl RedirectKind {
    pub fn from_operator(operator: &str) -> Option<Self> {
        match operator {
            ">" => Some(RedirectKind::Output),
            ">>" => Some(RedirectKind::Append),
            "<" => Some(RedirectKind::Input),
            _ => None,
        }
    }

    pub fn as_operator(self) -> &'static str {
        match self {
            RedirectKind::Output => ">",
            RedirectKind::Append => ">>",
            RedirectKind::Input => "<",
        }
    }

    /// Whether the redirection replaces standard input rather than standard output.
    pub fn is_input(self) -> bool { self == RedirectKind::Input }
}

impl fmt::Display for RedirectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_operator()) }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Redirection {
    pub kind:   RedirectKind,
    pub target: String,
}

impl fmt::Display for Redirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.target)
    }
}

/// One command of a line, and how it relates to its neighbours.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct Stage {
    pub args:                   Args,
    pub redirections:           Vec<Redirection>,
    /// Standard input comes from the previous stage's standard output.
    pub piped_from_predecessor: bool,
    /// The line does not block on this stage's completion.
    pub runs_parallel:          bool,
}

impl Stage {
    pub fn new(args: Args, redirections: Vec<Redirection>) -> Self {
        Stage { args, redirections, ..Stage::default() }
    }

    /// The program name. Stages produced by the parser are never empty.
    pub fn command(&self) -> &str { self.args.first().map_or("", String::as_str) }
}

/// Every stage of one input line, in input order.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct Line {
    pub stages: Vec<Stage>,
}

impl Line {
    pub fn new(stages: Vec<Stage>) -> Self { Line { stages } }

    pub fn is_empty(&self) -> bool { self.stages.is_empty() }

    pub fn len(&self) -> usize { self.stages.len() }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, stage) in self.stages.iter().enumerate() {
            if index != 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", stage.args.iter().join(" "))?;
            for redirection in &stage.redirections {
                write!(f, " {}", redirection)?;
            }

            let next_is_piped = self.stages.get(index + 1).map_or(false, |next| {
                next.piped_from_predecessor
            });
            match (next_is_piped, stage.runs_parallel) {
                (true, true) => f.write_str(" &|")?,
                (true, false) => f.write_str(" |")?,
                (false, true) => f.write_str(" &")?,
                (false, false) if index + 1 < self.stages.len() => f.write_str(" &")?,
                (false, false) => (),
            }
        }
        Ok(())
    }
}
