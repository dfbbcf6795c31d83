use std::{iter::Peekable, mem, vec};

use super::{Args, Line, Redirection, Stage};
use crate::parser::{tokenizer::Token, ParseError, Statement};

/// Accumulates the words and redirections of the stage being read.
#[derive(Debug, Default)]
struct Pending {
    args:         Args,
    redirections: Vec<Redirection>,
}

impl Pending {
    fn take(&mut self, piped_from_predecessor: bool, runs_parallel: bool) -> Stage {
        let Pending { args, redirections } = mem::take(self);
        Stage { args, redirections, piped_from_predecessor, runs_parallel }
    }
}

/// Groups a token stream into stages in a single forward pass.
#[derive(Debug)]
pub struct Collector<I: Iterator<Item = Token>> {
    tokens:   Peekable<I>,
    stages:   Vec<Stage>,
    current:  Pending,
    /// The stage being read takes its input from the previous one.
    piped:    bool,
    /// Index of the first stage of the parallel group being read.
    group:    usize,
    /// A bare `&` has been seen, so every group of the line is detached.
    parallel: bool,
}

impl<I: Iterator<Item = Token>> Collector<I> {
    pub fn new(tokens: I) -> Self {
        Collector {
            tokens:   tokens.peekable(),
            stages:   Vec::new(),
            current:  Pending::default(),
            piped:    false,
            group:    0,
            parallel: false,
        }
    }

    fn close_stage(&mut self, runs_parallel: bool) {
        let stage = self.current.take(self.piped, runs_parallel);
        self.stages.push(stage);
    }

    /// Ends the parallel group that started at `self.group`. A group made of a
    /// single stage is detached, as is every stage of a group that ends the line
    /// with `&`. Other multi-stage pipelines are waited for as a unit.
    fn close_group(&mut self, detach: bool) {
        match &mut self.stages[self.group..] {
            [stage] => stage.runs_parallel = true,
            group if detach => group.iter_mut().for_each(|stage| stage.runs_parallel = true),
            _ => (),
        }
        self.group = self.stages.len();
        self.piped = false;
    }

    fn pipe(&mut self) -> Result<(), ParseError> {
        if self.current.args.is_empty() {
            return Err(ParseError::MissingCommandBeforePipe);
        }
        if self.tokens.peek().is_none() {
            return Err(ParseError::MissingCommandAfterPipe);
        }
        self.close_stage(false);
        self.piped = true;
        Ok(())
    }

    fn parallel(&mut self) -> Result<(), ParseError> {
        if self.current.args.is_empty() {
            return Err(ParseError::MissingCommandBeforeParallel);
        }

        // `a &| b`: `a` is detached, yet still feeds `b`.
        if let Some(Token::Pipe) = self.tokens.peek() {
            self.tokens.next();
            if self.tokens.peek().is_none() {
                return Err(ParseError::MissingCommandAfterPipe);
            }
            self.close_stage(true);
            self.piped = true;
            return Ok(());
        }

        self.parallel = true;
        self.close_stage(false);
        let trailing = self.tokens.peek().is_none();
        self.close_group(trailing);
        Ok(())
    }

    pub fn parse(mut self) -> Result<Line, ParseError> {
        while let Some(token) = self.tokens.next() {
            match token {
                Token::Word(word) => self.current.args.push(word),
                Token::Redirect(redirection) => self.current.redirections.push(redirection),
                Token::Pipe => self.pipe()?,
                Token::Parallel => self.parallel()?,
            }
        }

        if !self.current.args.is_empty() {
            self.close_stage(false);
            if self.parallel {
                self.close_group(false);
            }
        } else if !self.current.redirections.is_empty() {
            return Err(ParseError::MissingCommand);
        }

        Ok(Line::new(self.stages))
    }
}

impl Collector<vec::IntoIter<Token>> {
    /// Turns a tokenized line into a statement.
    ///
    /// `exit` is only recognised as the sole word of a line.
    pub fn run(tokens: Vec<Token>) -> Result<Statement, ParseError> {
        match tokens.first() {
            None => return Ok(Statement::Default),
            Some(Token::Word(word)) if word == "exit" => {
                return if tokens.len() == 1 {
                    Ok(Statement::Exit)
                } else {
                    Err(ParseError::ExitArguments)
                };
            }
            Some(_) => (),
        }

        Collector::new(tokens.into_iter()).parse().map(Statement::Pipeline)
    }
}
