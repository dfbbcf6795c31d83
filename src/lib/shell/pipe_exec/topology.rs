//! Splits a line into pipelines and decides which pipe end each stage uses.

use crate::{parser::pipelines::Stage, sys};
use std::{
    fs::File,
    iter,
    os::unix::io::{AsRawFd, FromRawFd, RawFd},
};

/// A maximal run of stages connected by pipes.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PipelineRun {
    /// Position of the pipeline within its line.
    pub id:     usize,
    pub stages: Vec<Stage>,
}

/// Groups stages into pipelines. A stage that is not piped from its
/// predecessor starts a new one.
pub fn pipelines(stages: Vec<Stage>) -> Vec<PipelineRun> {
    let mut runs: Vec<PipelineRun> = Vec::new();
    for stage in stages {
        match runs.last_mut() {
            Some(run) if stage.piped_from_predecessor => run.stages.push(stage),
            _ => runs.push(PipelineRun { id: runs.len(), stages: vec![stage] }),
        }
    }
    runs
}

/// Where one standard stream of a stage is connected.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Endpoint {
    /// Keep the stream the shell itself has.
    Inherit,
    /// Use the given pipe of the pipeline.
    Pipe(usize),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Wiring {
    pub stdin:  Endpoint,
    pub stdout: Endpoint,
}

impl Wiring {
    /// The descriptor to install as standard input, if any.
    pub fn stdin_fd(self, pipes: &Pipes) -> Option<RawFd> {
        match self.stdin {
            Endpoint::Inherit => None,
            Endpoint::Pipe(index) => pipes.reader(index),
        }
    }

    /// The descriptor to install as standard output, if any.
    pub fn stdout_fd(self, pipes: &Pipes) -> Option<RawFd> {
        match self.stdout {
            Endpoint::Inherit => None,
            Endpoint::Pipe(index) => pipes.writer(index),
        }
    }
}

/// Wiring of every position of a pipeline of `len` stages: stage `i` reads
/// from pipe `i - 1` and writes into pipe `i`.
pub fn plan(len: usize) -> Vec<Wiring> {
    (0..len)
        .map(|position| Wiring {
            stdin:  if position > 0 { Endpoint::Pipe(position - 1) } else { Endpoint::Inherit },
            stdout: if position + 1 < len { Endpoint::Pipe(position) } else { Endpoint::Inherit },
        })
        .collect()
}

/// The anonymous pipes of one pipeline, as `(reader, writer)` pairs.
///
/// Dropping the value closes every descriptor in the parent.
#[derive(Debug, Default)]
pub struct Pipes {
    ends: Vec<(File, File)>,
}

impl Pipes {
    /// Creates all `count` pipes up front. A failure closes those already made.
    pub fn allocate(count: usize) -> nix::Result<Self> {
        let mut ends = Vec::with_capacity(count);
        for _ in 0..count {
            let (reader, writer) = sys::pipe()?;
            // Freshly created descriptors that nothing else owns.
            ends.push(unsafe { (File::from_raw_fd(reader), File::from_raw_fd(writer)) });
        }
        Ok(Pipes { ends })
    }

    pub(crate) fn len(&self) -> usize { self.ends.len() }

    pub fn reader(&self, index: usize) -> Option<RawFd> {
        self.ends.get(index).map(|(reader, _)| reader.as_raw_fd())
    }

    pub fn writer(&self, index: usize) -> Option<RawFd> {
        self.ends.get(index).map(|(_, writer)| writer.as_raw_fd())
    }

    /// Every descriptor held, readers and writers alike.
    pub fn raw_fds(&self) -> impl Iterator<Item = RawFd> + '_ {
        self.ends.iter().flat_map(|(reader, writer)| {
            iter::once(reader.as_raw_fd()).chain(iter::once(writer.as_raw_fd()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse, Statement};
    use std::io::{Read, Write};

    fn stages(input: &str) -> Vec<Stage> {
        match parse(input) {
            Ok(Statement::Pipeline(line)) => line.stages,
            other => panic!("unexpected parse of {:?}: {:?}", input, other),
        }
    }

    fn commands(run: &PipelineRun) -> Vec<&str> { run.stages.iter().map(Stage::command).collect() }

    #[test]
    fn single_stage_is_a_singleton_pipeline() {
        let runs = pipelines(stages("ls -l"));
        assert_eq!(1, runs.len());
        assert_eq!(vec!["ls"], commands(&runs[0]));
        assert_eq!(vec![Wiring { stdin: Endpoint::Inherit, stdout: Endpoint::Inherit }], plan(1));
    }

    #[test]
    fn maximal_runs() {
        let runs = pipelines(stages("p1 | p2 & p3 & p4 | p5 | p6"));
        assert_eq!(vec![0, 1, 2], runs.iter().map(|run| run.id).collect::<Vec<_>>());
        assert_eq!(vec!["p1", "p2"], commands(&runs[0]));
        assert_eq!(vec!["p3"], commands(&runs[1]));
        assert_eq!(vec!["p4", "p5", "p6"], commands(&runs[2]));
    }

    #[test]
    fn parallel_head_stays_in_its_pipeline() {
        let runs = pipelines(stages("p1 &| p2"));
        assert_eq!(1, runs.len());
        assert_eq!(vec!["p1", "p2"], commands(&runs[0]));
    }

    #[test]
    fn three_stage_wiring() {
        assert_eq!(plan(3), vec![
            Wiring { stdin: Endpoint::Inherit, stdout: Endpoint::Pipe(0) },
            Wiring { stdin: Endpoint::Pipe(0), stdout: Endpoint::Pipe(1) },
            Wiring { stdin: Endpoint::Pipe(1), stdout: Endpoint::Inherit },
        ]);
        assert!(plan(0).is_empty());
    }

    #[test]
    fn pipes_for_a_pipeline() {
        let pipes = Pipes::allocate(2).unwrap();
        assert_eq!(2, pipes.len());
        assert_eq!(4, pipes.raw_fds().count());
        assert_eq!(None, pipes.reader(2));

        let wiring = plan(3);
        assert_eq!(None, wiring[0].stdin_fd(&pipes));
        assert_eq!(pipes.writer(0), wiring[0].stdout_fd(&pipes));
        assert_eq!(pipes.reader(0), wiring[1].stdin_fd(&pipes));
        assert_eq!(pipes.writer(1), wiring[1].stdout_fd(&pipes));
        assert_eq!(None, wiring[2].stdout_fd(&pipes));

        let (reader, writer) = &pipes.ends[0];
        (&*writer).write_all(b"data").unwrap();
        let mut buffer = [0; 4];
        (&*reader).read_exact(&mut buffer).unwrap();
        assert_eq!(b"data", &buffer);
    }
}
