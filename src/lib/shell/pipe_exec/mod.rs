//! The purpose of the pipeline execution module is to turn the stages of a
//! parsed line into running processes: allocating the pipes of each pipeline,
//! opening redirections, forking a child per stage and reaping the ones the
//! line has to wait for.

pub mod fork;
pub mod job_control;
pub mod redirection;
pub mod topology;

use self::{
    fork::{Program, SpawnError},
    job_control::{Completion, Coordinator, ProcessHandle},
    topology::{PipelineRun, Pipes},
};
use super::{status::Status, Shell};
use crate::parser::pipelines::Line;
use log::debug;
use thiserror::Error;

/// Failures that abandon the rest of a line.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to create pipe: {0}")]
    Pipe(#[source] nix::Error),
    #[error("failed to fork: {0}")]
    Fork(#[source] nix::Error),
}

impl Shell {
    /// Launches every pipeline of `line`, then waits for the stages that do
    /// not run in parallel.
    ///
    /// When a pipe or a fork fails, the stages already running are left alone
    /// and handed to the background list.
    pub(crate) fn execute_pipelines(&mut self, line: Line) -> Result<Completion, PipelineError> {
        let mut coordinator = Coordinator::new();
        for run in topology::pipelines(line.stages) {
            if let Err(why) = self.spawn_pipeline(&run, &mut coordinator) {
                self.background.extend(coordinator.abandon());
                return Err(why);
            }
        }
        Ok(coordinator.finish())
    }

    fn spawn_pipeline(
        &self,
        run: &PipelineRun,
        coordinator: &mut Coordinator,
    ) -> Result<(), PipelineError> {
        let wiring = topology::plan(run.stages.len());
        let pipes = Pipes::allocate(wiring.len().saturating_sub(1)).map_err(PipelineError::Pipe)?;
        debug!("pipeline {}: {} stage(s), {} pipe(s)", run.id, run.stages.len(), pipes.len());

        for (position, (stage, wiring)) in run.stages.iter().zip(wiring).enumerate() {
            let failed = |coordinator: &mut Coordinator, why: &dyn std::fmt::Display| {
                eprintln!("mish: {}", why);
                if !stage.runs_parallel {
                    coordinator.record(run.id, position, Status::COULD_NOT_EXEC);
                }
            };

            let redirects = match redirection::resolve(&stage.redirections) {
                Ok(redirects) => redirects,
                Err(why) => {
                    failed(coordinator, &why);
                    continue;
                }
            };

            let program = match self.builtins.lookup(stage.command()) {
                Some(main) => Program::builtin(main, stage),
                None => match Program::external(stage) {
                    Ok(program) => program,
                    Err(why) => {
                        failed(coordinator, &why);
                        continue;
                    }
                },
            };

            match fork::spawn(&program, wiring, &pipes, &redirects) {
                Ok(pid) => coordinator.track(ProcessHandle {
                    pid,
                    pipeline: run.id,
                    stage: position,
                    must_wait: !stage.runs_parallel,
                }),
                Err(SpawnError::Fork(why)) => return Err(PipelineError::Fork(why)),
                Err(why) => failed(coordinator, &why),
            }
        }

        // Dropping `pipes` closes the parent's copy of every pipe end.
        Ok(())
    }
}
