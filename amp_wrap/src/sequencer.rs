//! Strictly sequential execution of a stage plan. A stage starts only
//! after the previous tool has exited successfully; the first failure
//! ends the run.

use crate::stage::{Checkpoint, Stage};
use amp_types::StopFlags;
use anyhow::{Context, Result};
use log::{error, info};
use std::fmt::{self, Display, Formatter};
use std::process::Command;

/// Exit status of one tool invocation. `code` is `None` when the process
/// was terminated by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageStatus {
    pub code: Option<i32>,
}

impl StageStatus {
    pub const SUCCESS: StageStatus = StageStatus { code: Some(0) };

    pub fn success(self) -> bool {
        self.code == Some(0)
    }
}

/// Runs a single stage and blocks until it has finished.
pub trait StageRunner {
    fn run(&mut self, stage: &Stage) -> Result<StageStatus>;
}

/// Spawns each stage as a child process with inherited stdio.
#[derive(Debug, Default)]
pub struct ProcessRunner;

impl StageRunner for ProcessRunner {
    fn run(&mut self, stage: &Stage) -> Result<StageStatus> {
        let status = Command::new(&stage.program)
            .args(&stage.args)
            .status()
            .with_context(|| format!("running stage {}: {}", stage.name, stage.program))?;
        Ok(StageStatus {
            code: status.code(),
        })
    }
}

/// An external tool reported failure.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("stage '{stage}' failed with exit code {exit_code}")]
    Failed { stage: String, exit_code: i32 },

    #[error("stage '{stage}' was terminated by a signal")]
    Killed { stage: String },
}

impl StageError {
    pub fn from_exit(stage: String, exit_code: Option<i32>) -> Self {
        match exit_code {
            Some(exit_code) => StageError::Failed { stage, exit_code },
            None => StageError::Killed { stage },
        }
    }
}

/// Run `stage` and turn a non-zero exit into an error.
pub fn run_checked(runner: &mut dyn StageRunner, stage: &Stage) -> Result<()> {
    let status = runner.run(stage)?;
    if status.success() {
        Ok(())
    } else {
        Err(StageError::from_exit(stage.name.to_string(), status.code).into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    /// The stage at this index is next to run.
    Running(usize),
    StoppedEarly(Checkpoint),
    Completed,
    Failed {
        stage: String,
        exit_code: Option<i32>,
    },
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::StoppedEarly(_) | RunState::Completed | RunState::Failed { .. }
        )
    }
}

impl Display for RunState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RunState::NotStarted => write!(f, "not started"),
            RunState::Running(i) => write!(f, "running stage {}", i + 1),
            RunState::StoppedEarly(checkpoint) => write!(f, "{checkpoint}"),
            RunState::Completed => write!(f, "completed"),
            RunState::Failed {
                stage,
                exit_code: Some(code),
            } => write!(f, "stage '{stage}' failed with exit code {code}"),
            RunState::Failed {
                stage,
                exit_code: None,
            } => write!(f, "stage '{stage}' was terminated by a signal"),
        }
    }
}

pub struct Sequencer<'a> {
    stages: &'a [Stage],
    stop: StopFlags,
    state: RunState,
    executed: usize,
}

impl<'a> Sequencer<'a> {
    pub fn new(stages: &'a [Stage], stop: StopFlags) -> Self {
        Sequencer {
            stages,
            stop,
            state: RunState::NotStarted,
            executed: 0,
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Number of stages whose tool was invoked.
    pub fn executed(&self) -> usize {
        self.executed
    }

    /// Make one transition. A runner error (the tool could not be
    /// started at all) is returned as is and leaves the state unchanged.
    pub fn step(&mut self, runner: &mut dyn StageRunner) -> Result<&RunState> {
        let next = match self.state {
            RunState::NotStarted if self.stages.is_empty() => RunState::Completed,
            RunState::NotStarted => RunState::Running(0),
            RunState::Running(i) => {
                let stage = &self.stages[i];
                info!(
                    "stage {}/{} {}: {}",
                    i + 1,
                    self.stages.len(),
                    stage.name,
                    stage.command_line()
                );
                let status = runner.run(stage)?;
                self.executed += 1;
                if !status.success() {
                    error!("stage {} exited with {:?}", stage.name, status.code);
                    RunState::Failed {
                        stage: stage.name.to_string(),
                        exit_code: status.code,
                    }
                } else if let Some(checkpoint) = stage
                    .checkpoint
                    .filter(|c| c.is_requested(self.stop))
                {
                    RunState::StoppedEarly(checkpoint)
                } else if i + 1 == self.stages.len() {
                    RunState::Completed
                } else {
                    RunState::Running(i + 1)
                }
            }
            _ => return Ok(&self.state),
        };
        self.state = next;
        Ok(&self.state)
    }

    /// Step until a terminal state is reached and return it.
    pub fn run(&mut self, runner: &mut dyn StageRunner) -> Result<RunState> {
        while !self.state.is_terminal() {
            self.step(runner)?;
        }
        Ok(self.state.clone())
    }
}
