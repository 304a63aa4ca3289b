// Warning groups
#![deny(
    future_incompatible,
    nonstandard_style,
    rust_2018_compatibility,
    rust_2021_compatibility,
    rust_2018_idioms,
    unused
)]
// Other warnings
#![deny(
    confusable_idents,
    const_item_mutation,
    deprecated,
    drop_bounds,
    elided_lifetimes_in_paths,
    irrefutable_let_patterns,
    non_shorthand_field_patterns,
    unconditional_recursion,
    unused_comparisons,
    while_true
)]

//! Wrapper that drives a paired-end 16S amplicon analysis through
//! external tools: it writes the sample manifest, checks the inputs,
//! runs each tool in order and exports the results for functional
//! inference.

pub mod export;
pub mod logging;
pub mod plan;
pub mod sequencer;
pub mod stage;
pub mod utils;
pub mod validate;

use amp_types::{Manifest, ProjectPaths, RunConfig};
use anyhow::{Context, Result};
use log::info;
use sequencer::{RunState, Sequencer, StageError, StageRunner};
use stage::Checkpoint;

/// How a run that did not fail came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    StoppedEarly(Checkpoint),
}

/// Write the manifest, validate the project inputs, run the stage plan
/// and, if it ran to the end, the exports.
///
/// No tool is invoked unless every input is present. The first failing
/// tool ends the run.
pub fn execute(
    paths: &ProjectPaths,
    config: &RunConfig,
    manifest: &Manifest,
    runner: &mut dyn StageRunner,
) -> Result<RunOutcome> {
    manifest.write(&paths.manifest())?;
    validate::validate_inputs(paths, config)?;
    paths
        .create_output_dirs()
        .context("creating the output directory tree")?;

    let stages = plan::pipeline_stages(config, paths, manifest);
    let mut sequencer = Sequencer::new(&stages, config.stop);
    let state = sequencer.run(runner)?;
    info!(
        "{} of {} stages executed, final state: {state}",
        sequencer.executed(),
        stages.len()
    );

    match state {
        RunState::Completed => {
            export::run_exports(&export::export_stages(config, paths), runner)?;
            info!(
                "pipeline completed, exports written to {}",
                paths.exports_dir().display()
            );
            Ok(RunOutcome::Completed)
        }
        RunState::StoppedEarly(checkpoint) => {
            info!("{checkpoint}; inspect the reports and rerun without the stop flag to continue");
            Ok(RunOutcome::StoppedEarly(checkpoint))
        }
        RunState::Failed { stage, exit_code } => Err(StageError::from_exit(stage, exit_code).into()),
        RunState::NotStarted | RunState::Running(_) => {
            unreachable!("sequencer returned a non-terminal state")
        }
    }
}
