//! amplicon16s
#![deny(missing_docs)]

use amp_types::{Manifest, ProjectPaths, RunConfig, StopFlags};
use amp_wrap::sequencer::ProcessRunner;
use amp_wrap::{execute, export, logging, plan, utils, validate, RunOutcome};
use anyhow::{Context, Result};
use clap::builder::BoolishValueParser;
use clap::{self, ArgAction, Parser};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;

const CMD: &str = "amplicon16s";

/// Run a paired-end 16S rRNA amplicon analysis with QIIME 2, DADA2,
/// cutadapt, FastQC/MultiQC and PICRUSt2.
#[derive(Parser, Debug)]
#[clap(name = CMD, version)]
struct Amplicon16s {
    #[clap(subcommand)]
    subcmd: SubCommand,
}

#[derive(Parser, Debug)]
enum SubCommand {
    /// Build the manifest, check the inputs and run every stage.
    #[clap(name = "run")]
    Run(Run),

    /// Build the sample manifest from the FASTQ directory and stop.
    #[clap(name = "manifest")]
    Manifest(ProjectArg),

    /// Convert a long-format manifest (one row per read file with a
    /// direction column) into the paired three-column layout.
    #[clap(name = "convert-manifest")]
    ConvertManifest(ConvertManifest),

    /// List the stages a run would execute, with their outputs.
    #[clap(name = "stages")]
    Stages(ProjectArg),
}

#[derive(Parser, Debug, Clone)]
struct ProjectArg {
    /// Project root containing raw_fastq/, metadata.tsv and
    /// optionally parameters.toml. Defaults to the current directory.
    #[clap(value_name = "PATH", env = "PROJECT_ROOT")]
    root: Option<PathBuf>,
}

impl ProjectArg {
    fn paths(&self) -> Result<ProjectPaths> {
        match &self.root {
            Some(root) => ProjectPaths::new(root),
            None => ProjectPaths::new(std::env::current_dir()?),
        }
    }
}

#[derive(Parser, Debug, Clone)]
struct Run {
    #[clap(flatten)]
    project: ProjectArg,

    /// Stop once the FastQC/MultiQC reports are written.
    #[clap(long, env = "STOP_AFTER_QC", action = ArgAction::SetTrue, value_parser = BoolishValueParser::new())]
    stop_after_qc: bool,

    /// Stop once denoising and its statistics are written.
    #[clap(long, env = "STOP_AFTER_DENOISE", action = ArgAction::SetTrue, value_parser = BoolishValueParser::new())]
    stop_after_denoise: bool,

    /// Do not execute anything.
    /// Print the commands that would run and stop.
    #[clap(long)]
    dry: bool,
}

#[derive(Parser, Debug, Clone)]
struct ConvertManifest {
    /// Long-format manifest with sample-id, absolute-filepath and
    /// direction columns.
    #[clap(long, value_name = "TSV")]
    input: PathBuf,

    /// Where to write the paired manifest.
    #[clap(long, value_name = "TSV")]
    output: PathBuf,
}

/// Load parameters.toml from the project root and scan the FASTQ
/// directory. Nothing is written.
fn load(paths: &ProjectPaths) -> Result<(RunConfig, Manifest)> {
    let config = RunConfig::load(&paths.parameters())?;
    validate::validate_parameters(&config)?;
    let manifest = Manifest::from_fastq_dir(
        &paths.fastq_dir(),
        &config.forward_suffix,
        &config.reverse_suffix,
    )?;
    Ok((config, manifest))
}

fn print_plan(config: &RunConfig, paths: &ProjectPaths, manifest: &Manifest) {
    print!(
        "{}",
        plan::render(&plan::pipeline_stages(config, paths, manifest))
    );
    let exports: Vec<_> = export::export_stages(config, paths)
        .into_iter()
        .map(|e| e.stage)
        .collect();
    println!("\nexports:");
    print!("{}", plan::render(&exports));
}

fn inner_main() -> Result<ExitCode> {
    let opts = Amplicon16s::parse();
    logging::init_log();

    match opts.subcmd {
        SubCommand::Run(r) => {
            let paths = r.project.paths()?;
            let (mut config, manifest) = load(&paths)?;
            config.stop = config.stop.or(StopFlags {
                after_qc: r.stop_after_qc,
                after_denoise: r.stop_after_denoise,
            });

            if r.dry {
                println!("Dry Run Mode\n");
                println!("manifest: {} samples -> {}", manifest.len(), paths.manifest().display());
                print_plan(&config, &paths, &manifest);
                return Ok(ExitCode::SUCCESS);
            }

            info!("project root {}", paths.root().display());
            match execute(&paths, &config, &manifest, &mut ProcessRunner)? {
                RunOutcome::Completed => println!(">>> Pipeline completed <<<"),
                RunOutcome::StoppedEarly(checkpoint) => {
                    println!(">>> Pipeline {checkpoint} <<<");
                }
            }
            Ok(ExitCode::SUCCESS)
        }

        SubCommand::Manifest(p) => {
            let paths = p.paths()?;
            let (_, manifest) = load(&paths)?;
            manifest.write(&paths.manifest())?;
            Ok(ExitCode::SUCCESS)
        }

        SubCommand::ConvertManifest(c) => {
            let manifest = Manifest::from_legacy(&c.input)?;
            manifest
                .write(&c.output)
                .with_context(|| format!("converting {}", c.input.display()))?;
            println!("{} created successfully", c.output.display());
            Ok(ExitCode::SUCCESS)
        }

        SubCommand::Stages(p) => {
            let paths = p.paths()?;
            let (config, manifest) = load(&paths)?;
            print_plan(&config, &paths, &manifest);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn main() -> ExitCode {
    match inner_main() {
        Ok(exit_code) => exit_code,
        Err(err) => {
            utils::print_error_chain(&err);
            ExitCode::FAILURE
        }
    }
}
