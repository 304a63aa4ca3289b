//! Convert the final artifacts into plain BIOM/FASTA/TSV files and hand
//! them to the functional-inference predictor.

use crate::sequencer::{run_checked, StageRunner};
use crate::stage::Stage;
use amp_types::{ProjectPaths, RunConfig};
use anyhow::Result;
use log::info;
use std::path::PathBuf;

pub const FEATURE_TABLE_BIOM: &str = "feature-table.biom";
pub const FEATURE_TABLE_TSV: &str = "feature-table.tsv";
pub const REP_SEQS_FASTA: &str = "dna-sequences.fasta";

/// A required input of an export was never produced.
#[derive(Debug, thiserror::Error)]
#[error("cannot run export '{export}': artifact {} does not exist", path.display())]
pub struct MissingArtifact {
    pub export: &'static str,
    pub path: PathBuf,
}

/// An export stage together with the files it reads.
#[derive(Debug, Clone)]
pub struct Export {
    pub stage: Stage,
    pub inputs: Vec<PathBuf>,
}

/// Exports in the order they must run. The TSV conversion and the
/// predictor are included only when enabled in `config`.
pub fn export_stages(config: &RunConfig, paths: &ProjectPaths) -> Vec<Export> {
    let table = paths.artifact("table-filtered.qza");
    let rep_seqs = paths.artifact("rep-seqs.qza");
    let biom = paths.export(FEATURE_TABLE_BIOM);
    let fasta = paths.export(REP_SEQS_FASTA);

    let mut exports = vec![
        Export {
            stage: Stage::new("export-table", "qiime")
                .args(["tools", "export"])
                .opt("--input-path", &table)
                .opt("--output-path", paths.exports_dir())
                .produces(&biom),
            inputs: vec![table],
        },
        Export {
            stage: Stage::new("export-rep-seqs", "qiime")
                .args(["tools", "export"])
                .opt("--input-path", &rep_seqs)
                .opt("--output-path", paths.exports_dir())
                .produces(&fasta),
            inputs: vec![rep_seqs],
        },
    ];

    if config.export_tsv {
        exports.push(Export {
            stage: Stage::new("biom-to-tsv", "biom")
                .arg("convert")
                .opt("-i", &biom)
                .output("-o", paths.export(FEATURE_TABLE_TSV))
                .arg("--to-tsv"),
            inputs: vec![biom.clone()],
        });
    }

    if config.functional_inference {
        exports.push(Export {
            stage: Stage::new("functional-inference", "picrust2_pipeline.py")
                .opt("-s", &fasta)
                .opt("-i", &biom)
                .output("-o", paths.functional_dir())
                .opt("-p", config.threads.to_string()),
            inputs: vec![fasta, biom],
        });
    }

    exports
}

/// Run each export after checking that its inputs exist. Any missing
/// input or failing tool ends the run.
pub fn run_exports(exports: &[Export], runner: &mut dyn StageRunner) -> Result<()> {
    for export in exports {
        if let Some(missing) = export.inputs.iter().find(|p| !p.exists()) {
            return Err(MissingArtifact {
                export: export.stage.name,
                path: missing.clone(),
            }
            .into());
        }
        info!("export {}: {}", export.stage.name, export.stage.command_line());
        run_checked(runner, &export.stage)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::test_support::StubRunner;
    use crate::sequencer::StageError;
    use std::fs;

    fn project() -> (tempfile::TempDir, ProjectPaths) {
        let dir = tempfile::tempdir().unwrap();
        let paths = ProjectPaths::new(dir.path()).unwrap();
        paths.create_output_dirs().unwrap();
        (dir, paths)
    }

    #[test]
    fn test_export_selection() {
        let paths = ProjectPaths::new("/p").unwrap();
        let mut config = RunConfig::default();
        let names = |c: &RunConfig| -> Vec<&'static str> {
            export_stages(c, &paths)
                .iter()
                .map(|e| e.stage.name)
                .collect()
        };
        assert_eq!(
            names(&config),
            vec![
                "export-table",
                "export-rep-seqs",
                "biom-to-tsv",
                "functional-inference"
            ]
        );
        config.export_tsv = false;
        config.functional_inference = false;
        assert_eq!(names(&config), vec!["export-table", "export-rep-seqs"]);
    }

    #[test]
    fn test_missing_artifact_is_named() {
        let (_dir, paths) = project();
        fs::write(paths.artifact("rep-seqs.qza"), "").unwrap();
        let mut runner = StubRunner::default();

        let err = run_exports(&export_stages(&RunConfig::default(), &paths), &mut runner)
            .unwrap_err();
        let missing = err.downcast_ref::<MissingArtifact>().unwrap();
        assert_eq!(missing.export, "export-table");
        assert_eq!(missing.path, paths.artifact("table-filtered.qza"));
        assert!(runner.calls.is_empty());
    }

    #[test]
    fn test_exports_run_in_order() -> Result<()> {
        let (_dir, paths) = project();
        fs::write(paths.artifact("table-filtered.qza"), "")?;
        fs::write(paths.artifact("rep-seqs.qza"), "")?;
        let mut runner = StubRunner::touching_outputs();

        run_exports(&export_stages(&RunConfig::default(), &paths), &mut runner)?;
        assert_eq!(runner.calls.len(), 4);
        assert!(paths.export(FEATURE_TABLE_TSV).exists());
        Ok(())
    }

    #[test]
    fn test_failed_export_stops() {
        let (_dir, paths) = project();
        fs::write(paths.artifact("table-filtered.qza"), "").unwrap();
        fs::write(paths.artifact("rep-seqs.qza"), "").unwrap();
        let mut runner = StubRunner::failing_at("export-table", 1);

        let err = run_exports(&export_stages(&RunConfig::default(), &paths), &mut runner)
            .unwrap_err();
        assert!(err.downcast_ref::<StageError>().is_some());
        assert_eq!(runner.calls, vec!["export-table"]);
    }
}
