//! Checks that must pass before any external tool is started.

use amp_types::{InputError, ProjectPaths, RunConfig};
use anyhow::{ensure, Result};
use std::path::Path;

fn require_dir(what: &'static str, path: &Path) -> Result<(), InputError> {
    if !path.exists() {
        Err(InputError::Missing {
            what,
            path: path.to_path_buf(),
        })
    } else if !path.is_dir() {
        Err(InputError::NotADirectory {
            what,
            path: path.to_path_buf(),
        })
    } else {
        Ok(())
    }
}

fn require_file(what: &'static str, path: &Path) -> Result<(), InputError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(InputError::Missing {
            what,
            path: path.to_path_buf(),
        })
    }
}

fn require_absent(what: &'static str, path: &Path) -> Result<(), InputError> {
    if path.exists() {
        Err(InputError::AlreadyExists {
            what,
            path: path.to_path_buf(),
        })
    } else {
        Ok(())
    }
}

/// Confirm the FASTQ directory, the manifest and the sample metadata
/// exist, then the parameter values. The classifier is only required
/// when the run is allowed to get as far as taxonomic classification.
/// PICRUSt2 will not write into an existing output directory, so a
/// leftover one is rejected before any stage runs.
pub fn validate_inputs(paths: &ProjectPaths, config: &RunConfig) -> Result<()> {
    require_dir("FASTQ directory", &paths.fastq_dir())?;
    require_file("sample manifest", &paths.manifest())?;
    require_file("sample metadata file", &paths.metadata())?;
    if !config.stop.after_qc && !config.stop.after_denoise {
        require_file("taxonomic classifier", &config.classifier_path(paths.root()))?;
        if config.functional_inference {
            require_absent("functional inference output", &paths.functional_dir())?;
        }
    }
    validate_parameters(config)
}

/// Reject parameter values no tool would accept.
pub fn validate_parameters(config: &RunConfig) -> Result<()> {
    ensure!(config.threads > 0, "threads must be at least 1");
    ensure!(
        config.sampling_depth > 0,
        "sampling_depth must be at least 1"
    );
    ensure!(
        config.forward_suffix != config.reverse_suffix,
        "forward_suffix and reverse_suffix must differ, both are '{}'",
        config.forward_suffix
    );
    ensure!(
        !config.primer_forward.is_empty() && !config.primer_reverse.is_empty(),
        "both primer sequences must be set"
    );
    ensure!(
        !config.exclude_taxa.is_empty(),
        "exclude_taxa must name at least one taxon"
    );
    ensure!(
        !config.metadata_column.is_empty(),
        "metadata_column must be set"
    );
    Ok(())
}
