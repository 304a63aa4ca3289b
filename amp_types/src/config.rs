//! Run configuration. Built once before any stage runs and passed by
//! reference from then on.

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Early-exit checkpoints. Set either from `parameters.toml` or from the
/// command line / environment.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StopFlags {
    /// Stop once the read-quality reports have been written.
    pub after_qc: bool,
    /// Stop once denoising and its statistics are available.
    pub after_denoise: bool,
}

impl StopFlags {
    /// Combine with flags given on the command line; either source may
    /// request a stop.
    pub fn or(self, other: StopFlags) -> StopFlags {
        StopFlags {
            after_qc: self.after_qc || other.after_qc,
            after_denoise: self.after_denoise || other.after_denoise,
        }
    }
}

/// Tool parameters for one run. The numeric defaults are placeholders:
/// truncation lengths and sampling depth depend on the quality reports
/// and the denoising statistics of the data at hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Worker threads passed through to every tool that accepts them.
    pub threads: usize,
    /// Filename suffix identifying forward reads.
    pub forward_suffix: String,
    /// Filename suffix of the matching reverse reads.
    pub reverse_suffix: String,
    /// Forward primer, removed by cutadapt.
    pub primer_forward: String,
    /// Reverse primer, removed by cutadapt.
    pub primer_reverse: String,
    pub trim_left_forward: usize,
    pub trim_left_reverse: usize,
    /// DADA2 truncation length for forward reads.
    pub trunc_len_forward: usize,
    /// DADA2 truncation length for reverse reads.
    pub trunc_len_reverse: usize,
    /// Rarefaction and core-diversity sampling depth.
    pub sampling_depth: usize,
    /// Pre-trained naive Bayes classifier, relative to the project root
    /// unless absolute.
    pub classifier: String,
    /// Taxa removed from the feature table before diversity analysis.
    pub exclude_taxa: Vec<String>,
    /// Categorical metadata column used for group significance tests.
    pub metadata_column: String,
    /// Also write the exported feature table as TSV.
    pub export_tsv: bool,
    /// Run the functional-inference predictor on the exported data.
    pub functional_inference: bool,
    pub stop: StopFlags,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            threads: 8,
            forward_suffix: "_R1_001.fastq.gz".to_string(),
            reverse_suffix: "_R2_001.fastq.gz".to_string(),
            // 341F / 805R, V3-V4
            primer_forward: "CCTACGGGNGGCWGCAG".to_string(),
            primer_reverse: "GACTACHVGGGTATCTAATCC".to_string(),
            trim_left_forward: 0,
            trim_left_reverse: 0,
            trunc_len_forward: 240,
            trunc_len_reverse: 200,
            sampling_depth: 10_000,
            classifier: "silva-138-99-nb-classifier.qza".to_string(),
            exclude_taxa: vec!["mitochondria".to_string(), "chloroplast".to_string()],
            metadata_column: "group".to_string(),
            export_tsv: true,
            functional_inference: true,
            stop: StopFlags::default(),
        }
    }
}

impl RunConfig {
    /// Load `path` if it exists, otherwise fall back to the defaults.
    /// Fields missing from the file keep their default value.
    pub fn load(path: &Path) -> Result<RunConfig> {
        if !path.exists() {
            warn!(
                "could not find {}, using default parameters; review truncation lengths and \
                 sampling depth against the quality reports before trusting the results",
                path.display()
            );
            return Ok(RunConfig::default());
        }
        let s = std::fs::read_to_string(path).with_context(|| path.display().to_string())?;
        let config: RunConfig =
            toml::from_str(&s).with_context(|| path.display().to_string())?;
        for (name, value) in config.non_default_values()? {
            warn!("using non-default {name} = {value}");
        }
        Ok(config)
    }

    /// Parameters whose value differs from the compiled-in default,
    /// sorted by name.
    pub fn non_default_values(&self) -> Result<Vec<(String, serde_json::Value)>> {
        let current = serde_json::to_value(self)?;
        let default = serde_json::to_value(RunConfig::default())?;
        let (Some(current), Some(default)) = (current.as_object(), default.as_object()) else {
            return Ok(Vec::new());
        };
        Ok(current
            .iter()
            .filter(|&(k, v)| default.get(k) != Some(v))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    /// Resolve the classifier path against the project root.
    pub fn classifier_path(&self, root: &Path) -> std::path::PathBuf {
        root.join(&self.classifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_file_gives_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = RunConfig::load(&dir.path().join("parameters.toml"))?;
        assert_eq!(config, RunConfig::default());
        Ok(())
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("parameters.toml");
        std::fs::write(
            &path,
            "trunc_len_forward = 250\nthreads = 2\n\n[stop]\nafter_qc = true\n",
        )?;
        let config = RunConfig::load(&path)?;
        assert_eq!(config.trunc_len_forward, 250);
        assert_eq!(config.threads, 2);
        assert_eq!(config.trunc_len_reverse, 200);
        assert!(config.stop.after_qc);
        assert!(!config.stop.after_denoise);

        let changed: Vec<_> = config
            .non_default_values()?
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(changed, vec!["stop", "threads", "trunc_len_forward"]);
        Ok(())
    }

    #[test]
    fn test_example_file_matches_defaults() -> Result<()> {
        let config: RunConfig = toml::from_str(include_str!("../../parameters.example.toml"))?;
        assert_eq!(config, RunConfig::default());
        Ok(())
    }

    #[test]
    fn test_unknown_key_is_rejected() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("parameters.toml");
        std::fs::write(&path, "trunc_len = 250\n")?;
        let err = RunConfig::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("trunc_len"));
        Ok(())
    }

    #[test]
    fn test_stop_flags_or() {
        let file = StopFlags {
            after_qc: false,
            after_denoise: true,
        };
        let cli = StopFlags {
            after_qc: true,
            after_denoise: false,
        };
        assert_eq!(
            file.or(cli),
            StopFlags {
                after_qc: true,
                after_denoise: true
            }
        );
    }
}
