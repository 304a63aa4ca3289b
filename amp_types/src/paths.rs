//! The project directory tree. Every path used by a run is derived from
//! the project root; the directory names are relied on by downstream
//! tooling and must not change.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const FASTQ_DIR: &str = "raw_fastq";
pub const MANIFEST_FILE: &str = "manifest.tsv";
pub const METADATA_FILE: &str = "metadata.tsv";
pub const PARAMETERS_FILE: &str = "parameters.toml";
pub const RESULTS_DIR: &str = "results";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    root: PathBuf,
}

impl ProjectPaths {
    /// Resolve the tree under `root`. A relative root is taken relative
    /// to the current directory. Nothing is touched on disk.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = std::path::absolute(root.as_ref())
            .with_context(|| root.as_ref().display().to_string())?;
        Ok(ProjectPaths { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn fastq_dir(&self) -> PathBuf {
        self.root.join(FASTQ_DIR)
    }

    pub fn manifest(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    pub fn metadata(&self) -> PathBuf {
        self.root.join(METADATA_FILE)
    }

    pub fn parameters(&self) -> PathBuf {
        self.root.join(PARAMETERS_FILE)
    }

    pub fn results_dir(&self) -> PathBuf {
        self.root.join(RESULTS_DIR)
    }

    pub fn fastqc_dir(&self) -> PathBuf {
        self.results_dir().join("qc").join("fastqc")
    }

    pub fn multiqc_dir(&self) -> PathBuf {
        self.results_dir().join("qc").join("multiqc")
    }

    /// QIIME artifacts (`.qza`).
    pub fn artifacts_dir(&self) -> PathBuf {
        self.results_dir().join("artifacts")
    }

    /// QIIME visualizations (`.qzv`).
    pub fn visualizations_dir(&self) -> PathBuf {
        self.results_dir().join("visualizations")
    }

    pub fn exports_dir(&self) -> PathBuf {
        self.results_dir().join("exports")
    }

    /// Output of the functional-inference predictor. The predictor
    /// refuses to write into an existing directory, so this one is never
    /// created here.
    pub fn functional_dir(&self) -> PathBuf {
        self.results_dir().join("functional")
    }

    pub fn artifact(&self, name: &str) -> PathBuf {
        self.artifacts_dir().join(name)
    }

    pub fn visualization(&self, name: &str) -> PathBuf {
        self.visualizations_dir().join(name)
    }

    pub fn export(&self, name: &str) -> PathBuf {
        self.exports_dir().join(name)
    }

    fn output_dirs(&self) -> [PathBuf; 5] {
        [
            self.fastqc_dir(),
            self.multiqc_dir(),
            self.artifacts_dir(),
            self.visualizations_dir(),
            self.exports_dir(),
        ]
    }

    /// Create the output tree. Existing directories are left alone.
    pub fn create_output_dirs(&self) -> Result<()> {
        for dir in self.output_dirs() {
            fs::create_dir_all(&dir).with_context(|| dir.display().to_string())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_are_rooted() -> Result<()> {
        let paths = ProjectPaths::new("/data/run1")?;
        assert_eq!(paths.manifest(), Path::new("/data/run1/manifest.tsv"));
        assert_eq!(paths.fastq_dir(), Path::new("/data/run1/raw_fastq"));
        assert_eq!(
            paths.artifact("demux.qza"),
            Path::new("/data/run1/results/artifacts/demux.qza")
        );
        assert_eq!(
            paths.fastqc_dir(),
            Path::new("/data/run1/results/qc/fastqc")
        );
        Ok(())
    }

    #[test]
    fn test_relative_root_is_made_absolute() -> Result<()> {
        let paths = ProjectPaths::new("project")?;
        assert!(paths.root().is_absolute());
        assert!(paths.root().ends_with("project"));
        Ok(())
    }

    #[test]
    fn test_create_output_dirs_is_idempotent() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let paths = ProjectPaths::new(dir.path())?;
        paths.create_output_dirs()?;
        std::fs::write(paths.export("keep.txt"), "x")?;
        paths.create_output_dirs()?;
        assert!(paths.export("keep.txt").exists());
        assert!(paths.visualizations_dir().is_dir());
        assert!(!paths.functional_dir().exists());
        Ok(())
    }
}
