//! Paired-end sample manifests in the three-column layout expected by
//! the sequence import stage.

use crate::errors::{InputError, ManifestError};
use anyhow::{Context, Result};
use itertools::Itertools;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Header row of a manifest file.
pub const MANIFEST_HEADER: [&str; 3] = [
    "sample-id",
    "forward-absolute-filepath",
    "reverse-absolute-filepath",
];

/// One sample: its identifier and the absolute paths of both mates.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Sample {
    #[serde(rename = "sample-id")]
    pub id: String,
    #[serde(rename = "forward-absolute-filepath")]
    pub forward: PathBuf,
    #[serde(rename = "reverse-absolute-filepath")]
    pub reverse: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    samples: Vec<Sample>,
}

impl Manifest {
    /// Build a manifest from samples already paired by the caller.
    /// Identifiers must be unique.
    pub fn new(samples: Vec<Sample>) -> Result<Manifest, ManifestError> {
        if let Some(dup) = samples.iter().map(|s| &s.id).duplicates().next() {
            return Err(ManifestError::DuplicateId {
                sample_id: dup.clone(),
            });
        }
        Ok(Manifest { samples })
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// All read files, forward then reverse for each sample.
    pub fn fastq_files(&self) -> impl Iterator<Item = &Path> + '_ {
        self.samples
            .iter()
            .flat_map(|s| [s.forward.as_path(), s.reverse.as_path()])
    }

    /// Scan `fastq_dir` for forward reads named `<id><forward_suffix>` and
    /// pair each with `<id><reverse_suffix>` in the same directory.
    ///
    /// Samples are sorted by identifier so the result does not depend on
    /// directory listing order. A forward file without its mate is an
    /// error, as is a directory without any forward file.
    pub fn from_fastq_dir(
        fastq_dir: &Path,
        forward_suffix: &str,
        reverse_suffix: &str,
    ) -> Result<Manifest> {
        if !fastq_dir.exists() {
            return Err(InputError::Missing {
                what: "FASTQ directory",
                path: fastq_dir.to_path_buf(),
            }
            .into());
        }
        if !fastq_dir.is_dir() {
            return Err(InputError::NotADirectory {
                what: "FASTQ directory",
                path: fastq_dir.to_path_buf(),
            }
            .into());
        }
        let fastq_dir = fastq_dir
            .canonicalize()
            .with_context(|| fastq_dir.display().to_string())?;

        let mut samples = Vec::new();
        for entry in
            std::fs::read_dir(&fastq_dir).with_context(|| fastq_dir.display().to_string())?
        {
            let entry = entry.with_context(|| fastq_dir.display().to_string())?;
            let forward = entry.path();
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                warn!("skipping non UTF-8 file name {}", forward.display());
                continue;
            };
            let Some(id) = name.strip_suffix(forward_suffix) else {
                continue;
            };
            if id.is_empty() || !forward.is_file() {
                continue;
            }
            let reverse = fastq_dir.join(format!("{id}{reverse_suffix}"));
            if !reverse.is_file() {
                return Err(ManifestError::MissingMate {
                    sample_id: id.to_string(),
                    expected: reverse,
                }
                .into());
            }
            samples.push(Sample {
                id: id.to_string(),
                forward,
                reverse,
            });
        }

        if samples.is_empty() {
            return Err(ManifestError::NoSamples {
                dir: fastq_dir,
                suffix: forward_suffix.to_string(),
            }
            .into());
        }
        samples.sort();
        info!(
            "found {} paired-end samples in {}",
            samples.len(),
            fastq_dir.display()
        );
        Ok(Manifest { samples })
    }

    /// Convert a long-format manifest, one row per read file with a
    /// `direction` column of `forward` or `reverse`, into the paired
    /// layout. Samples keep the order of their first row.
    pub fn from_legacy(path: &Path) -> Result<Manifest> {
        #[derive(Deserialize)]
        struct LegacyRow {
            #[serde(rename = "sample-id")]
            sample_id: String,
            #[serde(rename = "absolute-filepath")]
            path: PathBuf,
            direction: String,
        }

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_path(path)
            .with_context(|| path.display().to_string())?;

        let mut order = Vec::new();
        let mut mates: HashMap<String, (Option<PathBuf>, Option<PathBuf>)> = HashMap::new();
        for row in reader.deserialize() {
            let row: LegacyRow = row.with_context(|| path.display().to_string())?;
            let pair = mates.entry(row.sample_id.clone()).or_insert_with(|| {
                order.push(row.sample_id.clone());
                (None, None)
            });
            let (slot, direction) = match row.direction.to_ascii_lowercase().as_str() {
                "forward" => (&mut pair.0, "forward"),
                "reverse" => (&mut pair.1, "reverse"),
                _ => {
                    return Err(ManifestError::UnknownDirection {
                        sample_id: row.sample_id,
                        direction: row.direction,
                    }
                    .into())
                }
            };
            if slot.replace(row.path).is_some() {
                return Err(ManifestError::DuplicateSample {
                    sample_id: row.sample_id,
                    direction,
                }
                .into());
            }
        }

        let samples: Vec<Sample> = order
            .into_iter()
            .map(|id| {
                let Some((forward, reverse)) = mates.remove(&id) else {
                    unreachable!("every ordered sample has an entry");
                };
                match (forward, reverse) {
                    (Some(forward), Some(reverse)) => Ok(Sample {
                        id,
                        forward,
                        reverse,
                    }),
                    (None, _) => Err(ManifestError::MissingDirection {
                        sample_id: id,
                        direction: "forward",
                    }),
                    (_, None) => Err(ManifestError::MissingDirection {
                        sample_id: id,
                        direction: "reverse",
                    }),
                }
            })
            .try_collect()?;
        Ok(Manifest::new(samples)?)
    }

    /// Render the manifest as tab-separated text with the fixed header.
    pub fn to_tsv(&self) -> Result<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_writer(Vec::new());
        writer.write_record(MANIFEST_HEADER)?;
        for sample in &self.samples {
            writer.serialize(sample)?;
        }
        writer
            .into_inner()
            .map_err(|err| anyhow::anyhow!("rendering manifest: {err}"))
    }

    /// Write to `path`, replacing any previous manifest. The file is
    /// rendered next to its destination and renamed into place, so a
    /// failed write leaves the previous manifest untouched.
    pub fn write(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let contents = self.to_tsv()?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| dir.display().to_string())?;
        tmp.write_all(&contents)
            .with_context(|| tmp.path().display().to_string())?;
        tmp.persist(path)
            .with_context(|| path.display().to_string())?;
        info!("wrote manifest with {} samples to {}", self.len(), path.display());
        Ok(())
    }
}
