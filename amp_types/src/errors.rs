use std::path::PathBuf;

/// A required input is absent from the project tree.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("{what} not found: {}", path.display())]
    Missing { what: &'static str, path: PathBuf },

    #[error("{what} is not a directory: {}", path.display())]
    NotADirectory { what: &'static str, path: PathBuf },

    #[error("{what} already exists, remove it or move it away: {}", path.display())]
    AlreadyExists { what: &'static str, path: PathBuf },
}

/// Paired-end data that cannot be turned into a consistent manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error(
        "sample '{sample_id}' has no reverse read file; expected {}",
        expected.display()
    )]
    MissingMate { sample_id: String, expected: PathBuf },

    #[error("sample '{sample_id}' has no {direction} read in the legacy manifest")]
    MissingDirection {
        sample_id: String,
        direction: &'static str,
    },

    #[error("no forward read files ending in '{suffix}' were found in {}", dir.display())]
    NoSamples { dir: PathBuf, suffix: String },

    #[error("sample '{sample_id}' appears more than once")]
    DuplicateId { sample_id: String },

    #[error("sample '{sample_id}' is listed more than once for the {direction} read")]
    DuplicateSample {
        sample_id: String,
        direction: &'static str,
    },

    #[error("sample '{sample_id}' has an unknown read direction '{direction}'")]
    UnknownDirection {
        sample_id: String,
        direction: String,
    },
}
