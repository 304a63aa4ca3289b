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

//! Data model for a paired-end 16S amplicon run: the run configuration,
//! the project directory tree and the sample manifest consumed by the
//! import stage.

pub mod config;
pub mod errors;
pub mod manifest;
pub mod paths;

pub use config::{RunConfig, StopFlags};
pub use errors::{InputError, ManifestError};
pub use manifest::{Manifest, Sample};
pub use paths::ProjectPaths;
