use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced while bootstrapping the bridge.
///
/// Nothing past bootstrap is fallible: malformed input batches, repeated
/// lifecycle transitions and late host callbacks all degrade to logged
/// no-ops instead of errors.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A storage directory could not be created or reused.
    #[error("failed to prepare storage directory {path}: {source}")]
    StorageSetup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Host-supplied bootstrap parameters were unusable.
    #[error("invalid bootstrap config: {0}")]
    InvalidConfig(String),
}
