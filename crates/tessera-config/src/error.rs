//! Configuration error types.

use std::path::PathBuf;

/// Errors raised while reading or writing `texturing.ron`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read texturing config {}: {source}", path.display())]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write texturing config {}: {source}", path.display())]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The RON text does not describe a texturing config.
    #[error("bad texturing config: {0}")]
    ParseError(#[source] ron::error::SpannedError),

    #[error("cannot serialize texturing config: {0}")]
    SerializeError(#[source] ron::Error),
}
