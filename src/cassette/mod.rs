//! Cassette format for recording and replaying generator interactions.

pub mod format;
pub mod recorder;
pub mod replayer;
pub mod session;

use thiserror::Error;

/// Errors raised while loading, saving or replaying a cassette.
#[derive(Debug, Error)]
pub enum CassetteError {
    /// The cassette file could not be read.
    #[error("failed to read cassette file {path}: {source}")]
    Read {
        /// Cassette path.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The cassette file is not valid YAML for the cassette schema.
    #[error("failed to parse cassette file {path}: {source}")]
    Parse {
        /// Cassette path.
        path: String,
        /// Underlying YAML error.
        source: serde_yaml::Error,
    },
    /// The cassette could not be encoded as YAML.
    #[error("failed to encode cassette {path}: {source}")]
    Encode {
        /// Cassette path.
        path: String,
        /// Underlying YAML error.
        source: serde_yaml::Error,
    },
    /// The cassette file could not be written.
    #[error("failed to write cassette file {path}: {source}")]
    Write {
        /// Cassette path.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// No interactions were recorded for the requested port/method.
    #[error(
        "cassette exhausted: no interactions recorded for port={port:?} method={method:?}; \
         available port::method pairs: [{available}]"
    )]
    Unrecorded {
        /// Requested port.
        port: String,
        /// Requested method.
        method: String,
        /// Comma-separated pairs the cassette does hold.
        available: String,
    },
    /// Every interaction for the port/method has been served.
    #[error(
        "cassette exhausted: all {count} interactions for port={port:?} method={method:?} \
         have been consumed"
    )]
    Exhausted {
        /// Requested port.
        port: String,
        /// Requested method.
        method: String,
        /// Interactions recorded for the pair.
        count: usize,
    },
}
