//! Error type for the host-facing edges of the model.
//!
//! The clocked model itself never fails: out-of-range rows, malformed loader
//! frames and ignored display requests are defined behaviors. Only
//! configuration, pattern files, save states and image export return
//! [`SiLifeError`].

use std::path::PathBuf;

/// Errors raised while configuring, provisioning or persisting a grid.
#[derive(Debug, thiserror::Error)]
pub enum SiLifeError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("pattern line {line}: {reason}")]
    Pattern { line: usize, reason: String },

    #[error("invalid save state: {0}")]
    BadSaveState(&'static str),

    #[error("unsupported save state version {found} (expected {expected})")]
    SaveStateVersion { found: u32, expected: u32 },

    #[error("save state is {found_w}x{found_h}, grid is {expected_w}x{expected_h}")]
    DimensionMismatch {
        found_w: usize,
        found_h: usize,
        expected_w: usize,
        expected_h: usize,
    },

    #[error("save state encoding: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("save state decompression failed: {0}")]
    Decompress(String),
}

impl SiLifeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SiLifeError::Io { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, SiLifeError>;
