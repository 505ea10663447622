//! Errors raised while decoding pub manifests, lockfiles and BUILD files.
//!
//! These never escape rule generation: the engine treats a file that fails
//! to decode exactly like a file that is absent.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to read or decode one of the optional per-package inputs.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid YAML in {}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid JSON in {}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unrecognized lockfile name: {}", path.display())]
    UnknownLockfile { path: PathBuf },
}

impl ParseError {
    /// Path of the file that failed to decode.
    pub fn path(&self) -> &PathBuf {
        match self {
            ParseError::Read { path, .. }
            | ParseError::Yaml { path, .. }
            | ParseError::Json { path, .. }
            | ParseError::UnknownLockfile { path } => path,
        }
    }
}

pub(crate) fn read_file(path: &std::path::Path) -> Result<String, ParseError> {
    std::fs::read_to_string(path).map_err(|source| ParseError::Read {
        path: path.to_path_buf(),
        source,
    })
}
