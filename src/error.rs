//! Error taxonomy for the agent.
//!
//! Read misses are not errors (`Ok(None)`); these variants cover genuine
//! failures: filesystem faults, remote API problems, configuration issues,
//! and session persistence faults.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    /// Filesystem failure, tagged with the path involved.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Prediction API failure: rejected submission, failed job, or poll
    /// timeout.
    #[error("{0}")]
    Remote(String),

    /// Configuration or startup failure.
    #[error("{0}")]
    Config(String),

    /// Session persistence failure.
    #[error("{0}")]
    Session(String),
}

impl AgentError {
    /// Tag an I/O error with the path it occurred on.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_carry_the_path() {
        let err = AgentError::io(
            "/work/missing.txt",
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        );
        let message = err.to_string();
        assert!(message.contains("/work/missing.txt"));
        assert!(message.contains("no such file"));
    }

    #[test]
    fn remote_errors_surface_their_message() {
        let err = AgentError::Remote("Prediction failed: model exploded".to_string());
        assert_eq!(err.to_string(), "Prediction failed: model exploded");
    }
}
