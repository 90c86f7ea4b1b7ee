use super::config::ConfigError;
use super::runner::RunnerError;
use crate::core::protocol::ProtocolError;
use crate::core::system::SystemError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    System(#[from] SystemError),

    #[error("Failed to prepare working directory {}: {source}", path.display())]
    WorkDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Simulation runner failed: {0}")]
    Runner(#[from] RunnerError),

    #[error("Failed to copy topology files in {}: {source}", path.display())]
    Topology {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl EngineError {
    /// Errors that refuse the whole invocation rather than a single replicate.
    pub fn is_fatal_before_run(&self) -> bool {
        matches!(
            self,
            EngineError::Configuration(_) | EngineError::Protocol(_) | EngineError::System(_)
        )
    }
}
