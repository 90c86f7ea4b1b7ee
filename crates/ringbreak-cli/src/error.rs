use ringbreak::engine::error::EngineError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{failed} of {total} replicate(s) failed{}", skipped_note(.skipped))]
    ReplicatesFailed {
        failed: usize,
        total: usize,
        skipped: Vec<u32>,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn skipped_note(skipped: &[u32]) -> String {
    if skipped.is_empty() {
        String::new()
    } else {
        format!("; replicates {:?} were not attempted", skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringbreak::engine::config::ConfigError;

    #[test]
    fn engine_errors_are_shown_verbatim() {
        let err: CliError = EngineError::from(ConfigError::ExtensionWithoutRestart).into();
        assert!(err.to_string().starts_with("Configuration error: An extension time"));
    }

    #[test]
    fn replicate_failures_mention_skipped_replicates() {
        let err = CliError::ReplicatesFailed {
            failed: 1,
            total: 3,
            skipped: vec![3],
        };
        assert_eq!(
            err.to_string(),
            "1 of 3 replicate(s) failed; replicates [3] were not attempted"
        );
        let err = CliError::ReplicatesFailed {
            failed: 2,
            total: 3,
            skipped: vec![],
        };
        assert_eq!(err.to_string(), "2 of 3 replicate(s) failed");
    }
}
