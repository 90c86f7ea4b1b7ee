use super::config::SimulationConfig;
use crate::core::system::SystemSnapshot;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::Command;
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Name of the manifest written into each working directory before the engine starts.
pub const CONFIG_FILE_NAME: &str = "config.toml";

pub const DEFAULT_RUNNER_PROGRAM: &str = "somd2";

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Failed to serialize the simulation configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Failed to write runner configuration {}: {source}", path.display())]
    WriteConfig {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("'{program}' exited unsuccessfully ({})", describe_exit(*code))]
    Failed { program: String, code: Option<i32> },
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {c}"),
        None => "terminated by signal".to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunnerKind {
    Standard,
    ReplicaExchange,
}

impl RunnerKind {
    /// The runner variant is decided by the replica-exchange setting alone.
    pub fn select(config: &SimulationConfig) -> Self {
        if config.replica_exchange {
            RunnerKind::ReplicaExchange
        } else {
            RunnerKind::Standard
        }
    }
}

impl fmt::Display for RunnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunnerKind::Standard => f.write_str("standard"),
            RunnerKind::ReplicaExchange => f.write_str("replica-exchange"),
        }
    }
}

/// A configured simulation that runs to completion when asked.
pub trait SimulationRunner {
    fn run(&mut self) -> Result<(), RunnerError>;
}

/// Constructs the two runner variants offered by a simulation engine.
pub trait RunnerBackend {
    fn standard<'a>(
        &'a self,
        config: &'a SimulationConfig,
        system: &'a SystemSnapshot,
    ) -> Box<dyn SimulationRunner + 'a>;

    fn replica_exchange<'a>(
        &'a self,
        config: &'a SimulationConfig,
        system: &'a SystemSnapshot,
    ) -> Box<dyn SimulationRunner + 'a>;
}

pub fn create_runner<'a>(
    backend: &'a dyn RunnerBackend,
    config: &'a SimulationConfig,
    system: &'a SystemSnapshot,
) -> (RunnerKind, Box<dyn SimulationRunner + 'a>) {
    let kind = RunnerKind::select(config);
    let runner = match kind {
        RunnerKind::Standard => backend.standard(config, system),
        RunnerKind::ReplicaExchange => backend.replica_exchange(config, system),
    };
    (kind, runner)
}

#[derive(Serialize)]
struct RunManifest<'a> {
    runner: RunnerKind,
    system: &'a SystemSnapshot,
    config: &'a SimulationConfig,
}

/// Writes `config.toml` into the configuration's output directory.
pub fn write_manifest(
    kind: RunnerKind,
    config: &SimulationConfig,
    system: &SystemSnapshot,
) -> Result<PathBuf, RunnerError> {
    let manifest = RunManifest {
        runner: kind,
        system,
        config,
    };
    let content = toml::to_string(&manifest)?;
    let path = config.output_directory.join(CONFIG_FILE_NAME);
    fs::write(&path, content).map_err(|source| RunnerError::WriteConfig {
        path: path.clone(),
        source,
    })?;
    debug!("Wrote runner configuration to {:?}", &path);
    Ok(path)
}

/// Runs the engine as an external program: `<program> <system> --config <manifest>`,
/// followed by `--replica-exchange` for the replica-exchange variant.
#[derive(Debug, Clone)]
pub struct ProcessBackend {
    program: String,
}

impl ProcessBackend {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn runner<'a>(
        &'a self,
        kind: RunnerKind,
        config: &'a SimulationConfig,
        system: &'a SystemSnapshot,
    ) -> Box<dyn SimulationRunner + 'a> {
        Box::new(ProcessRunner {
            program: &self.program,
            kind,
            config,
            system,
        })
    }
}

impl Default for ProcessBackend {
    fn default() -> Self {
        Self::new(DEFAULT_RUNNER_PROGRAM)
    }
}

impl RunnerBackend for ProcessBackend {
    fn standard<'a>(
        &'a self,
        config: &'a SimulationConfig,
        system: &'a SystemSnapshot,
    ) -> Box<dyn SimulationRunner + 'a> {
        self.runner(RunnerKind::Standard, config, system)
    }

    fn replica_exchange<'a>(
        &'a self,
        config: &'a SimulationConfig,
        system: &'a SystemSnapshot,
    ) -> Box<dyn SimulationRunner + 'a> {
        self.runner(RunnerKind::ReplicaExchange, config, system)
    }
}

struct ProcessRunner<'a> {
    program: &'a str,
    kind: RunnerKind,
    config: &'a SimulationConfig,
    system: &'a SystemSnapshot,
}

impl ProcessRunner<'_> {
    fn command(&self, manifest: &std::path::Path) -> Command {
        let mut cmd = Command::new(self.program);
        cmd.arg(self.system.path()).arg("--config").arg(manifest);
        if self.kind == RunnerKind::ReplicaExchange {
            cmd.arg("--replica-exchange");
        }
        cmd
    }
}

impl SimulationRunner for ProcessRunner<'_> {
    #[instrument(skip_all, fields(runner = %self.kind, program = self.program))]
    fn run(&mut self) -> Result<(), RunnerError> {
        let manifest = write_manifest(self.kind, self.config, self.system)?;
        let mut cmd = self.command(&manifest);
        info!("Launching {} runner: {:?}", self.kind, &cmd);

        let status = cmd.status().map_err(|source| RunnerError::Launch {
            program: self.program.to_string(),
            source,
        })?;
        if !status.success() {
            return Err(RunnerError::Failed {
                program: self.program.to_string(),
                code: status.code(),
            });
        }
        info!("Runner finished for {:?}", &self.config.output_directory);
        Ok(())
    }
}

/// Prepares everything a run needs but never starts the engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunBackend;

struct DryRunner<'a> {
    kind: RunnerKind,
    config: &'a SimulationConfig,
    system: &'a SystemSnapshot,
}

impl SimulationRunner for DryRunner<'_> {
    fn run(&mut self) -> Result<(), RunnerError> {
        let manifest = write_manifest(self.kind, self.config, self.system)?;
        info!(
            "Dry run: {} runner not started, configuration left at {:?}",
            self.kind, manifest
        );
        Ok(())
    }
}

impl RunnerBackend for DryRunBackend {
    fn standard<'a>(
        &'a self,
        config: &'a SimulationConfig,
        system: &'a SystemSnapshot,
    ) -> Box<dyn SimulationRunner + 'a> {
        Box::new(DryRunner {
            kind: RunnerKind::Standard,
            config,
            system,
        })
    }

    fn replica_exchange<'a>(
        &'a self,
        config: &'a SimulationConfig,
        system: &'a SystemSnapshot,
    ) -> Box<dyn SimulationRunner + 'a> {
        Box::new(DryRunner {
            kind: RunnerKind::ReplicaExchange,
            config,
            system,
        })
    }
}
