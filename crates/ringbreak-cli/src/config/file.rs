use crate::error::{CliError, Result};
use ringbreak::core::quantity::{Length, Time};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FilePathsConfig {
    pub input_dir: Option<PathBuf>,
    pub output_root: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileRunnerConfig {
    pub program: Option<String>,
    pub keep_going: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileEngineConfig {
    pub cutoff: Option<Length>,
    pub cutoff_type: Option<String>,
    pub timestep: Option<Time>,
    pub equilibration_timestep: Option<Time>,
    pub num_energy_neighbours: Option<u32>,
    pub energy_frequency: Option<Time>,
    pub frame_frequency: Option<Time>,
    pub checkpoint_frequency: Option<Time>,
    pub timeout: Option<Time>,
    pub equilibration_constraints: Option<bool>,
    pub multi_conformational_seeding: Option<bool>,
    pub save_energy_components: Option<bool>,
    pub oversubscription_factor: Option<u32>,
    pub log_level: Option<String>,
    pub log_file: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub paths: Option<FilePathsConfig>,
    pub runner: Option<FileRunnerConfig>,
    pub engine: Option<FileEngineConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading settings from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn parses_all_sections() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ringbreak.toml");
        fs::write(
            &path,
            r#"
[paths]
input-dir = "/data/prepared"
output-root = "/scratch/runs"

[runner]
program = "/opt/somd2/bin/somd2"
keep-going = true

[engine]
cutoff = "10A"
cutoff-type = "RF"
timestep = "4fs"
timeout = "60 s"
frame-frequency = "20ps"
oversubscription-factor = 2
save-energy-components = false
"#,
        )
        .unwrap();

        let config = FileConfig::from_file(&path).unwrap();
        let paths = config.paths.unwrap();
        assert_eq!(paths.input_dir, Some(PathBuf::from("/data/prepared")));
        let runner = config.runner.unwrap();
        assert_eq!(runner.keep_going, Some(true));
        let engine = config.engine.unwrap();
        assert_eq!(engine.cutoff.unwrap().to_string(), "10A");
        assert_eq!(engine.timestep.unwrap().to_string(), "4fs");
        assert_eq!(engine.timeout.unwrap().to_string(), "60 s");
        assert_eq!(engine.frame_frequency.unwrap().to_string(), "20ps");
        assert_eq!(engine.oversubscription_factor, Some(2));
        assert_eq!(engine.save_energy_components, Some(false));
        assert!(engine.energy_frequency.is_none());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[engine]\ncutof = \"12A\"\n").unwrap();

        let result = FileConfig::from_file(&path);
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }

    #[test]
    fn invalid_quantities_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[engine]\ntimestep = \"2 parsecs\"\n").unwrap();

        assert!(matches!(
            FileConfig::from_file(&path),
            Err(CliError::FileParsing { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        let result = FileConfig::from_file(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(CliError::Io(_))));
    }
}
