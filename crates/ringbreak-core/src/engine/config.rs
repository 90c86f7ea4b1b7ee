use super::params::{SamplingMode, ValidatedRun};
use crate::core::lambda::{LambdaError, LambdaSchedule, LambdaWindow};
use crate::core::protocol::Protocol;
use crate::core::quantity::{Length, QuantityError, Time, TimeUnit};
use crate::core::restraint::{AtomSelection, MorseRestraint};
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("An extension time was given without --restart; extending requires restarting from a checkpoint")]
    ExtensionWithoutRestart,

    #[error("REST2 requires Hamiltonian replica exchange; pass --use_hrex together with --use_rest2")]
    Rest2WithoutReplicaExchange,

    #[error("REST2 scale must be at least 1, got {0}")]
    InvalidRest2Scale(u32),

    #[error("Restraint strength '{0}' is not a number")]
    InvalidRestraintStrength(String),

    #[error("Invalid system name '{0}'")]
    InvalidSystemName(String),

    #[error("The {0} must be greater than zero")]
    NonPositiveDuration(&'static str),

    #[error("'{field}' is only meaningful with replica exchange enabled")]
    RequiresReplicaExchange { field: &'static str },

    #[error(transparent)]
    Quantity(#[from] QuantityError),

    #[error(transparent)]
    Lambda(#[from] LambdaError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CutoffType {
    #[default]
    Pme,
    ReactionField,
}

impl fmt::Display for CutoffType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CutoffType::Pme => f.write_str("PME"),
            CutoffType::ReactionField => f.write_str("RF"),
        }
    }
}

impl std::str::FromStr for CutoffType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PME" => Ok(CutoffType::Pme),
            "RF" | "REACTION_FIELD" | "REACTION-FIELD" => Ok(CutoffType::ReactionField),
            other => Err(format!("Unknown cutoff type '{}'. Expected 'PME' or 'RF'.", other)),
        }
    }
}

impl Serialize for CutoffType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Engineering constants shared by every replicate of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub cutoff: Length,
    pub cutoff_type: CutoffType,
    pub timestep: Time,
    pub equilibration_timestep: Time,
    pub num_energy_neighbours: u32,
    pub energy_frequency: Time,
    pub frame_frequency: Time,
    pub checkpoint_frequency: Time,
    pub timeout: Time,
    pub equilibration_constraints: bool,
    pub multi_conformational_seeding: bool,
    pub save_energy_components: bool,
    pub oversubscription_factor: u32,
    pub log_level: String,
    pub log_file: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            cutoff: Length::angstroms_unchecked(12.0),
            cutoff_type: CutoffType::Pme,
            timestep: Time::new_unchecked(2.0, TimeUnit::Femtosecond),
            equilibration_timestep: Time::new_unchecked(1.0, TimeUnit::Femtosecond),
            num_energy_neighbours: 2,
            energy_frequency: Time::new_unchecked(1.0, TimeUnit::Picosecond),
            frame_frequency: Time::new_unchecked(100.0, TimeUnit::Picosecond),
            checkpoint_frequency: Time::new_unchecked(100.0, TimeUnit::Picosecond),
            timeout: Time::new_unchecked(30.0, TimeUnit::Second),
            equilibration_constraints: true,
            multi_conformational_seeding: false,
            save_energy_components: true,
            oversubscription_factor: 1,
            log_level: "debug".to_string(),
            log_file: "output.log".to_string(),
        }
    }
}

fn window_as_range<S: Serializer>(
    window: &Option<LambdaWindow>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match window {
        Some(w) => w.as_range().serialize(serializer),
        None => serializer.serialize_none(),
    }
}

/// The complete parameter record handed to the simulation engine for one replicate.
///
/// Field names follow the engine's configuration keys. Nested tables (`restraints`) are
/// declared last so that the record serializes to valid TOML.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationConfig {
    pub log_level: String,
    pub log_file: String,
    pub cutoff: Length,
    pub cutoff_type: CutoffType,
    pub timestep: Time,
    pub num_energy_neighbours: u32,
    pub runtime: Time,
    pub restart: bool,
    pub lambda_schedule: String,
    pub lambda_values: Vec<f64>,
    pub lambda_energy: Vec<f64>,
    pub equilibration_time: Time,
    pub equilibration_timestep: Time,
    pub equilibration_constraints: bool,
    pub multi_conformational_seeding: bool,
    pub energy_frequency: Time,
    pub frame_frequency: Time,
    pub checkpoint_frequency: Time,
    pub save_energy_components: bool,
    pub timeout: Time,
    pub ghost_modifications: bool,
    pub output_directory: PathBuf,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "window_as_range"
    )]
    pub focused_sampling_lambda_range: Option<LambdaWindow>,
    pub replica_exchange: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oversubscription_factor: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rest2_scale: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rest2_selection: Option<AtomSelection>,
    pub restraints: MorseRestraint,
}

#[derive(Default)]
pub struct SimulationConfigBuilder {
    settings: EngineSettings,
    runtime: Option<Time>,
    restart: bool,
    schedule: Option<LambdaSchedule>,
    equilibration_time: Option<Time>,
    ghost_modifications: bool,
    output_directory: Option<PathBuf>,
    focused_window: Option<LambdaWindow>,
    replica_exchange: bool,
    rest2_scale: Option<f64>,
    rest2_selection: Option<AtomSelection>,
    restraints: Option<MorseRestraint>,
}

impl SimulationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }
    pub fn runtime(mut self, runtime: Time) -> Self {
        self.runtime = Some(runtime);
        self
    }
    pub fn restart(mut self, restart: bool) -> Self {
        self.restart = restart;
        self
    }
    pub fn lambda_schedule(mut self, schedule: LambdaSchedule) -> Self {
        self.schedule = Some(schedule);
        self
    }
    pub fn equilibration_time(mut self, time: Time) -> Self {
        self.equilibration_time = Some(time);
        self
    }
    pub fn ghost_modifications(mut self, enabled: bool) -> Self {
        self.ghost_modifications = enabled;
        self
    }
    pub fn output_directory(mut self, path: PathBuf) -> Self {
        self.output_directory = Some(path);
        self
    }
    pub fn focused_sampling(mut self, window: Option<LambdaWindow>) -> Self {
        self.focused_window = window;
        self
    }
    pub fn replica_exchange(mut self, enabled: bool) -> Self {
        self.replica_exchange = enabled;
        self
    }
    pub fn rest2(mut self, scale: f64, selection: AtomSelection) -> Self {
        self.rest2_scale = Some(scale);
        self.rest2_selection = Some(selection);
        self
    }
    pub fn restraints(mut self, restraint: MorseRestraint) -> Self {
        self.restraints = Some(restraint);
        self
    }

    pub fn build(self) -> Result<SimulationConfig, ConfigError> {
        let runtime = self
            .runtime
            .ok_or(ConfigError::MissingParameter("runtime"))?;
        if runtime.is_zero() {
            return Err(ConfigError::NonPositiveDuration("runtime"));
        }
        for (name, time) in [
            ("timestep", self.settings.timestep),
            ("equilibration timestep", self.settings.equilibration_timestep),
            ("energy frequency", self.settings.energy_frequency),
        ] {
            if time.is_zero() {
                return Err(ConfigError::NonPositiveDuration(name));
            }
        }
        if !self.replica_exchange && self.rest2_scale.is_some() {
            return Err(ConfigError::RequiresReplicaExchange {
                field: "rest2_scale",
            });
        }

        let schedule = self
            .schedule
            .ok_or(ConfigError::MissingParameter("lambda_schedule"))?;
        let settings = self.settings;

        Ok(SimulationConfig {
            log_level: settings.log_level,
            log_file: settings.log_file,
            cutoff: settings.cutoff,
            cutoff_type: settings.cutoff_type,
            timestep: settings.timestep,
            num_energy_neighbours: settings.num_energy_neighbours,
            runtime,
            restart: self.restart,
            lambda_schedule: schedule.name().to_string(),
            lambda_values: schedule.values().to_vec(),
            lambda_energy: schedule.values().to_vec(),
            equilibration_time: self
                .equilibration_time
                .ok_or(ConfigError::MissingParameter("equilibration_time"))?,
            equilibration_timestep: settings.equilibration_timestep,
            equilibration_constraints: settings.equilibration_constraints,
            multi_conformational_seeding: settings.multi_conformational_seeding,
            energy_frequency: settings.energy_frequency,
            frame_frequency: settings.frame_frequency,
            checkpoint_frequency: settings.checkpoint_frequency,
            save_energy_components: settings.save_energy_components,
            timeout: settings.timeout,
            ghost_modifications: self.ghost_modifications,
            output_directory: self
                .output_directory
                .ok_or(ConfigError::MissingParameter("output_directory"))?,
            focused_sampling_lambda_range: self.focused_window,
            replica_exchange: self.replica_exchange,
            oversubscription_factor: self
                .replica_exchange
                .then_some(settings.oversubscription_factor),
            rest2_scale: self.rest2_scale,
            rest2_selection: self.rest2_selection,
            restraints: self
                .restraints
                .ok_or(ConfigError::MissingParameter("restraints"))?,
        })
    }
}

/// Merges the validated request, the system's protocol and the engine settings into the
/// configuration for one replicate written to `output_directory`.
pub fn assemble(
    run: &ValidatedRun,
    protocol: &Protocol,
    settings: &EngineSettings,
    output_directory: PathBuf,
) -> Result<SimulationConfig, ConfigError> {
    let mut builder = SimulationConfigBuilder::new()
        .settings(settings.clone())
        .runtime(run.runtime)
        .restart(run.restart)
        .equilibration_time(run.equilibration_time)
        .lambda_schedule(protocol.schedule.clone())
        .restraints(protocol.restraint.clone())
        .ghost_modifications(run.ghost_mods)
        .output_directory(output_directory)
        .focused_sampling(run.focused_sampling.then_some(LambdaWindow::FOCUSED))
        .replica_exchange(run.sampling.uses_replica_exchange());

    if let SamplingMode::ReplicaExchangeRest2 { scale } = run.sampling {
        builder = builder.rest2(scale, protocol.selection.clone());
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::protocol;
    use crate::engine::params::RunParameters;
    use crate::engine::params::tests::example_parameters;

    fn assemble_for(params: RunParameters) -> SimulationConfig {
        let run = params.validate().unwrap();
        let protocol =
            protocol::resolve(&run.system_name, run.force_constant, run.dissociation_energy)
                .unwrap();
        assemble(
            &run,
            &protocol,
            &EngineSettings::default(),
            PathBuf::from("dynamics_std/out"),
        )
        .unwrap()
    }

    #[test]
    fn default_settings_match_engineering_constants() {
        let config = assemble_for(example_parameters());
        assert_eq!(config.cutoff.to_string(), "12A");
        assert_eq!(config.cutoff_type.to_string(), "PME");
        assert_eq!(config.timestep.to_string(), "2fs");
        assert_eq!(config.equilibration_timestep.to_string(), "1fs");
        assert_eq!(config.equilibration_time.to_string(), "100ps");
        assert_eq!(config.num_energy_neighbours, 2);
        assert_eq!(config.energy_frequency.to_string(), "1ps");
        assert_eq!(config.frame_frequency.to_string(), "100ps");
        assert_eq!(config.checkpoint_frequency.to_string(), "100ps");
        assert_eq!(config.timeout.to_string(), "30 s");
        assert!(config.equilibration_constraints);
        assert!(!config.multi_conformational_seeding);
        assert!(config.save_energy_components);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_file, "output.log");
    }

    #[test]
    fn schedule_is_used_for_sampling_and_energies() {
        let config = assemble_for(example_parameters());
        assert_eq!(config.runtime.to_string(), "500ps");
        assert_eq!(config.lambda_schedule, "morse_ring_break_morph_2");
        assert_eq!(config.lambda_values.len(), 23);
        assert_eq!(config.lambda_values, config.lambda_energy);
        assert!(!config.replica_exchange);
        assert!(config.oversubscription_factor.is_none());
        assert!(config.focused_sampling_lambda_range.is_none());
    }

    #[test]
    fn focused_sampling_narrows_window_only() {
        let config = assemble_for(RunParameters {
            focused_sampling: true,
            ..example_parameters()
        });
        assert_eq!(
            config.focused_sampling_lambda_range.map(|w| w.as_range()),
            Some([0.7, 1.0])
        );
        assert_eq!(config.lambda_values.len(), 23);
    }

    #[test]
    fn replica_exchange_sets_oversubscription() {
        let config = assemble_for(RunParameters {
            use_hrex: true,
            ..example_parameters()
        });
        assert!(config.replica_exchange);
        assert_eq!(config.oversubscription_factor, Some(1));
        assert!(config.rest2_scale.is_none());
        assert!(config.rest2_selection.is_none());
    }

    #[test]
    fn rest2_attaches_scale_and_selection() {
        let config = assemble_for(RunParameters {
            use_hrex: true,
            use_rest2: true,
            rest2_scale: Some(2),
            ..example_parameters()
        });
        assert_eq!(config.rest2_scale, Some(2.0));
        assert_eq!(
            config.rest2_selection.as_ref().map(AtomSelection::as_str),
            Some("property is_perturbable and atomidx 22,23,24,25,26,46,47")
        );
    }

    #[test]
    fn builder_reports_missing_fields() {
        let result = SimulationConfigBuilder::new()
            .runtime(Time::picoseconds(10))
            .build();
        assert_eq!(
            result,
            Err(ConfigError::MissingParameter("lambda_schedule"))
        );
        assert_eq!(
            SimulationConfigBuilder::new().build(),
            Err(ConfigError::MissingParameter("runtime"))
        );
    }

    #[test]
    fn builder_rejects_rest2_without_replica_exchange() {
        let result = SimulationConfigBuilder::new()
            .runtime(Time::picoseconds(10))
            .rest2(1.0, AtomSelection::new("all"))
            .build();
        assert_eq!(
            result,
            Err(ConfigError::RequiresReplicaExchange {
                field: "rest2_scale"
            })
        );
    }

    #[test]
    fn serializes_to_engine_keys() {
        let config = assemble_for(RunParameters {
            focused_sampling: true,
            ..example_parameters()
        });
        let rendered = toml::to_string(&config).unwrap();
        assert!(rendered.contains("cutoff = \"12A\""));
        assert!(rendered.contains("cutoff_type = \"PME\""));
        assert!(rendered.contains("runtime = \"500ps\""));
        assert!(rendered.contains("timeout = \"30 s\""));
        assert!(rendered.contains("focused_sampling_lambda_range = ["));
        assert!(rendered.contains("[restraints]"));
        assert!(!rendered.contains("rest2_scale"));
    }
}
