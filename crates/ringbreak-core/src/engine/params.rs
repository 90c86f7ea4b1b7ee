use super::config::ConfigError;
use crate::core::quantity::{Energy, ForceConstant, Time};
use tracing::{error, info, warn};

pub const DEFAULT_REPLICATES: [u32; 3] = [1, 2, 3];
pub const DEFAULT_REST2_SCALE: f64 = 1.0;

/// Raw run request as supplied on the command line. Durations are in picoseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct RunParameters {
    pub equilibration_time: u64,
    pub production_time: u64,
    pub restraints_strength: String,
    pub system_name: String,
    pub replicate: Option<u32>,
    pub use_hrex: bool,
    pub use_rest2: bool,
    pub bond_strength: f64,
    pub restart: bool,
    pub extend_time: Option<u64>,
    pub ghost_mods: bool,
    pub rest2_scale: Option<u32>,
    pub focused_sampling: bool,
}

/// How configurations are sampled across the lambda schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SamplingMode {
    Independent,
    ReplicaExchange,
    ReplicaExchangeRest2 { scale: f64 },
}

impl SamplingMode {
    pub fn uses_replica_exchange(&self) -> bool {
        !matches!(self, SamplingMode::Independent)
    }

    pub fn rest2_scale(&self) -> Option<f64> {
        match self {
            SamplingMode::ReplicaExchangeRest2 { scale } => Some(*scale),
            _ => None,
        }
    }
}

/// The replicate indices one invocation runs, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicateSet(Vec<u32>);

impl ReplicateSet {
    pub fn from_request(replicate: Option<u32>) -> Self {
        match replicate {
            Some(index) => Self(vec![index]),
            None => Self(DEFAULT_REPLICATES.to_vec()),
        }
    }

    pub fn indices(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Parameters after validation, with physical values carried as typed quantities.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRun {
    pub system_name: String,
    pub restraints_strength: String,
    pub dissociation_energy: Energy,
    pub bond_strength: f64,
    pub force_constant: ForceConstant,
    pub equilibration_time: Time,
    pub production_time: Time,
    pub runtime: Time,
    pub restart: bool,
    pub ghost_mods: bool,
    pub focused_sampling: bool,
    pub sampling: SamplingMode,
    pub replicates: ReplicateSet,
}

impl RunParameters {
    /// Checks the request before anything touches the filesystem.
    pub fn validate(&self) -> Result<ValidatedRun, ConfigError> {
        self.check().inspect_err(|e| error!("Invalid run parameters: {}", e))
    }

    fn check(&self) -> Result<ValidatedRun, ConfigError> {
        if self.extend_time.is_some() && !self.restart {
            return Err(ConfigError::ExtensionWithoutRestart);
        }

        let name = self.system_name.trim();
        if name.is_empty() || name.contains(['/', '\\']) || name != self.system_name {
            return Err(ConfigError::InvalidSystemName(self.system_name.clone()));
        }

        if self.production_time == 0 {
            return Err(ConfigError::NonPositiveDuration("production time"));
        }

        let de: f64 = self
            .restraints_strength
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidRestraintStrength(self.restraints_strength.clone()))?;
        let dissociation_energy = Energy::kcal_per_mol(de)?;
        let force_constant = ForceConstant::kcal_per_mol_per_angstrom2(self.bond_strength)?;

        let sampling = match (self.use_hrex, self.use_rest2) {
            (false, false) => SamplingMode::Independent,
            (true, false) => SamplingMode::ReplicaExchange,
            (true, true) => {
                let scale = match self.rest2_scale {
                    Some(0) => return Err(ConfigError::InvalidRest2Scale(0)),
                    Some(scale) => f64::from(scale),
                    None => DEFAULT_REST2_SCALE,
                };
                SamplingMode::ReplicaExchangeRest2 { scale }
            }
            (false, true) => return Err(ConfigError::Rest2WithoutReplicaExchange),
        };
        if self.rest2_scale.is_some() && !self.use_rest2 {
            warn!("A REST2 scale was given without --use_rest2; it will be ignored.");
        }

        let production_time = Time::picoseconds(self.production_time);
        let runtime = match (self.restart, self.extend_time) {
            (true, Some(extension)) => {
                let extended = production_time.extended_by(Time::picoseconds(extension));
                info!(
                    "Extending production time by {} ps to {}",
                    extension, extended
                );
                extended
            }
            _ => production_time,
        };

        Ok(ValidatedRun {
            system_name: self.system_name.clone(),
            restraints_strength: self.restraints_strength.clone(),
            dissociation_energy,
            bond_strength: self.bond_strength,
            force_constant,
            equilibration_time: Time::picoseconds(self.equilibration_time),
            production_time,
            runtime,
            restart: self.restart,
            ghost_mods: self.ghost_mods,
            focused_sampling: self.focused_sampling,
            sampling,
            replicates: ReplicateSet::from_request(self.replicate),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn example_parameters() -> RunParameters {
        RunParameters {
            equilibration_time: 100,
            production_time: 500,
            restraints_strength: "5".to_string(),
            system_name: "chk1_compound_20_to_17_X".to_string(),
            replicate: Some(2),
            use_hrex: false,
            use_rest2: false,
            bond_strength: 10.0,
            restart: false,
            extend_time: None,
            ghost_mods: false,
            rest2_scale: None,
            focused_sampling: false,
        }
    }

    #[test]
    fn extension_without_restart_is_rejected() {
        let params = RunParameters {
            extend_time: Some(50),
            ..example_parameters()
        };
        assert_eq!(params.validate(), Err(ConfigError::ExtensionWithoutRestart));
    }

    #[test]
    fn restart_with_extension_adds_to_production_time() {
        let params = RunParameters {
            restart: true,
            extend_time: Some(50),
            ..example_parameters()
        };
        let run = params.validate().unwrap();
        assert_eq!(run.runtime.to_string(), "550ps");
        assert_eq!(run.production_time.to_string(), "500ps");
    }

    #[test]
    fn runtime_equals_production_time_otherwise() {
        let fresh = example_parameters().validate().unwrap();
        assert_eq!(fresh.runtime.to_string(), "500ps");

        let restart = RunParameters {
            restart: true,
            ..example_parameters()
        };
        assert_eq!(restart.validate().unwrap().runtime.to_string(), "500ps");
    }

    #[test]
    fn replicate_set_defaults_to_three_in_order() {
        assert_eq!(ReplicateSet::from_request(None).indices(), &[1, 2, 3]);
        assert_eq!(ReplicateSet::from_request(Some(7)).indices(), &[7]);
    }

    #[test]
    fn sampling_mode_follows_flags() {
        let hrex = RunParameters {
            use_hrex: true,
            ..example_parameters()
        };
        assert_eq!(
            hrex.validate().unwrap().sampling,
            SamplingMode::ReplicaExchange
        );

        let rest2 = RunParameters {
            use_hrex: true,
            use_rest2: true,
            ..example_parameters()
        };
        assert_eq!(
            rest2.validate().unwrap().sampling,
            SamplingMode::ReplicaExchangeRest2 { scale: 1.0 }
        );

        let scaled = RunParameters {
            use_hrex: true,
            use_rest2: true,
            rest2_scale: Some(3),
            ..example_parameters()
        };
        assert_eq!(scaled.validate().unwrap().sampling.rest2_scale(), Some(3.0));
    }

    #[test]
    fn rest2_requires_replica_exchange() {
        let params = RunParameters {
            use_rest2: true,
            ..example_parameters()
        };
        assert_eq!(
            params.validate(),
            Err(ConfigError::Rest2WithoutReplicaExchange)
        );
    }

    #[test]
    fn zero_rest2_scale_is_rejected() {
        let params = RunParameters {
            use_hrex: true,
            use_rest2: true,
            rest2_scale: Some(0),
            ..example_parameters()
        };
        assert_eq!(params.validate(), Err(ConfigError::InvalidRest2Scale(0)));
    }

    #[test]
    fn restraint_strength_must_be_numeric() {
        let params = RunParameters {
            restraints_strength: "strong".to_string(),
            ..example_parameters()
        };
        assert_eq!(
            params.validate(),
            Err(ConfigError::InvalidRestraintStrength("strong".to_string()))
        );
    }

    #[test]
    fn system_name_cannot_escape_output_tree() {
        for name in ["", "../chk1_compound_20_to_17", " padded"] {
            let params = RunParameters {
                system_name: name.to_string(),
                ..example_parameters()
            };
            assert!(matches!(
                params.validate(),
                Err(ConfigError::InvalidSystemName(_))
            ));
        }
    }

    #[test]
    fn zero_production_time_is_rejected() {
        let params = RunParameters {
            production_time: 0,
            ..example_parameters()
        };
        assert_eq!(
            params.validate(),
            Err(ConfigError::NonPositiveDuration("production time"))
        );
    }
}
