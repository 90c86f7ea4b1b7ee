use super::defaults::DefaultsConfig;
use super::file::{FileConfig, FileEngineConfig};
use super::models::AppConfig;
use crate::cli::{Cli, SimulationArgs};
use crate::error::{CliError, Result};
use ringbreak::engine::config::{CutoffType, EngineSettings};
use ringbreak::engine::params::RunParameters;
use ringbreak::workflows::rbfe::{FailurePolicy, WorkflowOptions};
use std::path::PathBuf;
use std::str::FromStr;

pub fn build_config(cli: &Cli) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();
    let args = &cli.execution;

    let file_config = if let Some(config_path) = &args.config {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };
    let mut file_config = apply_set_values(file_config, &args.set_values)?;

    let paths_file = file_config.paths.take().unwrap_or_default();
    let input_dir = args
        .input_dir
        .clone()
        .or(paths_file.input_dir)
        .unwrap_or_else(|| PathBuf::from(&defaults.input_dir));
    let output_root = args
        .output_root
        .clone()
        .or(paths_file.output_root)
        .unwrap_or_else(|| PathBuf::from(&defaults.output_root));

    let runner_file = file_config.runner.take().unwrap_or_default();
    let runner_program = args
        .runner
        .clone()
        .or(runner_file.program)
        .unwrap_or(defaults.runner_program);
    let failure_policy = if args.keep_going || runner_file.keep_going.unwrap_or(false) {
        FailurePolicy::ContinueOnError
    } else {
        FailurePolicy::AbortOnError
    };

    let settings = merge_engine_settings(file_config.engine.take().unwrap_or_default())?;

    Ok(AppConfig {
        params: run_parameters(&cli.simulation),
        options: WorkflowOptions {
            input_dir,
            output_root,
            settings,
            failure_policy,
        },
        runner_program,
        dry_run: args.dry_run,
    })
}

fn run_parameters(args: &SimulationArgs) -> RunParameters {
    RunParameters {
        equilibration_time: args.equib_time,
        production_time: args.prod_time,
        restraints_strength: args.restraints_strength.clone(),
        system_name: args.system_name.clone(),
        replicate: args.replicate,
        use_hrex: args.use_hrex,
        use_rest2: args.use_rest2,
        bond_strength: args.bond_strength,
        restart: args.restart,
        extend_time: args.extend_time,
        ghost_mods: args.ghost_mods,
        rest2_scale: args.rest2_scale,
        focused_sampling: args.focused_sampling,
    }
}

fn merge_engine_settings(file: FileEngineConfig) -> Result<EngineSettings> {
    let defaults = EngineSettings::default();
    let cutoff_type = match file.cutoff_type {
        Some(raw) => CutoffType::from_str(&raw).map_err(CliError::Config)?,
        None => defaults.cutoff_type,
    };
    Ok(EngineSettings {
        cutoff: file.cutoff.unwrap_or(defaults.cutoff),
        cutoff_type,
        timestep: file.timestep.unwrap_or(defaults.timestep),
        equilibration_timestep: file
            .equilibration_timestep
            .unwrap_or(defaults.equilibration_timestep),
        num_energy_neighbours: file
            .num_energy_neighbours
            .unwrap_or(defaults.num_energy_neighbours),
        energy_frequency: file.energy_frequency.unwrap_or(defaults.energy_frequency),
        frame_frequency: file.frame_frequency.unwrap_or(defaults.frame_frequency),
        checkpoint_frequency: file
            .checkpoint_frequency
            .unwrap_or(defaults.checkpoint_frequency),
        timeout: file.timeout.unwrap_or(defaults.timeout),
        equilibration_constraints: file
            .equilibration_constraints
            .unwrap_or(defaults.equilibration_constraints),
        multi_conformational_seeding: file
            .multi_conformational_seeding
            .unwrap_or(defaults.multi_conformational_seeding),
        save_energy_components: file
            .save_energy_components
            .unwrap_or(defaults.save_energy_components),
        oversubscription_factor: file
            .oversubscription_factor
            .unwrap_or(defaults.oversubscription_factor),
        log_level: file.log_level.unwrap_or(defaults.log_level),
        log_file: file.log_file.unwrap_or(defaults.log_file),
    })
}

fn parse_value<T: FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value)))
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value_str)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };

        if let Some(field) = key.strip_prefix("paths.") {
            let paths = config.paths.get_or_insert_with(Default::default);
            match field {
                "input-dir" => paths.input_dir = Some(PathBuf::from(value_str)),
                "output-root" => paths.output_root = Some(PathBuf::from(value_str)),
                _ => return Err(unsupported_key(key)),
            }
            continue;
        }

        if let Some(field) = key.strip_prefix("runner.") {
            let runner = config.runner.get_or_insert_with(Default::default);
            match field {
                "program" => runner.program = Some(value_str.to_string()),
                "keep-going" => runner.keep_going = Some(parse_value(key, value_str, "boolean")?),
                _ => return Err(unsupported_key(key)),
            }
            continue;
        }

        let Some(field) = key.strip_prefix("engine.") else {
            return Err(unsupported_key(key));
        };
        let engine = config.engine.get_or_insert_with(Default::default);
        match field {
            "cutoff" => engine.cutoff = Some(parse_value(key, value_str, "length")?),
            "cutoff-type" => engine.cutoff_type = Some(value_str.to_string()),
            "timestep" => engine.timestep = Some(parse_value(key, value_str, "time")?),
            "equilibration-timestep" => {
                engine.equilibration_timestep = Some(parse_value(key, value_str, "time")?)
            }
            "num-energy-neighbours" => {
                engine.num_energy_neighbours = Some(parse_value(key, value_str, "integer")?)
            }
            "energy-frequency" => {
                engine.energy_frequency = Some(parse_value(key, value_str, "time")?)
            }
            "frame-frequency" => {
                engine.frame_frequency = Some(parse_value(key, value_str, "time")?)
            }
            "checkpoint-frequency" => {
                engine.checkpoint_frequency = Some(parse_value(key, value_str, "time")?)
            }
            "timeout" => engine.timeout = Some(parse_value(key, value_str, "time")?),
            "equilibration-constraints" => {
                engine.equilibration_constraints = Some(parse_value(key, value_str, "boolean")?)
            }
            "multi-conformational-seeding" => {
                engine.multi_conformational_seeding =
                    Some(parse_value(key, value_str, "boolean")?)
            }
            "save-energy-components" => {
                engine.save_energy_components = Some(parse_value(key, value_str, "boolean")?)
            }
            "oversubscription-factor" => {
                engine.oversubscription_factor = Some(parse_value(key, value_str, "integer")?)
            }
            "log-level" => engine.log_level = Some(value_str.to_string()),
            "log-file" => engine.log_file = Some(value_str.to_string()),
            _ => return Err(unsupported_key(key)),
        }
    }
    Ok(config)
}

fn unsupported_key(key: &str) -> CliError {
    CliError::Config(format!(
        "Unsupported configuration key for --set: '{}'",
        key
    ))
}
