use crate::config::AppConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use ringbreak::engine::params::RunParameters;
use ringbreak::engine::progress::ProgressReporter;
use ringbreak::engine::runner::{DryRunBackend, ProcessBackend, RunnerBackend};
use ringbreak::workflows::rbfe::{self, WorkflowReport};
use tracing::{info, warn};

pub fn run(config: AppConfig) -> Result<()> {
    let backend: Box<dyn RunnerBackend> = if config.dry_run {
        info!("Dry run requested; the simulation engine will not be started.");
        Box::new(DryRunBackend)
    } else {
        info!("Using simulation engine '{}'.", config.runner_program);
        Box::new(ProcessBackend::new(config.runner_program.clone()))
    };

    log_parameters(&config.params);

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Preparing '{}' ({})...",
        config.params.system_name,
        config
            .params
            .replicate
            .map_or("default replicates".to_string(), |r| format!("replicate {r}"))
    );
    let report = rbfe::run(&config.params, &config.options, backend.as_ref(), &reporter)?;

    summarize(&report)
}

fn log_parameters(params: &RunParameters) {
    let optional = |value: Option<String>| value.unwrap_or_else(|| "none".to_string());
    info!("Equilibration Time: {} picoseconds", params.equilibration_time);
    info!("Production Time: {} picoseconds", params.production_time);
    info!("Restraints Strength: {}", params.restraints_strength);
    info!("System Name: {}", params.system_name);
    info!("Replicate: {}", optional(params.replicate.map(|r| r.to_string())));
    info!("Hamiltonian Replica Exchange: {}", params.use_hrex);
    info!("REST2: {}", params.use_rest2);
    info!("Bond Strength: {}", params.bond_strength);
    info!("Restart: {}", params.restart);
    info!(
        "Extend Time: {}",
        optional(params.extend_time.map(|t| format!("{t} picoseconds")))
    );
    info!("Ghost Modifications: {}", params.ghost_mods);
    info!(
        "REST2 Scaling Factor: {}",
        optional(params.rest2_scale.map(|s| s.to_string()))
    );
    info!("Focused Sampling: {}", params.focused_sampling);
}

fn summarize(report: &WorkflowReport) -> Result<()> {
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(replicate) => println!(
                "  Replicate {}: {} runner finished in {}",
                outcome.replicate,
                replicate.runner,
                outcome.work_dir.display()
            ),
            Err(e) => println!("  Replicate {}: failed: {}", outcome.replicate, e),
        }
    }
    if !report.skipped.is_empty() {
        warn!("Replicates {:?} were not attempted.", report.skipped);
    }

    if report.all_succeeded() {
        return Ok(());
    }
    Err(CliError::ReplicatesFailed {
        failed: report.failures().count(),
        total: report.outcomes.len() + report.skipped.len(),
        skipped: report.skipped.clone(),
    })
}
