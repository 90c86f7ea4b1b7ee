use crate::core::protocol::{self, Protocol};
use crate::core::system::SystemSnapshot;
use crate::engine::config::{self, EngineSettings};
use crate::engine::error::EngineError;
use crate::engine::params::{RunParameters, ValidatedRun};
use crate::engine::progress::{Progress, ProgressReporter, SIMULATION_PHASE};
use crate::engine::runner::{RunnerBackend, RunnerKind, create_runner};
use crate::engine::workdir::{DirectoryState, RunWorkDirectory, TopologyCopyStatus};
use std::path::PathBuf;
use tracing::{debug, error, info, instrument, warn};

pub const DEFAULT_INPUT_DIR: &str = "../prepared_rbfe_input_files";

/// What to do with the remaining replicates once one of them fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    #[default]
    AbortOnError,
    ContinueOnError,
}

#[derive(Debug, Clone)]
pub struct WorkflowOptions {
    pub input_dir: PathBuf,
    pub output_root: PathBuf,
    pub settings: EngineSettings,
    pub failure_policy: FailurePolicy,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output_root: PathBuf::from("."),
            settings: EngineSettings::default(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

/// Everything decided before the first directory is touched.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub run: ValidatedRun,
    pub protocol: Protocol,
    pub system_path: PathBuf,
}

#[derive(Debug)]
pub struct ReplicateReport {
    pub runner: RunnerKind,
    pub directory: DirectoryState,
    pub topology: TopologyCopyStatus,
}

#[derive(Debug)]
pub struct ReplicateOutcome {
    pub replicate: u32,
    pub work_dir: PathBuf,
    pub result: Result<ReplicateReport, EngineError>,
}

impl ReplicateOutcome {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Default)]
pub struct WorkflowReport {
    pub outcomes: Vec<ReplicateOutcome>,
    /// Replicates never attempted because an earlier one failed.
    pub skipped: Vec<u32>,
}

impl WorkflowReport {
    pub fn all_succeeded(&self) -> bool {
        self.skipped.is_empty() && self.outcomes.iter().all(ReplicateOutcome::succeeded)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ReplicateOutcome> {
        self.outcomes.iter().filter(|o| !o.succeeded())
    }
}

/// Validates the request and resolves the system's protocol. Has no side effects.
pub fn plan(params: &RunParameters, options: &WorkflowOptions) -> Result<RunPlan, EngineError> {
    let run = params.validate()?;
    let protocol = protocol::resolve(
        &run.system_name,
        run.force_constant,
        run.dissociation_energy,
    )
    .inspect_err(|e| error!("{}", e))?;
    let system_path = SystemSnapshot::path_for(&options.input_dir, &run.system_name);
    Ok(RunPlan {
        run,
        protocol,
        system_path,
    })
}

/// Runs every requested replicate, one after another.
///
/// Errors in validation, protocol lookup or system loading abort the whole call. Errors
/// inside a replicate are captured in its [`ReplicateOutcome`]; whether later replicates
/// still run is decided by [`WorkflowOptions::failure_policy`].
#[instrument(skip_all, name = "rbfe_workflow", fields(system = %params.system_name))]
pub fn run(
    params: &RunParameters,
    options: &WorkflowOptions,
    backend: &dyn RunnerBackend,
    reporter: &ProgressReporter,
) -> Result<WorkflowReport, EngineError> {
    let plan = plan(params, options)?;

    let system = SystemSnapshot::load(&plan.system_path)?;
    // The engine runs the unlinked system; the linked clone stays read-only.
    let reference = system.link_to_reference();
    debug!(
        "Prepared reference-linked snapshot of {:?}",
        reference.path()
    );

    let replicates = &plan.run.replicates;
    info!(
        "Running {} replicate(s) of '{}' with protocol '{}'.",
        replicates.len(),
        plan.run.system_name,
        plan.protocol.family
    );

    let mut report = WorkflowReport::default();
    let indices = replicates.indices();
    for (position, &replicate) in indices.iter().enumerate() {
        reporter.report(Progress::ReplicateStart {
            replicate,
            position: position + 1,
            total: indices.len(),
        });

        let work_dir =
            RunWorkDirectory::derive(&options.output_root, &plan.run, &plan.protocol, replicate);
        let result = run_replicate(&plan, &work_dir, options, &system, backend, reporter);

        if let Err(e) = &result {
            error!("Replicate {} failed: {}", replicate, e);
        }
        let succeeded = result.is_ok();
        reporter.report(Progress::ReplicateFinish {
            replicate,
            work_dir: work_dir.path().to_path_buf(),
            succeeded,
        });
        report.outcomes.push(ReplicateOutcome {
            replicate,
            work_dir: work_dir.path().to_path_buf(),
            result,
        });

        if !succeeded && options.failure_policy == FailurePolicy::AbortOnError {
            report.skipped = indices[position + 1..].to_vec();
            if !report.skipped.is_empty() {
                warn!(
                    "Aborting remaining replicates {:?} after failure.",
                    report.skipped
                );
            }
            break;
        }
    }

    Ok(report)
}

fn run_replicate(
    plan: &RunPlan,
    work_dir: &RunWorkDirectory,
    options: &WorkflowOptions,
    system: &SystemSnapshot,
    backend: &dyn RunnerBackend,
    reporter: &ProgressReporter,
) -> Result<ReplicateReport, EngineError> {
    reporter.report(Progress::PhaseStart {
        name: "Preparing directory",
    });
    let directory =
        work_dir
            .prepare(plan.run.restart)
            .map_err(|source| EngineError::WorkDirectory {
                path: work_dir.path().to_path_buf(),
                source,
            })?;
    match directory {
        DirectoryState::Cleaned => reporter.report(Progress::Message(
            "Removed output of a previous run".to_string(),
        )),
        DirectoryState::Preserved => reporter.report(Progress::Message(
            "Resuming from existing checkpoint directory".to_string(),
        )),
        DirectoryState::Created => {}
    }
    let config = config::assemble(
        &plan.run,
        &plan.protocol,
        &options.settings,
        work_dir.path().to_path_buf(),
    )?;
    reporter.report(Progress::PhaseFinish);

    let (runner_kind, mut runner) = create_runner(backend, &config, system);
    reporter.report(Progress::PhaseStart {
        name: SIMULATION_PHASE,
    });
    info!("Starting {} runner in {:?}", runner_kind, work_dir.path());
    runner.run()?;
    reporter.report(Progress::PhaseFinish);

    let topology = work_dir
        .copy_topologies()
        .map_err(|source| EngineError::Topology {
            path: work_dir.path().to_path_buf(),
            source,
        })?;

    Ok(ReplicateReport {
        runner: runner_kind,
        directory,
        topology,
    })
}
