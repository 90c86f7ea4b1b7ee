use ringbreak::engine::params::RunParameters;
use ringbreak::workflows::rbfe::WorkflowOptions;

pub struct AppConfig {
    pub params: RunParameters,
    pub options: WorkflowOptions,
    pub runner_program: String,
    pub dry_run: bool,
}
