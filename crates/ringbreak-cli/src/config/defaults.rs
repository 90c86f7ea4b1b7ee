use ringbreak::engine::runner::DEFAULT_RUNNER_PROGRAM;
use ringbreak::workflows::rbfe::DEFAULT_INPUT_DIR;

pub struct DefaultsConfig {
    pub input_dir: String,
    pub output_root: String,
    pub runner_program: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            input_dir: DEFAULT_INPUT_DIR.to_string(),
            output_root: ".".to_string(),
            runner_program: DEFAULT_RUNNER_PROGRAM.to_string(),
        }
    }
}
