use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum Progress {
    ReplicateStart {
        replicate: u32,
        position: usize,
        total: usize,
    },
    PhaseStart {
        name: &'static str,
    },
    PhaseFinish,
    ReplicateFinish {
        replicate: u32,
        work_dir: PathBuf,
        succeeded: bool,
    },

    Message(String),
}

/// Phase during which the external engine owns the terminal.
pub const SIMULATION_PHASE: &str = "Running simulation";

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn reporter_without_callback_is_silent() {
        ProgressReporter::new().report(Progress::PhaseFinish);
    }

    #[test]
    fn reporter_forwards_events_to_callback() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let reporter = ProgressReporter::with_callback(Box::new(move |event| {
            if let Progress::PhaseStart { name } = event {
                sink.lock().unwrap().push(name);
            }
        }));

        reporter.report(Progress::PhaseStart { name: "Run" });
        reporter.report(Progress::PhaseFinish);

        assert_eq!(*seen.lock().unwrap(), vec!["Run"]);
    }
}
