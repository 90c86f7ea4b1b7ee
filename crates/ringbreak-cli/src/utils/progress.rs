use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use ringbreak::engine::progress::{Progress, ProgressCallback, SIMULATION_PHASE};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 120;

/// Shows one spinner line per replicate while the engine works.
///
/// The spinner is hidden while the external engine runs, since the engine writes to the
/// same terminal.
#[derive(Clone)]
pub struct CliProgressHandler {
    pb: Arc<Mutex<ProgressBar>>,
    replicate_label: Arc<Mutex<String>>,
    engine_running: Arc<AtomicBool>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        let pb = ProgressBar::new(0)
            .with_style(Self::spinner_style())
            .with_message("Initializing...");
        pb.set_draw_target(ProgressDrawTarget::stderr());
        pb.disable_steady_tick();
        pb.finish_and_clear();

        Self {
            pb: Arc::new(Mutex::new(pb)),
            replicate_label: Arc::new(Mutex::new(String::new())),
            engine_running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let pb_clone = self.pb.clone();
        let label_clone = self.replicate_label.clone();
        let engine_running = self.engine_running.clone();

        Box::new(move |progress: Progress| {
            let (Ok(pb_guard), Ok(mut label)) = (pb_clone.lock(), label_clone.lock()) else {
                warn!("Progress state mutex was poisoned. Cannot update progress.");
                return;
            };

            match progress {
                Progress::ReplicateStart {
                    replicate,
                    position,
                    total,
                } => {
                    *label = format!("[{}/{}] Replicate {}", position, total, replicate);
                    pb_guard.reset();
                    pb_guard.set_style(Self::spinner_style());
                    pb_guard.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                    pb_guard.set_message(label.clone());
                }
                Progress::PhaseStart { name } if name == SIMULATION_PHASE => {
                    pb_guard.set_message(format!("{}: {}", label, name));
                    pb_guard.println(format!("{}: {} (engine output follows)", label, name));
                    pb_guard.disable_steady_tick();
                    pb_guard.set_draw_target(ProgressDrawTarget::hidden());
                    engine_running.store(true, Ordering::SeqCst);
                }
                Progress::PhaseStart { name } => {
                    pb_guard.set_message(format!("{}: {}", label, name));
                }
                Progress::PhaseFinish => {
                    if engine_running.swap(false, Ordering::SeqCst) {
                        pb_guard.set_draw_target(ProgressDrawTarget::stderr());
                        pb_guard.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                    }
                    pb_guard.set_message(label.clone());
                }
                Progress::ReplicateFinish {
                    work_dir,
                    succeeded,
                    ..
                } => {
                    if engine_running.swap(false, Ordering::SeqCst) {
                        pb_guard.set_draw_target(ProgressDrawTarget::stderr());
                    }
                    pb_guard.disable_steady_tick();
                    let mark = if succeeded { "✓" } else { "✗" };
                    pb_guard.finish_with_message(format!(
                        "{} {} ({})",
                        mark,
                        label,
                        work_dir.display()
                    ));
                }
                Progress::Message(msg) => {
                    if !pb_guard.is_finished() {
                        pb_guard.println(format!("  {}", msg));
                    } else {
                        pb_guard.set_message(msg);
                    }
                }
            }
        })
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
            .expect("Failed to create spinner style template")
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}
