use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use mlipsample::engine::progress::{Progress, ProgressCallback};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 100;
const BATCH_MESSAGE: &str = "Featurizing";

struct BarState {
    bar: ProgressBar,
    phase: &'static str,
    failed_batches: usize,
}

impl BarState {
    fn batch_message(&self) -> String {
        match self.failed_batches {
            0 => BATCH_MESSAGE.to_string(),
            n => format!("{} ({} failed)", BATCH_MESSAGE, n),
        }
    }
}

/// Renders engine progress events as an indicatif spinner or bar on stderr.
#[derive(Clone)]
pub struct CliProgressHandler {
    state: Arc<Mutex<BarState>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        Self::with_draw_target(ProgressDrawTarget::stderr())
    }

    /// Handler that draws nothing, for `--quiet` runs and tests.
    pub fn hidden() -> Self {
        Self::with_draw_target(ProgressDrawTarget::hidden())
    }

    fn with_draw_target(target: ProgressDrawTarget) -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), target).with_style(Self::spinner_style());
        bar.finish_and_clear();

        Self {
            state: Arc::new(Mutex::new(BarState {
                bar,
                phase: "",
                failed_batches: 0,
            })),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let state = self.state.clone();

        Box::new(move |progress: Progress| {
            let Ok(mut state) = state.lock() else {
                warn!("Progress state mutex was poisoned. Cannot update progress.");
                return;
            };

            match progress {
                Progress::PhaseStart { name } => {
                    state.phase = name;
                    let bar = &state.bar;
                    bar.reset();
                    bar.set_length(0);
                    bar.set_style(Self::spinner_style());
                    bar.set_message(name);
                    bar.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                }
                Progress::PhaseFinish => {
                    state.bar.disable_steady_tick();
                    state.bar.finish_with_message(format!("✓ {}", state.phase));
                }
                Progress::TaskStart { total_steps } => {
                    state.failed_batches = 0;
                    let bar = &state.bar;
                    bar.disable_steady_tick();
                    bar.reset();
                    bar.set_length(total_steps);
                    bar.set_style(Self::bar_style());
                    bar.set_message(BATCH_MESSAGE);
                }
                Progress::TaskIncrement { amount } => state.bar.inc(amount),
                Progress::TaskFinish => {
                    if let Some(length) = state.bar.length() {
                        state.bar.set_position(length);
                    }
                    state.bar.finish();
                }
                Progress::BatchFailed { batch_id } => {
                    state.failed_batches += 1;
                    let message = state.batch_message();
                    state.bar.set_message(message);
                    state
                        .bar
                        .println(format!("  ✗ Batch {} failed and was skipped", batch_id));
                }
                Progress::Message(msg) if state.bar.is_finished() => state.bar.set_message(msg),
                Progress::Message(msg) => state.bar.println(format!("  {}", msg)),
            }
        })
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} [{elapsed}] {msg}")
            .expect("Failed to create spinner style template")
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "{msg:<22} {wide_bar:.cyan/blue} {pos}/{len} batches ({per_sec}, eta {eta})",
        )
        .expect("Failed to create bar style template")
        .progress_chars("=> ")
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}
