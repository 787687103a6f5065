use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use latticegen::engine::progress::{Progress, ProgressCallback};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;

/// Drives one indicatif bar from the generator's progress events: a spinner for single
/// jobs, a counting bar for batches.
#[derive(Clone)]
pub struct CliProgressHandler {
    pb: Arc<Mutex<ProgressBar>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        let pb = ProgressBar::new(0).with_style(Self::spinner_style());
        pb.set_draw_target(ProgressDrawTarget::stderr());
        pb.finish_and_clear();

        Self {
            pb: Arc::new(Mutex::new(pb)),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let pb_clone = self.pb.clone();

        Box::new(move |progress: Progress| {
            let Ok(pb) = pb_clone.lock() else {
                warn!("Progress bar mutex was poisoned. Cannot update progress.");
                return;
            };
            Self::apply(&pb, progress);
        })
    }

    fn apply(pb: &ProgressBar, progress: Progress) {
        match progress {
            Progress::StudyStart { run_id, total_jobs } => {
                pb.reset();
                pb.set_length(total_jobs);
                if total_jobs > 1 {
                    pb.disable_steady_tick();
                    pb.set_style(Self::bar_style());
                } else {
                    pb.set_style(Self::spinner_style());
                    pb.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                }
                pb.set_message(run_id);
            }
            Progress::JobGenerated { job_id } => {
                pb.inc(1);
                pb.set_message(job_id);
            }
            Progress::JobSkipped {
                job_id,
                stage,
                reason,
            } => {
                let headline = reason.lines().next().unwrap_or_default();
                pb.println(format!("  ⚠ Skipped {} [{}]: {}", job_id, stage, headline));
                pb.inc(1);
                pb.set_message(format!("skipped {}", job_id));
            }
            Progress::StudyFinish { generated, skipped } => {
                pb.disable_steady_tick();
                pb.finish_with_message(format!("✓ {} generated, {} skipped", generated, skipped));
            }
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template("{msg:<20} [{bar:40.cyan/blue}] {pos}/{len} jobs ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .with_key(
                "eta",
                |state: &ProgressState, w: &mut dyn std::fmt::Write| {
                    let _ = write!(w, "{:.1}s", state.eta().as_secs_f64());
                },
            )
            .progress_chars("##-")
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn handler_initializes_in_a_clean_state() {
        let handler = CliProgressHandler::new();
        let pb = handler.pb.lock().unwrap();
        assert_eq!(pb.length(), Some(0));
        assert!(pb.is_finished());
    }

    #[test]
    fn batch_counts_generated_and_skipped_jobs() {
        let handler = CliProgressHandler::new();
        let callback = handler.get_callback();

        callback(Progress::StudyStart {
            run_id: "run_sweep".to_string(),
            total_jobs: 3,
        });
        {
            let pb = handler.pb.lock().unwrap();
            assert_eq!(pb.length(), Some(3));
            assert_eq!(pb.message(), "run_sweep");
            assert!(!pb.is_finished());
        }

        callback(Progress::JobGenerated {
            job_id: "job_001".to_string(),
        });
        callback(Progress::JobSkipped {
            job_id: "job_002".to_string(),
            stage: "geometry",
            reason: "Geometry validation failed for job_002:\nErrors (1):".to_string(),
        });
        {
            let pb = handler.pb.lock().unwrap();
            assert_eq!(pb.position(), 2);
            assert_eq!(pb.message(), "skipped job_002");
        }

        callback(Progress::JobGenerated {
            job_id: "job_003".to_string(),
        });
        callback(Progress::StudyFinish {
            generated: 2,
            skipped: 1,
        });
        let pb = handler.pb.lock().unwrap();
        assert!(pb.is_finished());
        assert_eq!(pb.position(), 3);
        assert_eq!(pb.message(), "✓ 2 generated, 1 skipped");
    }

    #[test]
    fn callback_is_thread_safe() {
        let handler = CliProgressHandler::new();
        let callback = handler.get_callback();

        thread::spawn(move || {
            callback(Progress::StudyStart {
                run_id: "run_single".to_string(),
                total_jobs: 1,
            });
            callback(Progress::JobGenerated {
                job_id: "job_001".to_string(),
            });
            callback(Progress::StudyFinish {
                generated: 1,
                skipped: 0,
            });
        })
        .join()
        .unwrap();

        let pb = handler.pb.lock().unwrap();
        assert!(pb.is_finished());
        assert_eq!(pb.position(), 1);
        assert_eq!(pb.message(), "✓ 1 generated, 0 skipped");
    }
}
