/// Events emitted while a run generates its jobs.
///
/// Every job of a run ends in exactly one `JobGenerated` or `JobSkipped`, and every
/// `StudyStart` is closed by a `StudyFinish`, also when the run aborts.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    StudyStart { run_id: String, total_jobs: u64 },
    JobGenerated { job_id: String },
    JobSkipped {
        job_id: String,
        stage: &'static str,
        reason: String,
    },
    StudyFinish { generated: usize, skipped: usize },
}

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
    use std::sync::Mutex;

    #[test]
    fn forwards_events_in_order() {
        let seen = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            seen.lock().unwrap().push(event);
        }));

        reporter.report(Progress::StudyStart {
            run_id: "run_a".to_string(),
            total_jobs: 1,
        });
        reporter.report(Progress::JobSkipped {
            job_id: "job_001".to_string(),
            stage: "geometry",
            reason: "overlap".to_string(),
        });
        reporter.report(Progress::StudyFinish {
            generated: 0,
            skipped: 1,
        });
        drop(reporter);

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), 3);
        assert!(matches!(seen[1], Progress::JobSkipped { stage: "geometry", .. }));
        assert_eq!(
            seen[2],
            Progress::StudyFinish {
                generated: 0,
                skipped: 1
            }
        );
    }

    #[test]
    fn reporter_without_callback_is_silent() {
        ProgressReporter::new().report(Progress::JobGenerated {
            job_id: "job_001".to_string(),
        });
    }
}
