//! Run report saved as `report.json` next to a run's artifacts, whether the
//! run succeeded or not.

use std::{path::PathBuf, sync::Mutex, time::Instant};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Stage, StudioError},
    types::QualityReport,
    workflow::{Progress, RunArtifacts, StageEvent},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepTiming {
    pub stage: Stage,
    pub seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub duration_seconds: f64,
    pub success: bool,
    /// Stages that finished, in order; retried stages appear once per attempt
    pub steps: Vec<StepTiming>,
    pub failed_stage: Option<Stage>,
    pub error: Option<String>,
    pub files: Vec<PathBuf>,
    /// Script generations made, including the accepted one
    pub attempts: u32,
    pub gate_exhausted: bool,
    /// Gate report of the accepted script
    pub quality: Option<QualityReport>,
}

struct GateSummary {
    attempts: u32,
    exhausted: bool,
    report: QualityReport,
}

#[derive(Default)]
struct Recorded {
    open: Option<(Stage, Instant)>,
    steps: Vec<StepTiming>,
    gate: Option<GateSummary>,
}

/// Forwards stage events to the caller's observer while timing them
pub(crate) struct RunRecorder<'a> {
    inner: &'a dyn Progress,
    started_at: DateTime<Local>,
    clock: Instant,
    state: Mutex<Recorded>,
}

impl<'a> RunRecorder<'a> {
    pub(crate) fn new(inner: &'a dyn Progress) -> Self {
        Self {
            inner,
            started_at: Local::now(),
            clock: Instant::now(),
            state: Mutex::new(Recorded::default()),
        }
    }

    pub(crate) fn record_gate(&self, attempts: u32, exhausted: bool, report: &QualityReport) {
        if let Ok(mut state) = self.state.lock() {
            state.gate = Some(GateSummary {
                attempts,
                exhausted,
                report: report.clone(),
            });
        }
    }

    pub(crate) fn report(&self, artifacts: &RunArtifacts, error: Option<&StudioError>) -> RunReport {
        let (steps, open, gate) = match self.state.lock() {
            Ok(mut state) => (
                std::mem::take(&mut state.steps),
                state.open.take().map(|(stage, _)| stage),
                state.gate.take(),
            ),
            Err(_) => (Vec::new(), None, None),
        };

        let (mut attempts, mut gate_exhausted, quality) = match gate {
            Some(gate) => (gate.attempts, gate.exhausted, Some(gate.report)),
            None => (0, false, None),
        };
        if let Some(StudioError::QualityGateExhausted { attempts: made, .. }) = error {
            attempts = *made;
            gate_exhausted = true;
        }

        RunReport {
            run_id: artifacts
                .run_dir
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            started_at: self.started_at,
            finished_at: Local::now(),
            duration_seconds: self.clock.elapsed().as_secs_f64(),
            success: error.is_none(),
            steps,
            failed_stage: error.and_then(|e| open.or_else(|| e.stage())),
            error: error.map(|e| e.to_string()),
            files: artifacts.files(),
            attempts,
            gate_exhausted,
            quality,
        }
    }
}

impl Progress for RunRecorder<'_> {
    fn on_event(&self, event: &StageEvent) {
        if let Ok(mut state) = self.state.lock() {
            match event {
                StageEvent::Started(stage) => state.open = Some((*stage, Instant::now())),
                StageEvent::Finished(stage) => {
                    if let Some((open, since)) = state.open.take() {
                        if open == *stage {
                            state.steps.push(StepTiming {
                                stage: open,
                                seconds: since.elapsed().as_secs_f64(),
                            });
                        }
                    }
                }
                StageEvent::Retrying { .. } => {}
            }
        }
        self.inner.on_event(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{types::Grade, workflow::NoProgress};

    fn artifacts() -> RunArtifacts {
        RunArtifacts {
            run_dir: PathBuf::from("/out/20261016-093000-1a2b3c4d"),
            idea: Some(PathBuf::from("/out/20261016-093000-1a2b3c4d/idea.json")),
            ..RunArtifacts::default()
        }
    }

    #[test]
    fn finished_stages_are_timed_in_order() {
        let recorder = RunRecorder::new(&NoProgress);
        recorder.on_event(&StageEvent::Started(Stage::Idea));
        recorder.on_event(&StageEvent::Finished(Stage::Idea));
        recorder.on_event(&StageEvent::Started(Stage::Script));
        recorder.on_event(&StageEvent::Finished(Stage::Script));

        let report = recorder.report(&artifacts(), None);
        assert!(report.success);
        assert_eq!(report.run_id, "20261016-093000-1a2b3c4d");
        assert_eq!(
            report.steps.iter().map(|s| s.stage).collect::<Vec<_>>(),
            vec![Stage::Idea, Stage::Script]
        );
        assert_eq!(report.files, vec![PathBuf::from("/out/20261016-093000-1a2b3c4d/idea.json")]);
        assert_eq!(report.failed_stage, None);
        assert!(report.finished_at >= report.started_at);
    }

    #[test]
    fn failure_names_the_stage_left_open() {
        let recorder = RunRecorder::new(&NoProgress);
        recorder.on_event(&StageEvent::Started(Stage::Metadata));
        let err = StudioError::Generation {
            stage: Stage::Metadata,
            reason: "title is empty".into(),
        };

        let report = recorder.report(&artifacts(), Some(&err));
        assert!(!report.success);
        assert_eq!(report.failed_stage, Some(Stage::Metadata));
        assert!(report.steps.is_empty());
        assert_eq!(
            report.error.as_deref(),
            Some("metadata: generation failed: title is empty")
        );
    }

    #[test]
    fn gate_outcome_is_carried() {
        let recorder = RunRecorder::new(&NoProgress);
        let quality = QualityReport {
            passed: false,
            violations: vec!["hook: section missing".into()],
            score: 90.0,
            grade: Grade::A,
            recommendations: vec!["Add the missing hook section".into()],
        };
        recorder.record_gate(3, true, &quality);

        let report = recorder.report(&artifacts(), None);
        assert_eq!(report.attempts, 3);
        assert!(report.gate_exhausted);
        assert_eq!(report.quality, Some(quality));
    }
}
