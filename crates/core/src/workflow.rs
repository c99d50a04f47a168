//! Runs the stages in their fixed order and persists what each produces.
//!
//! idea -> script -> quality gate (regenerate the script on failure, bounded)
//! -> metadata -> media. Any error that is not a gate failure aborts the run
//! and is returned as is; artifacts already written stay on disk. Every run
//! directory ends with a `report.json`, successful or not.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::{
    artifacts::{
        create_run_dir, get_idea_path, get_metadata_path, get_report_path,
        get_script_markdown_path, get_script_path, get_video_path, get_work_dir, save_json,
        save_text,
    },
    client::TextGenerator,
    config::StudioConfig,
    error::{Result, Stage, StudioError},
    format::format_script_readable,
    ideas::{IdeaGenerator, PillarChoice},
    media::MediaAssembler,
    metadata::MetadataGenerator,
    quality::evaluate,
    report::RunRecorder,
    script::ScriptGenerator,
    templates::TemplateStore,
    types::{ContentIdea, Metadata, QualityReport, Script, VideoArtifact},
};

#[derive(Debug, Clone, PartialEq)]
pub enum StageEvent {
    Started(Stage),
    Finished(Stage),
    /// The gate rejected a script; `attempt` is the one about to start
    Retrying {
        attempt: u32,
        max_attempts: u32,
        violations: Vec<String>,
    },
}

/// Observer for stage transitions, e.g. CLI spinners
pub trait Progress: Send + Sync {
    fn on_event(&self, event: &StageEvent);
}

pub struct NoProgress;

impl Progress for NoProgress {
    fn on_event(&self, _event: &StageEvent) {}
}

#[derive(Debug, Clone)]
pub struct StudioOptions {
    pub output_dir: PathBuf,
    pub max_script_retries: u32,
    pub strict_quality: bool,
}

impl StudioOptions {
    pub fn from_config(config: &StudioConfig, output_dir: PathBuf) -> Self {
        Self {
            output_dir,
            max_script_retries: config.max_script_retries,
            strict_quality: config.strict_quality,
        }
    }
}

/// Where a video's script comes from
#[derive(Debug, Clone)]
pub enum ScriptSource {
    /// A saved script; it gets one gate pass since it cannot be regenerated.
    /// A failure is accepted like an exhausted budget unless strict.
    Saved(Script),
    Fresh(PillarChoice),
}

/// Files written by one invocation
#[derive(Debug, Clone, Default)]
pub struct RunArtifacts {
    pub run_dir: PathBuf,
    pub idea: Option<PathBuf>,
    pub script: Option<PathBuf>,
    pub script_markdown: Option<PathBuf>,
    pub metadata: Option<PathBuf>,
    pub video: Option<PathBuf>,
    pub report: Option<PathBuf>,
}

impl RunArtifacts {
    /// Artifacts written so far, in stage order; the report is not included
    pub fn files(&self) -> Vec<PathBuf> {
        [
            &self.idea,
            &self.script,
            &self.script_markdown,
            &self.metadata,
            &self.video,
        ]
        .into_iter()
        .flatten()
        .cloned()
        .collect()
    }
}

#[derive(Debug, Clone)]
pub struct WorkflowOutcome {
    pub artifacts: RunArtifacts,
    pub idea: ContentIdea,
    pub script: Option<Script>,
    /// Report of the accepted script
    pub quality: Option<QualityReport>,
    pub metadata: Option<Metadata>,
    pub video: Option<VideoArtifact>,
    /// Script generations made, including the accepted one
    pub attempts: u32,
    /// The accepted script still fails the gate
    pub gate_exhausted: bool,
}

struct GatedScript {
    script: Script,
    report: QualityReport,
    attempts: u32,
    exhausted: bool,
}

/// Script a video is made from
enum VideoScript {
    Gated(GatedScript),
    Fresh(PillarChoice),
}

pub struct Studio {
    client: Box<dyn TextGenerator>,
    templates: TemplateStore,
    media: Option<MediaAssembler>,
    options: StudioOptions,
}

impl Studio {
    pub fn new(client: Box<dyn TextGenerator>, templates: TemplateStore, options: StudioOptions) -> Self {
        Self {
            client,
            templates,
            media: None,
            options,
        }
    }

    /// Media backends are only needed by operations that render video
    pub fn with_media(mut self, media: MediaAssembler) -> Self {
        self.media = Some(media);
        self
    }

    pub fn templates(&self) -> &TemplateStore {
        &self.templates
    }

    pub async fn generate_idea(&self, choice: &PillarChoice, progress: &dyn Progress) -> Result<WorkflowOutcome> {
        let recorder = RunRecorder::new(progress);
        let mut run = self.start_run().await?;
        let result = self
            .idea_stage(choice, &mut run, &recorder)
            .await
            .map(|idea| outcome(run.clone(), idea));
        self.finish_run(&run, &recorder, result).await
    }

    /// Script for a given idea, or for a freshly generated one
    pub async fn generate_script(
        &self,
        idea: Option<ContentIdea>,
        choice: &PillarChoice,
        progress: &dyn Progress,
    ) -> Result<WorkflowOutcome> {
        let recorder = RunRecorder::new(progress);
        let mut run = self.start_run().await?;
        let result = self.script_run(idea, choice, &mut run, &recorder).await;
        self.finish_run(&run, &recorder, result).await
    }

    /// Full run. With `skip_video` it stops after metadata.
    pub async fn run_workflow(
        &self,
        choice: &PillarChoice,
        skip_video: bool,
        progress: &dyn Progress,
    ) -> Result<WorkflowOutcome> {
        let media = if skip_video { None } else { Some(self.media()?) };

        let recorder = RunRecorder::new(progress);
        let mut run = self.start_run().await?;
        let result = self.workflow_run(choice, media, &mut run, &recorder).await;
        self.finish_run(&run, &recorder, result).await
    }

    /// Metadata and video for a saved or freshly generated script
    pub async fn generate_video(&self, source: ScriptSource, progress: &dyn Progress) -> Result<WorkflowOutcome> {
        let media = self.media()?;

        let recorder = RunRecorder::new(progress);
        // a saved script is gated before any run directory exists
        let script = match source {
            ScriptSource::Saved(script) => VideoScript::Gated(self.gate_saved(script, &recorder)?),
            ScriptSource::Fresh(choice) => VideoScript::Fresh(choice),
        };
        let mut run = self.start_run().await?;
        let result = self.video_run(script, media, &mut run, &recorder).await;
        self.finish_run(&run, &recorder, result).await
    }

    async fn script_run(
        &self,
        idea: Option<ContentIdea>,
        choice: &PillarChoice,
        run: &mut RunArtifacts,
        recorder: &RunRecorder<'_>,
    ) -> Result<WorkflowOutcome> {
        let idea = match idea {
            Some(idea) => {
                self.templates.pillar(&idea.pillar)?;
                self.save_idea(&idea, run).await?;
                idea
            }
            None => self.idea_stage(choice, run, recorder).await?,
        };

        let gated = self.gated_script(&idea, recorder).await?;
        self.save_script(&gated.script, run).await?;
        Ok(with_script(outcome(run.clone(), idea), gated))
    }

    async fn workflow_run(
        &self,
        choice: &PillarChoice,
        media: Option<&MediaAssembler>,
        run: &mut RunArtifacts,
        recorder: &RunRecorder<'_>,
    ) -> Result<WorkflowOutcome> {
        let idea = self.idea_stage(choice, run, recorder).await?;
        let gated = self.gated_script(&idea, recorder).await?;
        self.save_script(&gated.script, run).await?;

        let metadata = self.metadata_stage(&gated.script, run, recorder).await?;
        let video = match media {
            Some(media) => Some(
                self.media_stage(media, &gated.script, &metadata, run, recorder)
                    .await?,
            ),
            None => None,
        };

        info!(run_dir = %run.run_dir.display(), "workflow complete");
        let mut result = with_script(outcome(run.clone(), idea), gated);
        result.metadata = Some(metadata);
        result.video = video;
        Ok(result)
    }

    async fn video_run(
        &self,
        script: VideoScript,
        media: &MediaAssembler,
        run: &mut RunArtifacts,
        recorder: &RunRecorder<'_>,
    ) -> Result<WorkflowOutcome> {
        let (idea, gated) = match script {
            VideoScript::Gated(gated) => {
                let idea = gated.script.idea.clone();
                self.save_idea(&idea, run).await?;
                (idea, gated)
            }
            VideoScript::Fresh(choice) => {
                let idea = self.idea_stage(&choice, run, recorder).await?;
                let gated = self.gated_script(&idea, recorder).await?;
                (idea, gated)
            }
        };
        self.save_script(&gated.script, run).await?;

        let metadata = self.metadata_stage(&gated.script, run, recorder).await?;
        let video = self
            .media_stage(media, &gated.script, &metadata, run, recorder)
            .await?;

        let mut result = with_script(outcome(run.clone(), idea), gated);
        result.metadata = Some(metadata);
        result.video = Some(video);
        Ok(result)
    }

    fn media(&self) -> Result<&MediaAssembler> {
        self.media.as_ref().ok_or(StudioError::MediaNotConfigured)
    }

    async fn start_run(&self) -> Result<RunArtifacts> {
        let run_dir = create_run_dir(&self.options.output_dir).await?;
        info!(run_dir = %run_dir.display(), "starting run");
        Ok(RunArtifacts {
            run_dir,
            ..RunArtifacts::default()
        })
    }

    /// Write `report.json`. A failed run keeps its original error even when
    /// the report cannot be written.
    async fn finish_run(
        &self,
        run: &RunArtifacts,
        recorder: &RunRecorder<'_>,
        result: Result<WorkflowOutcome>,
    ) -> Result<WorkflowOutcome> {
        let report = recorder.report(run, result.as_ref().err());
        let path = get_report_path(&run.run_dir);
        match result {
            Ok(mut outcome) => {
                save_json(&report, &path).await?;
                outcome.artifacts.report = Some(path);
                Ok(outcome)
            }
            Err(err) => {
                if let Err(save_err) = save_json(&report, &path).await {
                    warn!(file = %path.display(), error = %save_err, "could not write run report");
                }
                Err(err)
            }
        }
    }

    async fn save_idea(&self, idea: &ContentIdea, run: &mut RunArtifacts) -> Result<()> {
        let path = get_idea_path(&run.run_dir);
        save_json(idea, &path).await?;
        run.idea = Some(path);
        Ok(())
    }

    async fn idea_stage(
        &self,
        choice: &PillarChoice,
        run: &mut RunArtifacts,
        progress: &dyn Progress,
    ) -> Result<ContentIdea> {
        progress.on_event(&StageEvent::Started(Stage::Idea));
        let idea = IdeaGenerator::new(self.client.as_ref(), &self.templates)
            .generate(choice)
            .await?;
        self.save_idea(&idea, run).await?;
        progress.on_event(&StageEvent::Finished(Stage::Idea));
        Ok(idea)
    }

    fn gate(&self, script: &Script, progress: &dyn Progress) -> QualityReport {
        progress.on_event(&StageEvent::Started(Stage::Quality));
        let report = evaluate(script, self.templates.thresholds());
        progress.on_event(&StageEvent::Finished(Stage::Quality));
        report
    }

    /// One gate pass for a script that cannot be regenerated
    fn gate_saved(&self, script: Script, recorder: &RunRecorder<'_>) -> Result<GatedScript> {
        self.templates.pillar(&script.idea.pillar)?;
        let report = self.gate(&script, recorder);
        let exhausted = !report.passed;
        if exhausted {
            if self.options.strict_quality {
                return Err(StudioError::QualityGateExhausted {
                    attempts: 1,
                    violations: report.violations,
                });
            }
            warn!(
                score = report.score,
                grade = %report.grade,
                violations = ?report.violations,
                "saved script fails the quality gate, continuing with it"
            );
        }
        recorder.record_gate(1, exhausted, &report);
        Ok(GatedScript {
            script,
            report,
            attempts: 1,
            exhausted,
        })
    }

    /// Generate and gate until a script passes or the retry budget is spent
    async fn gated_script(&self, idea: &ContentIdea, recorder: &RunRecorder<'_>) -> Result<GatedScript> {
        let generator = ScriptGenerator::new(self.client.as_ref(), &self.templates);
        let max_attempts = self.options.max_script_retries.saturating_add(1);
        let mut best: Option<(Script, QualityReport)> = None;

        for attempt in 1..=max_attempts {
            recorder.on_event(&StageEvent::Started(Stage::Script));
            let script = generator.generate(idea).await?;
            recorder.on_event(&StageEvent::Finished(Stage::Script));

            let report = self.gate(&script, recorder);
            if report.passed {
                info!(attempt, score = report.score, "script passed quality gate");
                recorder.record_gate(attempt, false, &report);
                return Ok(GatedScript {
                    script,
                    report,
                    attempts: attempt,
                    exhausted: false,
                });
            }

            warn!(
                attempt,
                max_attempts,
                violations = ?report.violations,
                "script failed quality gate"
            );
            if attempt < max_attempts {
                recorder.on_event(&StageEvent::Retrying {
                    attempt: attempt + 1,
                    max_attempts,
                    violations: report.violations.clone(),
                });
            }

            let better = match &best {
                Some((_, kept)) => report.score > kept.score,
                None => true,
            };
            if better {
                best = Some((script, report));
            }
        }

        let Some((script, report)) = best else {
            return Err(StudioError::QualityGateExhausted {
                attempts: max_attempts,
                violations: Vec::new(),
            });
        };
        recorder.record_gate(max_attempts, true, &report);

        if self.options.strict_quality {
            return Err(StudioError::QualityGateExhausted {
                attempts: max_attempts,
                violations: report.violations,
            });
        }

        warn!(
            attempts = max_attempts,
            score = report.score,
            grade = %report.grade,
            "quality gate exhausted, continuing with best attempt"
        );
        Ok(GatedScript {
            script,
            report,
            attempts: max_attempts,
            exhausted: true,
        })
    }

    async fn save_script(&self, script: &Script, run: &mut RunArtifacts) -> Result<()> {
        let json_path = get_script_path(&run.run_dir);
        save_json(script, &json_path).await?;
        let md_path = get_script_markdown_path(&run.run_dir);
        save_text(&format_script_readable(script), &md_path).await?;
        run.script = Some(json_path);
        run.script_markdown = Some(md_path);
        Ok(())
    }

    async fn metadata_stage(
        &self,
        script: &Script,
        run: &mut RunArtifacts,
        progress: &dyn Progress,
    ) -> Result<Metadata> {
        progress.on_event(&StageEvent::Started(Stage::Metadata));
        let metadata = MetadataGenerator::new(self.client.as_ref(), &self.templates)
            .generate(script)
            .await?;
        let path = get_metadata_path(&run.run_dir);
        save_json(&metadata, &path).await?;
        run.metadata = Some(path);
        progress.on_event(&StageEvent::Finished(Stage::Metadata));
        Ok(metadata)
    }

    async fn media_stage(
        &self,
        media: &MediaAssembler,
        script: &Script,
        metadata: &Metadata,
        run: &mut RunArtifacts,
        progress: &dyn Progress,
    ) -> Result<VideoArtifact> {
        progress.on_event(&StageEvent::Started(Stage::Media));
        let output = get_video_path(&run.run_dir);
        let video = media
            .assemble(script, metadata, &get_work_dir(&run.run_dir), &output)
            .await?;
        run.video = Some(output);
        progress.on_event(&StageEvent::Finished(Stage::Media));
        Ok(video)
    }
}

fn outcome(artifacts: RunArtifacts, idea: ContentIdea) -> WorkflowOutcome {
    WorkflowOutcome {
        artifacts,
        idea,
        script: None,
        quality: None,
        metadata: None,
        video: None,
        attempts: 0,
        gate_exhausted: false,
    }
}

fn with_script(mut outcome: WorkflowOutcome, gated: GatedScript) -> WorkflowOutcome {
    outcome.script = Some(gated.script);
    outcome.quality = Some(gated.report);
    outcome.attempts = gated.attempts;
    outcome.gate_exhausted = gated.exhausted;
    outcome
}

/// Load a script saved by an earlier run
pub async fn load_script(path: &Path) -> Result<Script> {
    crate::artifacts::load_json(path).await
}

pub async fn load_idea(path: &Path) -> Result<ContentIdea> {
    crate::artifacts::load_json(path).await
}
