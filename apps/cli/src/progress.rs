use std::{sync::Mutex, time::Duration};

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use gracy_core::{Progress, Stage, StageEvent};

pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.cyan} {msg}")
    {
        pb.set_style(spinner_style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn running_message(stage: Stage) -> &'static str {
    match stage {
        Stage::Idea => "Generating idea...",
        Stage::Script => "Writing script...",
        Stage::Quality => "Checking script quality...",
        Stage::Metadata => "Generating metadata...",
        Stage::Media => "Rendering narration, images and video...",
    }
}

fn done_message(stage: Stage) -> &'static str {
    match stage {
        Stage::Idea => "Idea generated",
        Stage::Script => "Script written",
        Stage::Quality => "Quality checked",
        Stage::Metadata => "Metadata generated",
        Stage::Media => "Video rendered",
    }
}

/// One spinner per running stage
#[derive(Default)]
pub struct SpinnerProgress {
    current: Mutex<Option<ProgressBar>>,
}

impl SpinnerProgress {
    /// Stop a spinner left running by a failed stage
    pub fn abandon(&self) {
        if let Ok(mut current) = self.current.lock() {
            if let Some(pb) = current.take() {
                pb.abandon_with_message(format!("{} Failed", style("✗").red().bold()));
            }
        }
    }
}

impl Progress for SpinnerProgress {
    fn on_event(&self, event: &StageEvent) {
        let Ok(mut current) = self.current.lock() else {
            return;
        };
        match event {
            StageEvent::Started(stage) => {
                if let Some(pb) = current.take() {
                    pb.finish_and_clear();
                }
                *current = Some(create_spinner(running_message(*stage)));
            }
            StageEvent::Finished(stage) => {
                if let Some(pb) = current.take() {
                    pb.finish_with_message(format!(
                        "{} {}",
                        style("✓").green().bold(),
                        done_message(*stage)
                    ));
                }
            }
            StageEvent::Retrying {
                attempt,
                max_attempts,
                violations,
            } => {
                println!(
                    "{} Script rejected, retrying ({}/{})",
                    style("↻").yellow().bold(),
                    attempt,
                    max_attempts
                );
                for violation in violations {
                    println!("    {}", style(violation).dim());
                }
            }
        }
    }
}
