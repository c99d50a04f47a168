use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use gracy_core::{
    ChatClient, MediaAssembler, PillarChoice, Provider, ScriptSource, Studio, StudioConfig,
    StudioOptions, TemplateStore, WorkflowOutcome, default_output_root, format_idea_readable,
    format_metadata_readable, format_quality_report, format_script_readable,
    format_video_summary, load_idea, load_script,
};

use crate::progress::SpinnerProgress;

mod progress;

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

/// CLI wrapper for Provider enum (needed for clap ValueEnum)
#[derive(Clone, ValueEnum)]
enum CliProvider {
    Gemini,
    Openai,
    Grok,
}

impl From<CliProvider> for Provider {
    fn from(cli: CliProvider) -> Self {
        match cli {
            CliProvider::Gemini => Provider::Gemini,
            CliProvider::Openai => Provider::Openai,
            CliProvider::Grok => Provider::Grok,
        }
    }
}

#[derive(Parser)]
#[command(name = "gracy")]
#[command(about = "Generate ideas, scripts, metadata and narrated videos for Miss Gracy Baby")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file (default: ./gracy.toml, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// AI provider for text generation (overrides the config file)
    #[arg(short, long, global = true)]
    provider: Option<CliProvider>,

    /// Root directory for run folders
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    /// Log more (-v info, -vv debug); RUST_LOG wins when set
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a content idea
    Idea {
        /// Pillar name or key (default: today's rotation)
        #[arg(long, conflicts_with = "random")]
        pillar: Option<String>,

        /// Pick any pillar at random
        #[arg(long)]
        random: bool,
    },
    /// Generate a quality-gated script
    Script {
        /// Pillar for a freshly generated idea
        #[arg(long, conflicts_with = "idea")]
        pillar: Option<String>,

        /// Write the script for a saved idea.json instead
        #[arg(long)]
        idea: Option<PathBuf>,
    },
    /// Idea, script, metadata and video in one run
    Workflow {
        #[arg(long)]
        pillar: Option<String>,

        /// Stop after metadata
        #[arg(long)]
        skip_video: bool,
    },
    /// Metadata and video for a saved or freshly generated script
    Video {
        /// Saved script.json; it is gated once and cannot be regenerated
        #[arg(long, conflicts_with = "pillar")]
        script: Option<PathBuf>,

        #[arg(long)]
        pillar: Option<String>,
    },
}

impl Command {
    fn needs_media(&self) -> bool {
        match self {
            Command::Idea { .. } | Command::Script { .. } => false,
            Command::Workflow { skip_video, .. } => !skip_video,
            Command::Video { .. } => true,
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    if let Ok(path) = dotenvy::dotenv() {
        debug!(path = %path.display(), "loaded .env");
    }

    let (config, config_path) = StudioConfig::load(cli.config.as_deref()).await?;
    if let Some(path) = &config_path {
        debug!(path = %path.display(), "using config file");
    }

    let provider: Provider = cli.provider.map(Into::into).unwrap_or(config.provider);
    let output_dir = cli
        .output_dir
        .or_else(|| config.output_dir.clone())
        .unwrap_or_else(default_output_root);

    // Validate API keys early
    let client = ChatClient::from_env(provider, config.api_key.as_deref())?;
    let mut studio = Studio::new(
        Box::new(client),
        TemplateStore::new(config.quality.clone()),
        StudioOptions::from_config(&config, output_dir),
    );
    if cli.command.needs_media() {
        studio = studio.with_media(MediaAssembler::from_config(&config.media)?);
    }

    println!(
        "\n{}  {}\n",
        style("gracy").magenta().bold(),
        style(format!("Content Studio ({})", provider.name())).dim()
    );

    let started = Instant::now();
    let progress = SpinnerProgress::default();
    let result = match cli.command {
        Command::Idea { pillar, random } => {
            let choice = if random {
                PillarChoice::Random
            } else {
                PillarChoice::today_or(pillar)
            };
            studio.generate_idea(&choice, &progress).await
        }
        Command::Script { pillar, idea } => {
            let idea = match idea {
                Some(path) => Some(load_idea(&path).await?),
                None => None,
            };
            studio
                .generate_script(idea, &PillarChoice::today_or(pillar), &progress)
                .await
        }
        Command::Workflow { pillar, skip_video } => {
            studio
                .run_workflow(&PillarChoice::today_or(pillar), skip_video, &progress)
                .await
        }
        Command::Video { script, pillar } => {
            let source = match script {
                Some(path) => ScriptSource::Saved(load_script(&path).await?),
                None => ScriptSource::Fresh(PillarChoice::today_or(pillar)),
            };
            studio.generate_video(source, &progress).await
        }
    };

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            progress.abandon();
            return Err(e.into());
        }
    };

    print_outcome(&outcome);
    println!(
        "\n{} {}\n",
        style("Done in").dim(),
        style(format_duration(started.elapsed())).cyan()
    );
    Ok(())
}

fn print_outcome(outcome: &WorkflowOutcome) {
    if outcome.gate_exhausted {
        println!(
            "\n{} Script still fails the quality gate after {} attempt(s); continuing with the best one",
            style("!").yellow().bold(),
            outcome.attempts
        );
    }

    println!(
        "\n{} {}",
        style("Saved:").dim(),
        style(outcome.artifacts.run_dir.display()).cyan()
    );
    println!("{}", style("─".repeat(60)).dim());

    match &outcome.script {
        Some(script) => println!("{}", format_script_readable(script)),
        None => println!("{}", format_idea_readable(&outcome.idea)),
    }

    if let Some(report) = &outcome.quality {
        println!("{} {}", style("Quality:").bold(), format_quality_report(report));
    }
    if let Some(metadata) = &outcome.metadata {
        println!("{}", style("─".repeat(60)).dim());
        println!("{}", format_metadata_readable(metadata));
    }
    if let Some(video) = &outcome.video {
        println!(
            "{} {}",
            style("Video:").bold(),
            style(format_video_summary(video)).green()
        );
    }
    if let Some(report) = &outcome.artifacts.report {
        println!("{} {}", style("Report:").dim(), style(report.display()).dim());
    }
}
