use chrono::{Datelike, Local, Weekday};
use rand::seq::SliceRandom;
use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    client::{CompletionRequest, TextGenerator, extract_json_object},
    error::{Result, Stage, StudioError},
    templates::{PillarTemplate, TemplateStore, fill, monthly_theme, weekday_pillar},
    types::ContentIdea,
};

static IDEA_SYSTEM_PROMPT: &str = r#"You plan videos for "Miss Gracy Baby", a family YouTube channel following baby Gracy.

You MUST output ONLY valid JSON matching this exact structure (no markdown, no explanation):
{"title": "Catchy video title, under 70 characters", "summary": "2-3 sentences describing what happens in the video and why viewers will care"}"#;

static IDEA_USER_TEMPLATE: &str = r#"Pitch one new video idea for the "{pillar}" content pillar.

Focus: {guidance}
Tone: {tone}
Audience: {audience}
Seasonal theme to weave in if it fits naturally: {theme}

The idea must be safe, age-appropriate and filmable at home or nearby."#;

/// How the idea generator picks a pillar
#[derive(Debug, Clone)]
pub enum PillarChoice {
    Pinned(String),
    Rotation(Weekday),
    Random,
}

impl PillarChoice {
    /// Today's rotation slot, or the pinned pillar when one is given
    pub fn today_or(pinned: Option<String>) -> Self {
        match pinned {
            Some(name) => PillarChoice::Pinned(name),
            None => PillarChoice::Rotation(Local::now().weekday()),
        }
    }
}

#[derive(Deserialize)]
struct IdeaReply {
    title: String,
    summary: String,
}

fn parse_idea_reply(text: &str) -> std::result::Result<IdeaReply, String> {
    let json = extract_json_object(text).ok_or("no JSON object in reply")?;
    let reply: IdeaReply = serde_json::from_str(json).map_err(|e| e.to_string())?;
    if reply.title.trim().is_empty() || reply.summary.trim().is_empty() {
        return Err("title or summary is empty".to_string());
    }
    Ok(reply)
}

pub struct IdeaGenerator<'a> {
    client: &'a dyn TextGenerator,
    templates: &'a TemplateStore,
}

impl<'a> IdeaGenerator<'a> {
    pub fn new(client: &'a dyn TextGenerator, templates: &'a TemplateStore) -> Self {
        Self { client, templates }
    }

    pub fn select_pillar(&self, choice: &PillarChoice) -> Result<&'a PillarTemplate> {
        let templates: &'a TemplateStore = self.templates;
        match choice {
            PillarChoice::Pinned(name) => templates.pillar(name),
            PillarChoice::Rotation(day) => match weekday_pillar(*day) {
                Some(key) => templates.pillar(key),
                None => Self::random_pillar(templates),
            },
            PillarChoice::Random => Self::random_pillar(templates),
        }
    }

    fn random_pillar(templates: &'a TemplateStore) -> Result<&'a PillarTemplate> {
        templates
            .pillars()
            .choose(&mut rand::thread_rng())
            .ok_or_else(|| StudioError::UnknownPillar("<none configured>".to_string()))
    }

    pub async fn generate(&self, choice: &PillarChoice) -> Result<ContentIdea> {
        let month = Local::now().month();
        self.generate_for_month(choice, month).await
    }

    /// Ask for an idea; an empty or malformed reply is retried exactly once
    pub async fn generate_for_month(&self, choice: &PillarChoice, month: u32) -> Result<ContentIdea> {
        let pillar = self.select_pillar(choice)?;
        let theme = monthly_theme(month);
        info!(pillar = pillar.name, theme = ?theme, "generating idea");

        let request = CompletionRequest {
            system: IDEA_SYSTEM_PROMPT.to_string(),
            user: fill(
                IDEA_USER_TEMPLATE,
                &[
                    ("pillar", pillar.name),
                    ("guidance", pillar.idea_guidance),
                    ("tone", pillar.tone),
                    ("audience", pillar.audience),
                    ("theme", theme.unwrap_or("none")),
                ],
            ),
            temperature: 0.9,
        };

        let mut last_reason = String::new();
        for attempt in 1..=2 {
            let reason = match self.client.complete(&request).await {
                Ok(text) => match parse_idea_reply(&text) {
                    Ok(reply) => {
                        return Ok(ContentIdea {
                            pillar: pillar.name.to_string(),
                            title: reply.title.trim().to_string(),
                            summary: reply.summary.trim().to_string(),
                            theme: theme.map(String::from),
                        });
                    }
                    Err(reason) => reason,
                },
                Err(err) => match StudioError::from_client(Stage::Idea, err) {
                    StudioError::Generation { reason, .. } => reason,
                    other => return Err(other),
                },
            };
            warn!(attempt, %reason, "unusable idea reply");
            last_reason = reason;
        }

        Err(StudioError::Generation {
            stage: Stage::Idea,
            reason: format!("no usable idea after one retry: {}", last_reason),
        })
    }
}
