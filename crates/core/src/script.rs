use std::collections::HashMap;

use tracing::{debug, info};

use crate::{
    client::{CompletionRequest, TextGenerator},
    error::{Result, Stage, StudioError},
    templates::{TemplateStore, WordBounds, fill},
    types::{ContentIdea, Script, Section},
};

static SCRIPT_SYSTEM_PROMPT: &str = r#"You write narration scripts for "Miss Gracy Baby", a family YouTube channel following baby Gracy.

The script is read aloud by a narrator over still images. Write in plain spoken language, no stage directions, no emojis.

You MUST format the reply as five sections. Each section starts on its own line with its header, followed by the section text:
[HOOK]
[SETUP]
[BODY]
[EDUCATIONAL_NOTE]
[OUTRO]

Use every header exactly once and in this order. Output nothing before [HOOK]."#;

static SCRIPT_USER_TEMPLATE: &str = r#"Write the script for this video.

Title: {title}
Summary: {summary}
Pillar: {pillar}
Tone: {tone}
Audience: {audience}
Seasonal theme: {theme}

Length targets (words):
{bounds}

Never use these words: {banned}
Calls to action: {cta}"#;

fn describe_bounds(store: &TemplateStore) -> String {
    let thresholds = store.thresholds();
    let mut lines: Vec<String> = Section::ALL
        .into_iter()
        .filter_map(|s| {
            thresholds
                .sections
                .get(s)
                .map(|b| format!("- {}: {}", s.header(), range(b)))
        })
        .collect();
    if let Some(total) = thresholds.total {
        lines.push(format!("- whole script: {}", range(total)));
    }
    if lines.is_empty() {
        "- no fixed limits, keep it under three minutes spoken".to_string()
    } else {
        lines.join("\n")
    }
}

fn describe_call_to_action(store: &TemplateStore) -> String {
    match &store.thresholds().call_to_action {
        Some(rule) => format!(
            "ask viewers to do at least {} of: {}",
            rule.min_distinct,
            rule.terms.join(", ")
        ),
        None => "optional".to_string(),
    }
}

fn range(bounds: WordBounds) -> String {
    format!("{}-{}", bounds.min_words, bounds.max_words)
}

/// Recognise a section header line such as `[BODY]`, `**[Body]**` or
/// `## [educational note]`. Returns the section and any text trailing the
/// header on the same line.
fn parse_header(line: &str) -> Option<(Section, &str)> {
    let line = line.trim().trim_start_matches(['*', '_', '#', ' ']);
    let rest = line.strip_prefix('[')?;
    let close = rest.find(']')?;
    let tag = rest[..close].trim().replace([' ', '-'], "_");
    let section = Section::ALL
        .into_iter()
        .find(|s| s.key().eq_ignore_ascii_case(&tag))?;
    let trailing = rest[close + 1..]
        .trim_start_matches(['*', '_', ':'])
        .trim();
    Some((section, trailing))
}

/// Split a model reply into the five script sections. Text before the first
/// header is dropped. A header present with no text yields an empty section.
pub fn parse_script(idea: &ContentIdea, text: &str) -> Result<Script> {
    let mut sections: HashMap<Section, Vec<&str>> = HashMap::new();
    let mut current: Option<Section> = None;

    for line in text.lines() {
        if let Some((section, trailing)) = parse_header(line) {
            let lines = sections.entry(section).or_default();
            if !trailing.is_empty() {
                lines.push(trailing);
            }
            current = Some(section);
        } else if let Some(section) = current {
            sections.entry(section).or_default().push(line);
        }
    }

    let missing: Vec<&str> = Section::ALL
        .into_iter()
        .filter(|s| !sections.contains_key(s))
        .map(|s| s.key())
        .collect();
    if !missing.is_empty() {
        return Err(StudioError::Parse {
            stage: Stage::Script,
            reason: format!("missing sections: {}", missing.join(", ")),
        });
    }

    let mut take = |section: Section| -> String {
        sections
            .remove(&section)
            .map(|lines| lines.join("\n").trim().to_string())
            .unwrap_or_default()
    };

    Ok(Script {
        idea: idea.clone(),
        hook: take(Section::Hook),
        setup: take(Section::Setup),
        body: take(Section::Body),
        educational_note: take(Section::EducationalNote),
        outro: take(Section::Outro),
    })
}

pub struct ScriptGenerator<'a> {
    client: &'a dyn TextGenerator,
    templates: &'a TemplateStore,
}

impl<'a> ScriptGenerator<'a> {
    pub fn new(client: &'a dyn TextGenerator, templates: &'a TemplateStore) -> Self {
        Self { client, templates }
    }

    pub async fn generate(&self, idea: &ContentIdea) -> Result<Script> {
        let pillar = self.templates.pillar(&idea.pillar)?;
        info!(title = %idea.title, pillar = pillar.name, "generating script");

        let banned = self.templates.thresholds().banned_words.join(", ");
        let bounds = describe_bounds(self.templates);
        let cta = describe_call_to_action(self.templates);
        let request = CompletionRequest {
            system: SCRIPT_SYSTEM_PROMPT.to_string(),
            user: fill(
                SCRIPT_USER_TEMPLATE,
                &[
                    ("title", idea.title.as_str()),
                    ("summary", idea.summary.as_str()),
                    ("pillar", pillar.name),
                    ("tone", pillar.tone),
                    ("audience", pillar.audience),
                    ("theme", idea.theme.as_deref().unwrap_or("none")),
                    ("bounds", bounds.as_str()),
                    ("banned", if banned.is_empty() { "none" } else { banned.as_str() }),
                    ("cta", cta.as_str()),
                ],
            ),
            temperature: 0.8,
        };

        let text = self
            .client
            .complete(&request)
            .await
            .map_err(|e| StudioError::from_client(Stage::Script, e))?;
        debug!(chars = text.len(), "script reply received");

        parse_script(idea, &text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idea() -> ContentIdea {
        ContentIdea {
            pillar: "Daily Adventures".into(),
            title: "First Snow".into(),
            summary: "Gracy meets snow".into(),
            theme: None,
        }
    }

    #[test]
    fn parses_all_sections_in_order() {
        let reply = "Here you go!\n\n[HOOK]\nWhat is this cold white stuff?\n\n[SETUP]\nIt snowed overnight.\n[BODY]\nGracy touches it.\nShe giggles.\n[EDUCATIONAL_NOTE]\nNew textures build senses.\n[OUTRO]\nSee you tomorrow!";
        let script = parse_script(&idea(), reply).unwrap();
        assert_eq!(script.hook, "What is this cold white stuff?");
        assert_eq!(script.setup, "It snowed overnight.");
        assert_eq!(script.body, "Gracy touches it.\nShe giggles.");
        assert_eq!(script.educational_note, "New textures build senses.");
        assert_eq!(script.outro, "See you tomorrow!");
        assert_eq!(script.idea, idea());
    }

    #[test]
    fn headers_tolerate_case_emphasis_and_inline_text() {
        let reply = "**[Hook]** Look!\n  [setup]  \nMorning.\n## [Body]\nSnow.\n[Educational Note]: Cold is new.\n__[OUTRO]__\nBye.";
        let script = parse_script(&idea(), reply).unwrap();
        assert_eq!(script.hook, "Look!");
        assert_eq!(script.setup, "Morning.");
        assert_eq!(script.body, "Snow.");
        assert_eq!(script.educational_note, "Cold is new.");
        assert_eq!(script.outro, "Bye.");
    }

    #[test]
    fn empty_section_is_kept_empty() {
        let reply = "[HOOK]\nHi\n[SETUP]\n[BODY]\nSnow\n[EDUCATIONAL_NOTE]\nNote\n[OUTRO]\nBye";
        let script = parse_script(&idea(), reply).unwrap();
        assert_eq!(script.setup, "");
    }

    #[test]
    fn missing_headers_are_all_named() {
        let reply = "[HOOK]\nHi\n[BODY]\nSnow\n[OUTRO]\nBye";
        let err = parse_script(&idea(), reply).unwrap_err();
        match err {
            StudioError::Parse { stage, reason } => {
                assert_eq!(stage, Stage::Script);
                assert_eq!(reason, "missing sections: setup, educational_note");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn bracketed_words_inside_text_are_not_headers() {
        assert!(parse_header("She said [laughs] loudly").is_none());
        assert!(parse_header("[INTRO]").is_none());
        assert_eq!(
            parse_header("[EDUCATIONAL-NOTE]").map(|(s, _)| s),
            Some(Section::EducationalNote)
        );
    }

    #[test]
    fn prompt_lists_configured_bounds() {
        let text = describe_bounds(&TemplateStore::default());
        assert!(text.contains("- [HOOK]: 10-40"));
        assert!(text.ends_with("- whole script: 200-700"));
    }

    #[test]
    fn prompt_names_call_to_action_rule_when_enabled() {
        assert_eq!(describe_call_to_action(&TemplateStore::default()), "optional");
        let store = TemplateStore::new(crate::templates::QualityThresholds {
            call_to_action: Some(crate::templates::CallToAction::default()),
            ..Default::default()
        });
        assert_eq!(
            describe_call_to_action(&store),
            "ask viewers to do at least 2 of: subscribe, comment, share"
        );
    }
}
