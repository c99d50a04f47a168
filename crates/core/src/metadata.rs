use std::collections::{BTreeSet, HashSet};

use serde::Deserialize;
use tracing::info;

use crate::{
    client::{CompletionRequest, TextGenerator, extract_json_object},
    error::{Result, Stage, StudioError},
    templates::{TemplateStore, fill},
    types::{Metadata, Script},
};

/// YouTube's limit on the combined length of a video's tags
pub const TAG_BUDGET_CHARS: usize = 500;

const CHANNEL_TAGS: [&str; 4] = ["Miss Gracy Baby", "baby channel", "parenting", "family vlog"];

static METADATA_SYSTEM_PROMPT: &str = r#"You write YouTube metadata for "Miss Gracy Baby", a family channel following baby Gracy.

You MUST output ONLY valid JSON matching this exact structure (no markdown, no explanation):
{
  "title": "Click-worthy but honest title, under 70 characters",
  "description": "2-4 short paragraphs: what happens, what parents learn, a call to subscribe",
  "tags": ["search keyword", "another keyword"]
}"#;

static METADATA_USER_TEMPLATE: &str = r#"Create metadata for this video.

Working title: {title}
Pillar: {pillar}

Script:
{narration}"#;

#[derive(Deserialize)]
#[serde(untagged)]
enum TagList {
    List(Vec<String>),
    Joined(String),
}

#[derive(Deserialize)]
struct MetadataReply {
    title: String,
    description: String,
    #[serde(default)]
    tags: Option<TagList>,
}

/// Trim and de-duplicate tags (case-insensitively, first spelling wins), then
/// keep each tag only while the comma-separated total fits the budget.
/// The budget is in characters.
pub fn budget_tags<I, S>(tags: I, budget: usize) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut kept = BTreeSet::new();
    let mut used = 0;

    for tag in tags {
        let tag = tag.as_ref().trim();
        if tag.is_empty() || !seen.insert(tag.to_lowercase()) {
            continue;
        }
        let chars = tag.chars().count();
        let cost = if used == 0 { chars } else { chars + 2 };
        if used + cost > budget {
            continue;
        }
        used += cost;
        kept.insert(tag.to_string());
    }
    kept
}

pub struct MetadataGenerator<'a> {
    client: &'a dyn TextGenerator,
    templates: &'a TemplateStore,
}

impl<'a> MetadataGenerator<'a> {
    pub fn new(client: &'a dyn TextGenerator, templates: &'a TemplateStore) -> Self {
        Self { client, templates }
    }

    pub async fn generate(&self, script: &Script) -> Result<Metadata> {
        let pillar = self.templates.pillar(&script.idea.pillar)?;
        info!(title = %script.idea.title, "generating metadata");

        let narration = script.narration();
        let request = CompletionRequest {
            system: METADATA_SYSTEM_PROMPT.to_string(),
            user: fill(
                METADATA_USER_TEMPLATE,
                &[
                    ("title", script.idea.title.as_str()),
                    ("pillar", pillar.name),
                    ("narration", narration.as_str()),
                ],
            ),
            temperature: 0.7,
        };

        let text = self
            .client
            .complete(&request)
            .await
            .map_err(|e| StudioError::from_client(Stage::Metadata, e))?;

        let reply = parse_metadata_reply(&text)?;
        let model_tags = match reply.tags {
            Some(TagList::List(tags)) => tags,
            Some(TagList::Joined(joined)) => joined.split(',').map(String::from).collect(),
            None => Vec::new(),
        };
        let tags = budget_tags(
            model_tags
                .iter()
                .map(String::as_str)
                .chain(CHANNEL_TAGS)
                .chain([pillar.name]),
            TAG_BUDGET_CHARS,
        );

        Ok(Metadata {
            title: reply.title.trim().to_string(),
            description: reply.description.trim().to_string(),
            tags,
            category: pillar.youtube_category.to_string(),
            playlist: pillar.name.to_string(),
        })
    }
}

fn parse_metadata_reply(text: &str) -> Result<MetadataReply> {
    let generation = |reason: String| StudioError::Generation {
        stage: Stage::Metadata,
        reason,
    };

    let json = extract_json_object(text).ok_or_else(|| generation("no JSON object in reply".into()))?;
    let reply: MetadataReply =
        serde_json::from_str(json).map_err(|e| generation(format!("malformed JSON: {}", e)))?;

    if reply.title.trim().is_empty() {
        return Err(generation("title is empty".into()));
    }
    if reply.description.trim().is_empty() {
        return Err(generation("description is empty".into()));
    }
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_trimmed_and_deduplicated() {
        let tags = budget_tags([" baby ", "Baby", "", "snow day", "baby"], 500);
        assert_eq!(
            tags.into_iter().collect::<Vec<_>>(),
            vec!["baby".to_string(), "snow day".to_string()]
        );
    }

    #[test]
    fn tags_respect_character_budget() {
        // "aaaa, bbbb" is 10 chars; "cccc" would need 6 more
        let tags = budget_tags(["aaaa", "bbbb", "cccc", "d"], 13);
        assert_eq!(
            tags.into_iter().collect::<Vec<_>>(),
            vec!["aaaa".to_string(), "bbbb".to_string(), "d".to_string()]
        );
    }

    #[test]
    fn budget_counts_characters_not_bytes() {
        // "bébé, añito" is 11 characters but 14 bytes
        let tags = budget_tags(["bébé", "añito"], 11);
        assert_eq!(tags.len(), 2);
    }

    #[test]
    fn reply_accepts_comma_joined_tags() {
        let reply =
            parse_metadata_reply(r#"{"title": "T", "description": "D", "tags": "a, b"}"#).unwrap();
        assert!(matches!(reply.tags, Some(TagList::Joined(_))));
    }

    #[test]
    fn empty_title_or_description_is_rejected() {
        for text in [
            r#"{"title": "", "description": "D", "tags": []}"#,
            r#"{"title": "T", "description": "  ", "tags": []}"#,
            r#"{"title": "T"}"#,
            "not json",
        ] {
            assert!(
                matches!(
                    parse_metadata_reply(text),
                    Err(StudioError::Generation {
                        stage: Stage::Metadata,
                        ..
                    })
                ),
                "{text}"
            );
        }
    }
}
