use std::{collections::BTreeSet, fmt, path::PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentIdea {
    pub pillar: String,
    pub title: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
}

/// Script sections in narration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Hook,
    Setup,
    Body,
    EducationalNote,
    Outro,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Hook,
        Section::Setup,
        Section::Body,
        Section::EducationalNote,
        Section::Outro,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Section::Hook => "hook",
            Section::Setup => "setup",
            Section::Body => "body",
            Section::EducationalNote => "educational_note",
            Section::Outro => "outro",
        }
    }

    /// Delimiter header used in model replies, e.g. `[EDUCATIONAL_NOTE]`
    pub fn header(&self) -> String {
        format!("[{}]", self.key().to_uppercase())
    }

    pub fn title(&self) -> &'static str {
        match self {
            Section::Hook => "Hook",
            Section::Setup => "Setup",
            Section::Body => "Body",
            Section::EducationalNote => "Educational note",
            Section::Outro => "Outro",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub idea: ContentIdea,
    pub hook: String,
    pub setup: String,
    pub body: String,
    pub educational_note: String,
    pub outro: String,
}

impl Script {
    pub fn section(&self, section: Section) -> &str {
        match section {
            Section::Hook => &self.hook,
            Section::Setup => &self.setup,
            Section::Body => &self.body,
            Section::EducationalNote => &self.educational_note,
            Section::Outro => &self.outro,
        }
    }

    /// Non-empty sections in narration order
    pub fn narrated_sections(&self) -> impl Iterator<Item = (Section, &str)> {
        Section::ALL
            .into_iter()
            .map(|s| (s, self.section(s).trim()))
            .filter(|(_, text)| !text.is_empty())
    }

    /// Narration text: non-empty sections joined in order
    pub fn narration(&self) -> String {
        self.narrated_sections()
            .map(|(_, text)| text)
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn word_count(&self) -> usize {
        Section::ALL
            .iter()
            .map(|s| word_count(self.section(*s)))
            .sum()
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 90.0 => Grade::A,
            s if s >= 80.0 => Grade::B,
            s if s >= 70.0 => Grade::C,
            s if s >= 60.0 => Grade::D,
            _ => Grade::F,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub passed: bool,
    pub violations: Vec<String>,
    pub score: f64,
    pub grade: Grade,
    /// One suggestion per failed check, in check order
    #[serde(default)]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: String,
    pub description: String,
    pub tags: BTreeSet<String>,
    pub category: String,
    pub playlist: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoArtifact {
    pub file_path: PathBuf,
    pub duration_seconds: f64,
}
