//! Prompt skeletons per content pillar and the quality thresholds scripts are
//! gated against. Everything here is read-only once the store is built.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, StudioError},
    types::Section,
};

#[derive(Debug, Clone, Serialize)]
pub struct PillarTemplate {
    pub key: &'static str,
    pub name: &'static str,
    pub tone: &'static str,
    pub audience: &'static str,
    pub idea_guidance: &'static str,
    pub youtube_category: &'static str,
}

static PILLARS: [PillarTemplate; 5] = [
    PillarTemplate {
        key: "developmental_milestones",
        name: "Developmental Milestones",
        tone: "warm, encouraging and gently educational",
        audience: "new parents following their baby's development",
        idea_guidance: "a first-time skill or milestone moment (first steps, first words, grasping, rolling over) with a clear learning angle",
        youtube_category: "Education",
    },
    PillarTemplate {
        key: "daily_adventures",
        name: "Daily Adventures",
        tone: "curious, playful and full of wonder",
        audience: "families who enjoy everyday baby discoveries",
        idea_guidance: "an everyday first experience or exploration (new places, textures, weather, foods) seen through the baby's eyes",
        youtube_category: "Entertainment",
    },
    PillarTemplate {
        key: "parenting_hacks",
        name: "Parenting Hacks",
        tone: "practical, friendly and reassuring",
        audience: "busy parents looking for tested, simple solutions",
        idea_guidance: "a practical routine, product or trick that solves a common parenting problem, demonstrated with the baby",
        youtube_category: "Howto & Style",
    },
    PillarTemplate {
        key: "family_bonding",
        name: "Family Bonding",
        tone: "heartfelt, calm and nostalgic",
        audience: "families who value traditions and shared moments",
        idea_guidance: "a family tradition, ritual or quiet shared activity that creates lasting memories",
        youtube_category: "People & Blogs",
    },
    PillarTemplate {
        key: "fun_challenges",
        name: "Fun Challenges",
        tone: "high-energy, funny and surprising",
        audience: "viewers who love wholesome baby reactions",
        idea_guidance: "a safe, light-hearted challenge or reaction video (taste tests, sensory games, toy face-offs)",
        youtube_category: "Entertainment",
    },
];

/// Pillar to publish on a given weekday; `None` means "mixed content", pick any.
pub fn weekday_pillar(day: Weekday) -> Option<&'static str> {
    match day {
        Weekday::Mon => Some("developmental_milestones"),
        Weekday::Tue => Some("daily_adventures"),
        Weekday::Wed => Some("parenting_hacks"),
        Weekday::Thu => Some("family_bonding"),
        Weekday::Fri => Some("fun_challenges"),
        Weekday::Sat => None,
        Weekday::Sun => Some("family_bonding"),
    }
}

/// Seasonal theme for a month (1-12)
pub fn monthly_theme(month: u32) -> Option<&'static str> {
    let theme = match month {
        1 => "New Beginnings",
        2 => "Love & Connection",
        3 => "Exploration",
        4 => "Growth & Learning",
        5 => "Family Fun",
        6 => "Summer Adventures",
        7 => "Creativity",
        8 => "Back to Basics",
        9 => "Learning Focus",
        10 => "Halloween Fun",
        11 => "Gratitude",
        12 => "Holiday Magic",
        _ => return None,
    };
    Some(theme)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordBounds {
    pub min_words: usize,
    pub max_words: usize,
}

impl WordBounds {
    pub const fn new(min_words: usize, max_words: usize) -> Self {
        Self {
            min_words,
            max_words,
        }
    }
}

/// Per-section word bounds. A section left out of a config file keeps its
/// built-in bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionBounds {
    pub hook: Option<WordBounds>,
    pub setup: Option<WordBounds>,
    pub body: Option<WordBounds>,
    pub educational_note: Option<WordBounds>,
    pub outro: Option<WordBounds>,
}

impl Default for SectionBounds {
    fn default() -> Self {
        Self {
            hook: Some(WordBounds::new(10, 40)),
            setup: Some(WordBounds::new(15, 60)),
            body: Some(WordBounds::new(120, 450)),
            educational_note: Some(WordBounds::new(15, 80)),
            outro: Some(WordBounds::new(10, 60)),
        }
    }
}

impl SectionBounds {
    /// No per-section limits at all
    pub const fn unbounded() -> Self {
        Self {
            hook: None,
            setup: None,
            body: None,
            educational_note: None,
            outro: None,
        }
    }

    pub fn get(&self, section: Section) -> Option<WordBounds> {
        match section {
            Section::Hook => self.hook,
            Section::Setup => self.setup,
            Section::Body => self.body,
            Section::EducationalNote => self.educational_note,
            Section::Outro => self.outro,
        }
    }
}

/// Calls to action a script should mix; off unless configured
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallToAction {
    pub terms: Vec<String>,
    /// Distinct terms the narration must mention
    pub min_distinct: usize,
}

impl Default for CallToAction {
    fn default() -> Self {
        Self {
            terms: ["subscribe", "comment", "share"]
                .into_iter()
                .map(String::from)
                .collect(),
            min_distinct: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityThresholds {
    pub sections: SectionBounds,
    pub total: Option<WordBounds>,
    pub banned_words: Vec<String>,
    pub call_to_action: Option<CallToAction>,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            sections: SectionBounds::default(),
            total: Some(WordBounds::new(200, 700)),
            banned_words: ["stupid", "idiot", "dumb", "hate", "dangerous", "unsafe"]
                .into_iter()
                .map(String::from)
                .collect(),
            call_to_action: None,
        }
    }
}

pub struct TemplateStore {
    pillars: &'static [PillarTemplate],
    thresholds: QualityThresholds,
}

impl Default for TemplateStore {
    fn default() -> Self {
        Self::new(QualityThresholds::default())
    }
}

impl TemplateStore {
    pub fn new(thresholds: QualityThresholds) -> Self {
        Self {
            pillars: &PILLARS,
            thresholds,
        }
    }

    pub fn pillars(&self) -> &[PillarTemplate] {
        self.pillars
    }

    pub fn thresholds(&self) -> &QualityThresholds {
        &self.thresholds
    }

    /// Look a pillar up by key or display name, ignoring case
    pub fn pillar(&self, name: &str) -> Result<&PillarTemplate> {
        let wanted = name.trim();
        self.pillars
            .iter()
            .find(|p| p.key.eq_ignore_ascii_case(wanted) || p.name.eq_ignore_ascii_case(wanted))
            .ok_or_else(|| StudioError::UnknownPillar(name.to_string()))
    }
}

/// Replace `{name}` placeholders in a prompt skeleton
pub fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |acc, (name, value)| {
        acc.replace(&format!("{{{}}}", name), value)
    })
}
