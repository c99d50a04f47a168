//! Deterministic script gate: section presence, word-count bounds, a
//! banned-term list and, when configured, call-to-action variety. Every rule
//! is evaluated; nothing short-circuits.

use crate::{
    templates::{CallToAction, QualityThresholds, WordBounds},
    types::{Grade, QualityReport, Script, Section, word_count},
};

#[derive(Default)]
struct Checks {
    evaluated: usize,
    failed: usize,
    violations: Vec<String>,
    recommendations: Vec<String>,
}

/// Violation text plus the matching recommendation
type Failure = (String, String);

impl Checks {
    fn record(&mut self, failure: Option<Failure>) {
        match failure {
            Some((violation, recommendation)) => self.fail(vec![violation], recommendation),
            None => self.evaluated += 1,
        }
    }

    /// One check that may produce several violations
    fn fail(&mut self, violations: Vec<String>, recommendation: String) {
        self.evaluated += 1;
        self.failed += 1;
        self.violations.extend(violations);
        self.recommendations.push(recommendation);
    }
}

fn bounds_failure(label: &str, noun: &str, words: usize, bounds: WordBounds) -> Option<Failure> {
    let (violation, verb) = if words < bounds.min_words {
        (
            format!("{}: word count {} below minimum {}", label, words, bounds.min_words),
            "Lengthen",
        )
    } else if words > bounds.max_words {
        (
            format!("{}: word count {} above maximum {}", label, words, bounds.max_words),
            "Shorten",
        )
    } else {
        return None;
    };
    let recommendation = format!(
        "{} the {} to {}-{} words",
        verb, noun, bounds.min_words, bounds.max_words
    );
    Some((violation, recommendation))
}

fn tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Whole-word (or whole-phrase) match, ignoring case and punctuation
fn contains_term(text_tokens: &[String], term: &str) -> bool {
    let term_tokens = tokens(term);
    if term_tokens.is_empty() {
        return false;
    }
    text_tokens
        .windows(term_tokens.len())
        .any(|w| w == term_tokens.as_slice())
}

/// Calls to action count on any mention, so "subscribing" counts as "subscribe"
fn call_to_action_failure(script: &Script, rule: &CallToAction) -> Option<Failure> {
    let narration = script.narration().to_lowercase();
    let stems: Vec<String> = rule
        .terms
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    let found = stems
        .iter()
        .filter(|stem| {
            let stem = stem.as_str();
            narration.contains(stem.strip_suffix('e').unwrap_or(stem))
        })
        .count();
    if found >= rule.min_distinct {
        return None;
    }
    Some((
        format!(
            "script: {} call-to-action type(s) found, need at least {}",
            found, rule.min_distinct
        ),
        format!(
            "Ask viewers to {} (at least {} of them)",
            stems.join(", "),
            rule.min_distinct
        ),
    ))
}

pub fn evaluate(script: &Script, thresholds: &QualityThresholds) -> QualityReport {
    let mut checks = Checks::default();

    for section in Section::ALL {
        let text = script.section(section);
        let noun = section.title().to_lowercase();
        if text.trim().is_empty() {
            checks.record(Some((
                format!("{}: section missing", section),
                format!("Add the missing {} section", noun),
            )));
            continue;
        }
        checks.record(None);

        if let Some(bounds) = thresholds.sections.get(section) {
            checks.record(bounds_failure(section.key(), &noun, word_count(text), bounds));
        }

        let text_tokens = tokens(text);
        let banned: Vec<&str> = thresholds
            .banned_words
            .iter()
            .filter(|term| contains_term(&text_tokens, term))
            .map(|term| term.trim())
            .collect();
        if banned.is_empty() {
            checks.record(None);
        } else {
            checks.fail(
                banned
                    .iter()
                    .map(|term| format!("{}: contains banned term \"{}\"", section, term))
                    .collect(),
                format!("Reword the {} without {}", noun, banned.join(", ")),
            );
        }
    }

    if let Some(bounds) = thresholds.total {
        checks.record(bounds_failure("script", "script", script.word_count(), bounds));
    }

    if let Some(rule) = &thresholds.call_to_action {
        checks.record(call_to_action_failure(script, rule));
    }

    let score = if checks.evaluated == 0 {
        100.0
    } else {
        (checks.evaluated - checks.failed) as f64 / checks.evaluated as f64 * 100.0
    };

    QualityReport {
        passed: checks.violations.is_empty(),
        violations: checks.violations,
        score,
        grade: Grade::from_score(score),
        recommendations: checks.recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{templates::SectionBounds, types::ContentIdea};

    fn words(n: usize) -> String {
        vec!["snow"; n].join(" ")
    }

    fn script() -> Script {
        Script {
            idea: ContentIdea {
                pillar: "Daily Adventures".into(),
                title: "First Snow".into(),
                summary: "Gracy sees snow for the first time".into(),
                theme: None,
            },
            hook: words(20),
            setup: words(20),
            body: words(150),
            educational_note: words(20),
            outro: words(20),
        }
    }

    fn hook_only(min: usize, max: usize) -> QualityThresholds {
        QualityThresholds {
            sections: SectionBounds {
                hook: Some(WordBounds::new(min, max)),
                ..SectionBounds::unbounded()
            },
            total: None,
            banned_words: Vec::new(),
            call_to_action: None,
        }
    }

    #[test]
    fn compliant_script_passes_with_full_score() {
        let report = evaluate(&script(), &QualityThresholds::default());
        assert!(report.passed, "{:?}", report.violations);
        assert!(report.violations.is_empty());
        assert!(report.recommendations.is_empty());
        assert_eq!(report.score, 100.0);
        assert_eq!(report.grade, Grade::A);
    }

    #[test]
    fn evaluation_is_deterministic() {
        let mut s = script();
        s.body = format!("{} stupid and dangerous", words(3));
        let thresholds = QualityThresholds::default();
        assert_eq!(evaluate(&s, &thresholds), evaluate(&s, &thresholds));
    }

    #[test]
    fn short_hook_reports_single_violation() {
        let mut s = script();
        s.hook = "Gracy is about to see snow for once".into();
        let report = evaluate(&s, &hook_only(10, 40));
        assert!(!report.passed);
        assert_eq!(report.violations, vec!["hook: word count 8 below minimum 10"]);
        assert_eq!(report.recommendations, vec!["Lengthen the hook to 10-40 words"]);
    }

    #[test]
    fn long_section_reports_maximum() {
        let mut s = script();
        s.hook = words(41);
        let report = evaluate(&s, &hook_only(10, 40));
        assert_eq!(report.violations, vec!["hook: word count 41 above maximum 40"]);
        assert_eq!(report.recommendations, vec!["Shorten the hook to 10-40 words"]);
    }

    #[test]
    fn missing_educational_note_is_one_violation() {
        let mut s = script();
        s.educational_note = String::new();
        let report = evaluate(&s, &QualityThresholds::default());
        assert!(!report.passed);
        assert_eq!(report.violations, vec!["educational_note: section missing"]);
        assert_eq!(
            report.recommendations,
            vec!["Add the missing educational note section"]
        );
    }

    #[test]
    fn banned_terms_match_whole_words_only() {
        let mut s = script();
        s.body = format!("{} we all HATE rain. Hateful is fine", words(150));
        s.outro = format!("{} really a dangerous-looking hill", words(10));
        let thresholds = QualityThresholds {
            banned_words: vec!["hate".into(), "all".into(), "dangerous".into()],
            ..QualityThresholds::default()
        };
        let report = evaluate(&s, &thresholds);
        assert_eq!(
            report.violations,
            vec![
                "body: contains banned term \"hate\"",
                "body: contains banned term \"all\"",
                "outro: contains banned term \"dangerous\"",
            ]
        );
        assert_eq!(
            report.recommendations,
            vec![
                "Reword the body without hate, all",
                "Reword the outro without dangerous",
            ]
        );
    }

    #[test]
    fn banned_phrases_match_across_punctuation() {
        let mut s = script();
        s.setup = format!("{} never, ever leave baby alone", words(15));
        let thresholds = QualityThresholds {
            banned_words: vec!["never ever".into()],
            ..QualityThresholds::default()
        };
        let report = evaluate(&s, &thresholds);
        assert_eq!(
            report.violations,
            vec!["setup: contains banned term \"never ever\""]
        );
    }

    #[test]
    fn all_violations_are_collected() {
        let mut s = script();
        s.hook = words(2);
        s.educational_note = "  ".into();
        s.outro = format!("{} stupid", words(20));
        let report = evaluate(&s, &QualityThresholds::default());
        assert_eq!(
            report.violations,
            vec![
                "hook: word count 2 below minimum 10",
                "educational_note: section missing",
                "outro: contains banned term \"stupid\"",
                "script: word count 193 below minimum 200",
            ]
        );
        assert_eq!(report.recommendations.len(), 4);
        assert!(report.score < 100.0);
    }

    #[test]
    fn whole_script_bounds_are_checked() {
        let thresholds = QualityThresholds {
            sections: SectionBounds::unbounded(),
            total: Some(WordBounds::new(10, 50)),
            banned_words: Vec::new(),
            call_to_action: None,
        };
        let report = evaluate(&script(), &thresholds);
        assert_eq!(
            report.violations,
            vec!["script: word count 230 above maximum 50"]
        );
        assert_eq!(report.recommendations, vec!["Shorten the script to 10-50 words"]);
    }

    #[test]
    fn call_to_action_variety_is_checked_when_configured() {
        let thresholds = QualityThresholds {
            call_to_action: Some(CallToAction::default()),
            ..QualityThresholds::default()
        };

        let mut s = script();
        s.outro = format!("{} Subscribe for more!", words(17));
        let report = evaluate(&s, &thresholds);
        assert_eq!(
            report.violations,
            vec!["script: 1 call-to-action type(s) found, need at least 2"]
        );
        assert_eq!(
            report.recommendations,
            vec!["Ask viewers to subscribe, comment, share (at least 2 of them)"]
        );

        s.outro = format!("{} Keep subscribing and share your stories", words(14));
        assert!(evaluate(&s, &thresholds).passed);
    }

    #[test]
    fn call_to_action_is_off_by_default() {
        let mut s = script();
        s.outro = words(20);
        assert!(evaluate(&s, &QualityThresholds::default()).passed);
    }

    #[test]
    fn fewer_violations_score_higher() {
        let thresholds = QualityThresholds::default();
        let mut bad = script();
        bad.hook = words(1);
        let mut worse = bad.clone();
        worse.outro = words(1);
        assert!(evaluate(&bad, &thresholds).score > evaluate(&worse, &thresholds).score);
    }
}
