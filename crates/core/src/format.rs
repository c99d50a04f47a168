use crate::types::{ContentIdea, Metadata, QualityReport, Script, Section, VideoArtifact};

/// Format seconds as MM:SS timestamp
pub fn format_timestamp(seconds: f64) -> String {
    let mins = (seconds / 60.0) as u32;
    let secs = (seconds % 60.0) as u32;
    format!("{:02}:{:02}", mins, secs)
}

pub fn format_idea_readable(idea: &ContentIdea) -> String {
    let mut output = String::new();
    output.push_str(&format!("# {}\n\n", idea.title));
    output.push_str(&format!("**Pillar:** {}", idea.pillar));
    if let Some(theme) = &idea.theme {
        output.push_str(&format!(" | **Theme:** {}", theme));
    }
    output.push_str("\n\n");
    output.push_str(&idea.summary);
    output.push('\n');
    output
}

/// Format a script as markdown, one heading per section
pub fn format_script_readable(script: &Script) -> String {
    let mut output = format_idea_readable(&script.idea);
    output.push('\n');

    for section in Section::ALL {
        let text = script.section(section).trim();
        output.push_str(&format!("## {}\n\n", section.title()));
        if text.is_empty() {
            output.push_str("_(missing)_\n\n");
        } else {
            output.push_str(&format!("{}\n\n", text));
        }
    }

    output.push_str(&format!("---\n\n{} words\n", script.word_count()));
    output
}

pub fn format_quality_report(report: &QualityReport) -> String {
    let mut output = format!(
        "Grade {} ({:.0}/100) - {}\n",
        report.grade,
        report.score,
        if report.passed { "passed" } else { "failed" }
    );
    for violation in &report.violations {
        output.push_str(&format!("  • {}\n", violation));
    }
    for recommendation in &report.recommendations {
        output.push_str(&format!("  → {}\n", recommendation));
    }
    output
}

pub fn format_metadata_readable(metadata: &Metadata) -> String {
    let mut output = String::new();
    output.push_str(&format!("# {}\n\n", metadata.title));
    output.push_str(&format!(
        "**Category:** {} | **Playlist:** {}\n\n",
        metadata.category, metadata.playlist
    ));
    output.push_str(&metadata.description);
    output.push_str("\n\n");

    if !metadata.tags.is_empty() {
        output.push_str("## Tags\n\n");
        output.push_str(
            &metadata
                .tags
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", "),
        );
        output.push('\n');
    }
    output
}

pub fn format_video_summary(video: &VideoArtifact) -> String {
    format!(
        "{} [{}]",
        video.file_path.display(),
        format_timestamp(video.duration_seconds)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Grade;

    #[test]
    fn timestamp_rounds_down_to_seconds() {
        assert_eq!(format_timestamp(0.0), "00:00");
        assert_eq!(format_timestamp(125.7), "02:05");
    }

    #[test]
    fn readable_script_marks_missing_sections() {
        let script = Script {
            idea: ContentIdea {
                pillar: "Family Bonding".into(),
                title: "Sunday Pancakes".into(),
                summary: "A weekly tradition".into(),
                theme: Some("Gratitude".into()),
            },
            hook: "Flip!".into(),
            setup: "Every Sunday we cook.".into(),
            body: "Batter, pan, giggles.".into(),
            educational_note: String::new(),
            outro: "See you next week.".into(),
        };
        let text = format_script_readable(&script);
        assert!(text.starts_with("# Sunday Pancakes\n\n**Pillar:** Family Bonding | **Theme:** Gratitude"));
        assert!(text.contains(&format!("## {}\n\n_(missing)_", Section::EducationalNote.title())));
        assert!(text.ends_with("12 words\n"));
    }

    #[test]
    fn quality_report_lists_violations() {
        let report = QualityReport {
            passed: false,
            violations: vec!["hook: section missing".into()],
            score: 93.75,
            grade: Grade::A,
            recommendations: vec!["Add the missing hook section".into()],
        };
        assert_eq!(
            format_quality_report(&report),
            "Grade A (94/100) - failed\n  • hook: section missing\n  → Add the missing hook section\n"
        );
    }
}
