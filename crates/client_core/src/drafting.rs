use chrono::NaiveDate;
use shared::domain::{Homework, HomeworkId, HomeworkKind, HomeworkStatus, Session};

const DEFAULT_DESCRIPTION: &str =
    "Record the events, thoughts and feelings that triggered negative emotions this week.";
const DEFAULT_FINDING: &str = "The patient shows marked anxiety about work pressure.";
const SUGGESTED_FOCUS: &str =
    " Suggested focus: identifying and challenging negative automatic thoughts.";

/// Builds the draft the editor opens with. The same session and date always
/// yield the same draft.
pub fn draft_from_session(session: &Session, kind: HomeworkKind, today: NaiveDate) -> Homework {
    let finding = if session.emotions.is_empty() {
        DEFAULT_FINDING.to_string()
    } else {
        let emotions: Vec<&str> = session.emotions.iter().map(String::as_str).collect();
        format!(
            "Session on {} ({} min) surfaced {}.",
            session.date,
            session.duration_minutes,
            emotions.join(", ")
        )
    };

    let mut ai_generated = finding;
    if let Some(summary) = session.summary.as_deref().filter(|s| !s.trim().is_empty()) {
        ai_generated.push(' ');
        ai_generated.push_str(summary.trim());
    }
    ai_generated.push_str(SUGGESTED_FOCUS);

    Homework {
        id: HomeworkId::New,
        title: kind.title().to_string(),
        description: DEFAULT_DESCRIPTION.to_string(),
        ai_generated,
        therapist_notes: String::new(),
        publish_date: today,
        status: HomeworkStatus::Pending,
        highlights: Vec::new(),
        submission: None,
    }
}
