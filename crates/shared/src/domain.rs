use std::{cmp::Ordering, collections::BTreeSet, fmt};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(PatientId);
id_newtype!(SessionId);

const NEW_HOMEWORK_ID: &str = "new";

/// Homework identifier. Drafts carry the `"new"` sentinel until the record is
/// stored and receives a numeric id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum HomeworkId {
    New,
    Stored(i64),
}

impl HomeworkId {
    pub fn is_new(&self) -> bool {
        matches!(self, HomeworkId::New)
    }
}

impl fmt::Display for HomeworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HomeworkId::New => f.write_str(NEW_HOMEWORK_ID),
            HomeworkId::Stored(id) => write!(f, "{id}"),
        }
    }
}

impl From<HomeworkId> for String {
    fn from(value: HomeworkId) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for HomeworkId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == NEW_HOMEWORK_ID {
            return Ok(HomeworkId::New);
        }
        value
            .parse::<i64>()
            .map(HomeworkId::Stored)
            .map_err(|_| format!("invalid homework id '{value}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HomeworkStatus {
    Pending,
    Submitted,
    Completed,
    Overdue,
}

impl HomeworkStatus {
    pub fn label(&self) -> &'static str {
        match self {
            HomeworkStatus::Pending => "Awaiting submission",
            HomeworkStatus::Submitted => "Awaiting review",
            HomeworkStatus::Completed => "Completed",
            HomeworkStatus::Overdue => "Overdue",
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, HomeworkStatus::Pending | HomeworkStatus::Submitted)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: PatientId,
    pub name: String,
    pub last_session: NaiveDate,
    pub avatar: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    pub patient_id: PatientId,
    pub date: NaiveDate,
    pub duration_minutes: u32,
    #[serde(default)]
    pub emotions: BTreeSet<String>,
    #[serde(default)]
    pub analyzed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub starred: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionOrder {
    #[default]
    NewestFirst,
    LongestFirst,
    StarredFirst,
}

/// Sorts sessions for the session picker. The sort is stable, so sessions that
/// tie keep their incoming order.
pub fn sort_sessions(sessions: &mut [Session], order: SessionOrder) {
    sessions.sort_by(|a, b| match order {
        SessionOrder::NewestFirst => b.date.cmp(&a.date),
        SessionOrder::LongestFirst => b.duration_minutes.cmp(&a.duration_minutes),
        SessionOrder::StarredFirst => match (a.starred, b.starred) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => Ordering::Equal,
        },
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextSpan {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Homework {
    pub id: HomeworkId,
    pub title: String,
    pub description: String,
    pub ai_generated: String,
    pub therapist_notes: String,
    pub publish_date: NaiveDate,
    pub status: HomeworkStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub highlights: Vec<TextSpan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission: Option<SubmissionContent>,
}

impl Homework {
    /// Inserts a highlight over `ai_generated`, merging it with any span it
    /// overlaps or touches. Returns `false` when the span is empty, out of
    /// range, or not on char boundaries.
    pub fn add_highlight(&mut self, span: TextSpan) -> bool {
        let text = &self.ai_generated;
        if span.start >= span.end
            || span.end > text.len()
            || !text.is_char_boundary(span.start)
            || !text.is_char_boundary(span.end)
        {
            return false;
        }

        let mut merged = span;
        let mut kept = Vec::with_capacity(self.highlights.len() + 1);
        for existing in self.highlights.drain(..) {
            if existing.end < merged.start || existing.start > merged.end {
                kept.push(existing);
            } else {
                merged.start = merged.start.min(existing.start);
                merged.end = merged.end.max(existing.end);
            }
        }
        kept.push(merged);
        kept.sort();
        self.highlights = kept;
        true
    }

    pub fn highlighted_fragments(&self) -> Vec<&str> {
        self.highlights
            .iter()
            .filter_map(|span| self.ai_generated.get(span.start..span.end))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionContent {
    pub content: String,
    pub submitted_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HomeworkKind {
    #[default]
    ThoughtRecord,
    MoodDiary,
    Relaxation,
    BehavioralActivation,
}

impl HomeworkKind {
    pub const ALL: [HomeworkKind; 4] = [
        HomeworkKind::ThoughtRecord,
        HomeworkKind::MoodDiary,
        HomeworkKind::Relaxation,
        HomeworkKind::BehavioralActivation,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            HomeworkKind::ThoughtRecord => "Thought record",
            HomeworkKind::MoodDiary => "Mood diary",
            HomeworkKind::Relaxation => "Relaxation training",
            HomeworkKind::BehavioralActivation => "Behavioral activation",
        }
    }

    pub fn example_rows(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            HomeworkKind::ThoughtRecord => &[
                ("Trigger", "Received an email from my manager"),
                ("Automatic thought", "\"He must be unhappy with me\""),
                ("Emotion rating", "Anxiety (85%)"),
            ],
            HomeworkKind::MoodDiary => &[
                ("Today's event", "Finished the project report"),
                ("Mood colour", "Yellow (calm)"),
            ],
            HomeworkKind::Relaxation => &[
                ("Exercise", "Progressive muscle relaxation"),
                ("Duration", "15 minutes"),
            ],
            HomeworkKind::BehavioralActivation => &[
                ("Planned activity", "Walk in the park"),
                ("Expected enjoyment", "3 / 5"),
            ],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HomeworkBoard {
    pub current: Vec<Homework>,
    pub history: Vec<Homework>,
}

impl HomeworkBoard {
    pub fn from_homeworks(homeworks: impl IntoIterator<Item = Homework>) -> Self {
        let (current, history) = homeworks
            .into_iter()
            .partition(|homework| homework.status.is_open());
        Self { current, history }
    }

    pub fn completion_rate(&self) -> Option<u8> {
        let total = self.current.len() + self.history.len();
        if total == 0 {
            return None;
        }
        let completed = self
            .history
            .iter()
            .filter(|homework| homework.status == HomeworkStatus::Completed)
            .count();
        Some(((completed * 100) / total) as u8)
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
