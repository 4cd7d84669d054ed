use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::EvaluationResponse;

pub const MAX_DIMENSION_SCORE: u8 = 20;
pub const MAX_TOTAL_SCORE: u8 = 100;
const GOOD_THRESHOLD: u8 = 16;
const FAIR_THRESHOLD: u8 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreDimension {
    Context,
    Emotion,
    AutomaticThought,
    Restructuring,
    ActionPlan,
}

impl ScoreDimension {
    pub const ALL: [ScoreDimension; 5] = [
        ScoreDimension::Context,
        ScoreDimension::Emotion,
        ScoreDimension::AutomaticThought,
        ScoreDimension::Restructuring,
        ScoreDimension::ActionPlan,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ScoreDimension::Context => "Situation",
            ScoreDimension::Emotion => "Emotion",
            ScoreDimension::AutomaticThought => "Automatic thought",
            ScoreDimension::Restructuring => "Cognitive restructuring",
            ScoreDimension::ActionPlan => "Action plan",
        }
    }

    pub fn criterion(&self) -> &'static str {
        match self {
            ScoreDimension::Context => "clear and specific",
            ScoreDimension::Emotion => "accurately identified",
            ScoreDimension::AutomaticThought => "analysed in depth",
            ScoreDimension::Restructuring => "reasonable and balanced",
            ScoreDimension::ActionPlan => "concrete and feasible",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    NeedsImprovement,
    Fair,
    Good,
}

impl ScoreBand {
    pub fn for_dimension_score(score: u8) -> Self {
        if score >= GOOD_THRESHOLD {
            ScoreBand::Good
        } else if score >= FAIR_THRESHOLD {
            ScoreBand::Fair
        } else {
            ScoreBand::NeedsImprovement
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreViolation {
    #[error("{field} score {value} is outside 0..={max}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        max: u8,
    },
    #[error("dimension scores sum to {sum} but total_score is {total}")]
    SumMismatch { sum: i64, total: i64 },
}

/// Validated evaluation: every dimension is within 0..=20 and the dimensions
/// sum to the total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationResult {
    total_score: u8,
    score_context: u8,
    score_emotion: u8,
    score_thought: u8,
    score_restructuring: u8,
    score_action_plan: u8,
    doctor_comments: String,
    patient_feedback: String,
}

impl EvaluationResult {
    pub fn from_dimensions(
        scores: [u8; 5],
        doctor_comments: impl Into<String>,
        patient_feedback: impl Into<String>,
    ) -> Result<Self, ScoreViolation> {
        let total: i64 = scores.iter().map(|score| i64::from(*score)).sum();
        Self::try_from(EvaluationResponse {
            total_score: total,
            score_context: i64::from(scores[0]),
            score_emotion: i64::from(scores[1]),
            score_thought: i64::from(scores[2]),
            score_restructuring: i64::from(scores[3]),
            score_action_plan: i64::from(scores[4]),
            doctor_comments: doctor_comments.into(),
            patient_feedback: patient_feedback.into(),
        })
    }

    pub fn total_score(&self) -> u8 {
        self.total_score
    }

    pub fn score(&self, dimension: ScoreDimension) -> u8 {
        match dimension {
            ScoreDimension::Context => self.score_context,
            ScoreDimension::Emotion => self.score_emotion,
            ScoreDimension::AutomaticThought => self.score_thought,
            ScoreDimension::Restructuring => self.score_restructuring,
            ScoreDimension::ActionPlan => self.score_action_plan,
        }
    }

    pub fn dimensions(&self) -> [(ScoreDimension, u8); 5] {
        ScoreDimension::ALL.map(|dimension| (dimension, self.score(dimension)))
    }

    pub fn dimension_sum(&self) -> u16 {
        ScoreDimension::ALL
            .iter()
            .map(|dimension| u16::from(self.score(*dimension)))
            .sum()
    }

    /// Overall band, judged on the mean dimension score so the 0-20
    /// thresholds apply to the 0-100 total.
    pub fn overall_band(&self) -> ScoreBand {
        ScoreBand::for_dimension_score(self.total_score / 5)
    }

    pub fn doctor_comments(&self) -> &str {
        &self.doctor_comments
    }

    pub fn patient_feedback(&self) -> &str {
        &self.patient_feedback
    }

    pub fn to_response(&self) -> EvaluationResponse {
        EvaluationResponse {
            total_score: i64::from(self.total_score),
            score_context: i64::from(self.score_context),
            score_emotion: i64::from(self.score_emotion),
            score_thought: i64::from(self.score_thought),
            score_restructuring: i64::from(self.score_restructuring),
            score_action_plan: i64::from(self.score_action_plan),
            doctor_comments: self.doctor_comments.clone(),
            patient_feedback: self.patient_feedback.clone(),
        }
    }
}

fn bounded(field: &'static str, value: i64, max: u8) -> Result<u8, ScoreViolation> {
    u8::try_from(value)
        .ok()
        .filter(|score| *score <= max)
        .ok_or(ScoreViolation::OutOfRange { field, value, max })
}

impl TryFrom<EvaluationResponse> for EvaluationResult {
    type Error = ScoreViolation;

    fn try_from(value: EvaluationResponse) -> Result<Self, Self::Error> {
        let score_context = bounded("score_context", value.score_context, MAX_DIMENSION_SCORE)?;
        let score_emotion = bounded("score_emotion", value.score_emotion, MAX_DIMENSION_SCORE)?;
        let score_thought = bounded("score_thought", value.score_thought, MAX_DIMENSION_SCORE)?;
        let score_restructuring = bounded(
            "score_restructuring",
            value.score_restructuring,
            MAX_DIMENSION_SCORE,
        )?;
        let score_action_plan = bounded(
            "score_action_plan",
            value.score_action_plan,
            MAX_DIMENSION_SCORE,
        )?;
        let total_score = bounded("total_score", value.total_score, MAX_TOTAL_SCORE)?;

        let sum = value.score_context
            + value.score_emotion
            + value.score_thought
            + value.score_restructuring
            + value.score_action_plan;
        if sum != value.total_score {
            return Err(ScoreViolation::SumMismatch {
                sum,
                total: value.total_score,
            });
        }

        Ok(Self {
            total_score,
            score_context,
            score_emotion,
            score_thought,
            score_restructuring,
            score_action_plan,
            doctor_comments: value.doctor_comments,
            patient_feedback: value.patient_feedback,
        })
    }
}

#[cfg(test)]
#[path = "tests/scoring_tests.rs"]
mod tests;
