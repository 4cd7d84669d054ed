use shared::scoring::{
    EvaluationResult, ScoreBand, ScoreDimension, ScoreViolation, MAX_DIMENSION_SCORE,
};

const CUE_POINTS: u8 = 4;
const CUE_POINTS_CAP: u8 = 12;
const CHARS_PER_LENGTH_POINT: usize = 40;
const LENGTH_POINTS_CAP: u8 = 8;

fn cues(dimension: ScoreDimension) -> &'static [&'static str] {
    match dimension {
        ScoreDimension::Context => &[
            "yesterday", "today", "meeting", "at work", "when", "situation", "情境", "昨天",
        ],
        ScoreDimension::Emotion => &[
            "felt", "feel", "angry", "anxious", "anxiety", "sad", "ashamed", "nervous", "%",
            "情绪", "感到",
        ],
        ScoreDimension::AutomaticThought => &[
            "thought", "think", "believe", "told myself", "思维", "心想", "认为",
        ],
        ScoreDimension::Restructuring => &[
            "realize", "realise", "evidence", "alternative", "instead", "actually",
            "认知重构", "意识到", "实际上",
        ],
        ScoreDimension::ActionPlan => &[
            "plan", "will", "decide", "tomorrow", "next time", "行动计划", "决定", "计划",
        ],
    }
}

fn feedback_for(band: ScoreBand) -> &'static str {
    match band {
        ScoreBand::Good => "Excellent work this week. Your record is detailed and balanced.",
        ScoreBand::Fair => "Good effort. Try adding more detail about your thoughts and next steps.",
        ScoreBand::NeedsImprovement => {
            "Thank you for your effort. Next time, write down what happened and what you plan to try."
        }
    }
}

pub fn score_submission(text: &str) -> Result<EvaluationResult, ScoreViolation> {
    let lowered = text.to_lowercase();
    let length_points = u8::try_from(text.trim().chars().count() / CHARS_PER_LENGTH_POINT)
        .unwrap_or(u8::MAX)
        .min(LENGTH_POINTS_CAP);

    let mut scores = [0u8; 5];
    for (slot, dimension) in scores.iter_mut().zip(ScoreDimension::ALL) {
        let hits = cues(dimension)
            .iter()
            .filter(|cue| lowered.contains(**cue))
            .count();
        let cue_points = u8::try_from(hits)
            .unwrap_or(u8::MAX)
            .saturating_mul(CUE_POINTS)
            .min(CUE_POINTS_CAP);
        *slot = (cue_points + length_points).min(MAX_DIMENSION_SCORE);
    }

    let weakest = ScoreDimension::ALL
        .into_iter()
        .zip(scores)
        .min_by_key(|(_, score)| *score)
        .map_or(ScoreDimension::Context, |(dimension, _)| dimension);
    let doctor_comments = format!(
        "Weakest area: {} (should be {}).",
        weakest.label(),
        weakest.criterion()
    );
    let mean = scores.iter().map(|score| u16::from(*score)).sum::<u16>() / 5;
    let band = ScoreBand::for_dimension_score(u8::try_from(mean).unwrap_or(MAX_DIMENSION_SCORE));

    EvaluationResult::from_dimensions(scores, doctor_comments, feedback_for(band))
}

#[cfg(test)]
#[path = "tests/scoring_tests.rs"]
mod tests;
