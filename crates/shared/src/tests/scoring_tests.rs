use super::*;

fn response(scores: [i64; 5], total: i64) -> EvaluationResponse {
    EvaluationResponse {
        total_score: total,
        score_context: scores[0],
        score_emotion: scores[1],
        score_thought: scores[2],
        score_restructuring: scores[3],
        score_action_plan: scores[4],
        doctor_comments: "Thorough record, completed on time.".into(),
        patient_feedback: "You did a careful job this week.".into(),
    }
}

#[test]
fn accepts_response_whose_dimensions_sum_to_total() {
    let result = EvaluationResult::try_from(response([16, 15, 14, 13, 12], 70)).expect("valid");
    assert_eq!(result.total_score(), 70);
    assert_eq!(result.dimension_sum(), 70);
    assert_eq!(result.score(ScoreDimension::AutomaticThought), 14);
    assert_eq!(result.patient_feedback(), "You did a careful job this week.");
}

#[test]
fn rejects_sum_mismatch() {
    let err = EvaluationResult::try_from(response([16, 15, 14, 13, 12], 71)).expect_err("mismatch");
    assert_eq!(err, ScoreViolation::SumMismatch { sum: 70, total: 71 });
}

#[test]
fn rejects_dimension_out_of_range() {
    let err = EvaluationResult::try_from(response([21, 15, 14, 13, 12], 75)).expect_err("range");
    assert!(matches!(
        err,
        ScoreViolation::OutOfRange {
            field: "score_context",
            value: 21,
            ..
        }
    ));

    let err = EvaluationResult::try_from(response([-1, 15, 14, 13, 12], 53)).expect_err("range");
    assert!(matches!(err, ScoreViolation::OutOfRange { value: -1, .. }));
}

#[test]
fn bands_follow_dimension_thresholds() {
    assert_eq!(ScoreBand::for_dimension_score(20), ScoreBand::Good);
    assert_eq!(ScoreBand::for_dimension_score(16), ScoreBand::Good);
    assert_eq!(ScoreBand::for_dimension_score(12), ScoreBand::Fair);
    assert_eq!(ScoreBand::for_dimension_score(11), ScoreBand::NeedsImprovement);
}

#[test]
fn overall_band_uses_mean_dimension_score() {
    let strong = EvaluationResult::from_dimensions([17, 16, 16, 16, 15], "", "").expect("valid");
    assert_eq!(strong.total_score(), 80);
    assert_eq!(strong.overall_band(), ScoreBand::Good);

    let middling = EvaluationResult::from_dimensions([12, 12, 12, 12, 12], "", "").expect("valid");
    assert_eq!(middling.overall_band(), ScoreBand::Fair);

    let weak = EvaluationResult::from_dimensions([10, 8, 12, 9, 11], "", "").expect("valid");
    assert_eq!(weak.overall_band(), ScoreBand::NeedsImprovement);
}

#[test]
fn to_response_round_trips_through_validation() {
    let result = EvaluationResult::from_dimensions([5, 6, 7, 8, 9], "notes", "feedback")
        .expect("valid");
    let again = EvaluationResult::try_from(result.to_response()).expect("valid");
    assert_eq!(again, result);
    assert_eq!(
        again.dimensions().map(|(dimension, _)| dimension),
        ScoreDimension::ALL
    );
}
