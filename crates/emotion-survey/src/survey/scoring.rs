use serde::Serialize;

use super::domain::{Answer, AnswerValue, Diagnosis, InitialState};

const ANSWER_WEIGHT: f64 = 0.7;
const DIAGNOSIS_THRESHOLD: f64 = 0.2;

/// Score components kept for logging and audits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub initial_weight: f64,
    pub answer_weight: f64,
    pub final_score: f64,
    pub diagnosis: Diagnosis,
}

pub fn initial_weight(state: InitialState) -> f64 {
    match state {
        InitialState::Feliz => 0.3,
        InitialState::Triste => -0.3,
        InitialState::Surpreso => 0.1,
        InitialState::Neutro => 0.0,
    }
}

/// Weighted balance of yes over no answers, zero when nothing was answered.
pub fn answer_weight<I>(values: I) -> f64
where
    I: IntoIterator<Item = AnswerValue>,
{
    let (yes, no) = values
        .into_iter()
        .fold((0u32, 0u32), |(yes, no), value| match value {
            AnswerValue::Yes => (yes + 1, no),
            AnswerValue::No => (yes, no + 1),
        });
    let total = yes + no;
    if total == 0 {
        return 0.0;
    }
    (f64::from(yes) - f64::from(no)) / f64::from(total) * ANSWER_WEIGHT
}

pub fn classify(final_score: f64) -> Diagnosis {
    if final_score > DIAGNOSIS_THRESHOLD {
        Diagnosis::Feliz
    } else if final_score < -DIAGNOSIS_THRESHOLD {
        Diagnosis::Triste
    } else {
        Diagnosis::Neutro
    }
}

pub fn evaluate(initial_state: InitialState, answers: &[Answer]) -> ScoreBreakdown {
    let initial_weight = initial_weight(initial_state);
    let answer_weight = answer_weight(answers.iter().map(|answer| answer.value));
    let final_score = initial_weight + answer_weight;

    ScoreBreakdown {
        initial_weight,
        answer_weight,
        final_score,
        diagnosis: classify(final_score),
    }
}

pub fn score(initial_state: InitialState, answers: &[Answer]) -> Diagnosis {
    evaluate(initial_state, answers).diagnosis
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::domain::SessionId;
    use chrono::Utc;

    fn answers(values: &[AnswerValue]) -> Vec<Answer> {
        values
            .iter()
            .enumerate()
            .map(|(index, value)| Answer {
                session_id: SessionId(1),
                question_id: (index + 1) as u8,
                value: *value,
                voice_transcript: None,
                answered_at: Utc::now(),
            })
            .collect()
    }

    #[test]
    fn happy_tag_without_answers_stays_happy() {
        let breakdown = evaluate(InitialState::Feliz, &[]);
        assert!((breakdown.final_score - 0.3).abs() < 1e-9);
        assert_eq!(breakdown.answer_weight, 0.0);
        assert_eq!(breakdown.diagnosis, Diagnosis::Feliz);
    }

    #[test]
    fn balanced_answers_from_neutral_stay_neutral() {
        let mut values = vec![AnswerValue::Yes; 4];
        values.extend([AnswerValue::No; 4]);
        let breakdown = evaluate(InitialState::Neutro, &answers(&values));
        assert!(breakdown.final_score.abs() < 1e-9);
        assert_eq!(breakdown.diagnosis, Diagnosis::Neutro);
    }

    #[test]
    fn answers_can_override_a_sad_tag() {
        let breakdown = evaluate(InitialState::Triste, &answers(&[AnswerValue::Yes; 8]));
        assert!((breakdown.final_score - 0.4).abs() < 1e-9);
        assert_eq!(breakdown.diagnosis, Diagnosis::Feliz);
    }

    #[test]
    fn mostly_negative_answers_yield_sad() {
        let values = [
            AnswerValue::No,
            AnswerValue::No,
            AnswerValue::No,
            AnswerValue::No,
            AnswerValue::No,
            AnswerValue::Yes,
            AnswerValue::No,
            AnswerValue::No,
        ];
        assert_eq!(
            score(InitialState::Neutro, &answers(&values)),
            Diagnosis::Triste
        );
    }

    #[test]
    fn thresholds_are_exclusive() {
        assert_eq!(classify(0.2), Diagnosis::Neutro);
        assert_eq!(classify(-0.2), Diagnosis::Neutro);
        assert_eq!(classify(0.2001), Diagnosis::Feliz);
        assert_eq!(classify(-0.2001), Diagnosis::Triste);
    }

    #[test]
    fn surprised_tag_leans_neutral_on_balanced_answers() {
        let values = [
            AnswerValue::Yes,
            AnswerValue::No,
            AnswerValue::Yes,
            AnswerValue::No,
            AnswerValue::Yes,
            AnswerValue::No,
            AnswerValue::Yes,
            AnswerValue::No,
        ];
        assert_eq!(
            score(InitialState::Surpreso, &answers(&values)),
            Diagnosis::Neutro
        );
    }

    #[test]
    fn scoring_is_deterministic() {
        let set = answers(&[AnswerValue::Yes, AnswerValue::No, AnswerValue::Yes]);
        let first = evaluate(InitialState::Surpreso, &set);
        for _ in 0..10 {
            assert_eq!(evaluate(InitialState::Surpreso, &set), first);
        }
    }
}
