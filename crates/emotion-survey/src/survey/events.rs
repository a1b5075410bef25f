use serde::Serialize;

use super::domain::{AnswerValue, Diagnosis, InitialState, SessionId, SessionStatus};
use super::questions::Question;

/// Lifecycle notification fanned out to dashboards and the robot face.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SurveyEvent {
    SessionCreated(SessionOpened),
    AnswerRecorded(AnswerProgress),
}

impl SurveyEvent {
    pub const fn kind(&self) -> &'static str {
        match self {
            SurveyEvent::SessionCreated(_) => "session_created",
            SurveyEvent::AnswerRecorded(_) => "answer_recorded",
        }
    }

    pub fn session_id(&self) -> SessionId {
        match self {
            SurveyEvent::SessionCreated(opened) => opened.session_id,
            SurveyEvent::AnswerRecorded(progress) => progress.session_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOpened {
    pub session_id: SessionId,
    pub tag_id: String,
    pub initial_state: InitialState,
    pub questions: Vec<Question>,
}

/// Running progress after an answer; also the HTTP response body for answers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerProgress {
    pub session_id: SessionId,
    pub question_id: u8,
    pub value: AnswerValue,
    pub answered: usize,
    pub total: usize,
    pub status: SessionStatus,
    pub final_diagnosis: Option<Diagnosis>,
}

/// Outbound hook for lifecycle events (e.g. SSE or WebSocket adapters).
pub trait SurveyNotifier: Send + Sync {
    fn publish(&self, event: SurveyEvent) -> Result<(), NotifyError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("event transport unavailable: {0}")]
    Transport(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::questions::QuestionSet;
    use serde_json::json;

    #[test]
    fn session_created_serializes_with_type_tag() {
        let event = SurveyEvent::SessionCreated(SessionOpened {
            session_id: SessionId(7),
            tag_id: "feliz".to_string(),
            initial_state: InitialState::Feliz,
            questions: QuestionSet::standard().questions()[..1].to_vec(),
        });

        let value = serde_json::to_value(&event).expect("serializes");
        assert_eq!(
            value,
            json!({
                "type": "session_created",
                "sessionId": 7,
                "tagId": "feliz",
                "initialState": "Feliz",
                "questions": [{ "id": 1, "prompt": "Dia foi satisfatório?" }],
            })
        );
        assert_eq!(event.kind(), "session_created");
    }

    #[test]
    fn answer_recorded_carries_progress_fields() {
        let event = SurveyEvent::AnswerRecorded(AnswerProgress {
            session_id: SessionId(3),
            question_id: 8,
            value: AnswerValue::Yes,
            answered: 8,
            total: 8,
            status: SessionStatus::Completed,
            final_diagnosis: Some(Diagnosis::Feliz),
        });

        let value = serde_json::to_value(&event).expect("serializes");
        assert_eq!(value["type"], "answer_recorded");
        assert_eq!(value["questionId"], 8);
        assert_eq!(value["value"], "yes");
        assert_eq!(value["answered"], 8);
        assert_eq!(value["total"], 8);
        assert_eq!(value["status"], "completed");
        assert_eq!(value["finalDiagnosis"], "Feliz");
        assert_eq!(event.session_id(), SessionId(3));
    }
}
