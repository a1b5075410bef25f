//! RFID-triggered survey sessions: tag mapping, answer intake, scoring and fan-out.

pub mod broadcast;
pub mod domain;
pub mod events;
pub mod mapper;
pub mod questions;
pub mod report;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;
pub mod tag_feed;

#[cfg(test)]
mod tests;

pub use broadcast::BroadcastNotifier;
pub use domain::{
    Answer, AnswerSubmission, AnswerValue, Diagnosis, InitialState, NewSession, Session,
    SessionId, SessionStatus,
};
pub use events::{AnswerProgress, NotifyError, SessionOpened, SurveyEvent, SurveyNotifier};
pub use questions::{Question, QuestionSet};
pub use report::{ReportError, ReportRow, REPORT_COLUMNS};
pub use repository::{RepositoryError, SessionRepository};
pub use router::survey_router;
pub use service::{
    AnswerCounts, QuestionEntry, SessionManager, SurveyServiceError, SurveyStatistics,
    SurveySummary,
};
pub use tag_feed::{consume_tag_feed, TagFeedStats};
