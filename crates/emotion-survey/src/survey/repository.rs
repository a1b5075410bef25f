use chrono::{DateTime, Utc};

use super::domain::{Answer, Diagnosis, NewSession, Session, SessionId, SessionStatus};

/// Storage abstraction so the session manager can be exercised in isolation.
///
/// Implementations hold no business rules beyond referential checks and the
/// one-answer-per-question constraint.
pub trait SessionRepository: Send + Sync {
    fn create_session(&self, draft: NewSession) -> Result<Session, RepositoryError>;
    fn get_session(&self, id: SessionId) -> Result<Option<Session>, RepositoryError>;
    /// Sessions newest first, optionally restricted to one status.
    fn list_sessions(&self, status: Option<SessionStatus>)
        -> Result<Vec<Session>, RepositoryError>;
    /// Fails with `Conflict` when the question already has an answer and
    /// `NotFound` when the session does not exist.
    fn add_answer(&self, answer: Answer) -> Result<Answer, RepositoryError>;
    /// Stores `answer` and moves its session to `status` as one change.
    ///
    /// Fails like `add_answer`; on any failure neither the answer nor the
    /// status is applied.
    fn record_answer(
        &self,
        answer: Answer,
        status: SessionStatus,
        final_diagnosis: Option<Diagnosis>,
    ) -> Result<Session, RepositoryError>;
    /// Answers ordered by question id; empty for unknown sessions.
    fn list_answers(&self, id: SessionId) -> Result<Vec<Answer>, RepositoryError>;
    fn update_session_status(
        &self,
        id: SessionId,
        status: SessionStatus,
        final_diagnosis: Option<Diagnosis>,
    ) -> Result<Session, RepositoryError>;
    /// Removes the answers first, then the session, returning the removed session.
    fn delete_session(&self, id: SessionId) -> Result<Session, RepositoryError>;
    /// Removes every session created before `cutoff` with its answers in one
    /// change, returning how many sessions went away.
    fn purge_created_before(&self, cutoff: DateTime<Utc>) -> Result<usize, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
