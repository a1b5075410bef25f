use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::SessionTable;
use crate::survey::{
    Answer, Diagnosis, NewSession, RepositoryError, Session, SessionId, SessionRepository,
    SessionStatus,
};

/// Volatile store; contents are lost on restart.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    table: Mutex<SessionTable>,
}

impl InMemorySessionStore {
    fn table(&self) -> Result<MutexGuard<'_, SessionTable>, RepositoryError> {
        self.table
            .lock()
            .map_err(|_| RepositoryError::Unavailable("session table lock poisoned".to_string()))
    }
}

impl SessionRepository for InMemorySessionStore {
    fn create_session(&self, draft: NewSession) -> Result<Session, RepositoryError> {
        Ok(self.table()?.create_session(draft))
    }

    fn get_session(&self, id: SessionId) -> Result<Option<Session>, RepositoryError> {
        Ok(self.table()?.get_session(id))
    }

    fn list_sessions(
        &self,
        status: Option<SessionStatus>,
    ) -> Result<Vec<Session>, RepositoryError> {
        Ok(self.table()?.list_sessions(status))
    }

    fn add_answer(&self, answer: Answer) -> Result<Answer, RepositoryError> {
        self.table()?.add_answer(answer)
    }

    fn record_answer(
        &self,
        answer: Answer,
        status: SessionStatus,
        final_diagnosis: Option<Diagnosis>,
    ) -> Result<Session, RepositoryError> {
        self.table()?.record_answer(answer, status, final_diagnosis)
    }

    fn list_answers(&self, id: SessionId) -> Result<Vec<Answer>, RepositoryError> {
        Ok(self.table()?.list_answers(id))
    }

    fn update_session_status(
        &self,
        id: SessionId,
        status: SessionStatus,
        final_diagnosis: Option<Diagnosis>,
    ) -> Result<Session, RepositoryError> {
        self.table()?
            .update_session_status(id, status, final_diagnosis)
    }

    fn delete_session(&self, id: SessionId) -> Result<Session, RepositoryError> {
        self.table()?.delete_session(id)
    }

    fn purge_created_before(&self, cutoff: DateTime<Utc>) -> Result<usize, RepositoryError> {
        Ok(self.table()?.purge_created_before(cutoff))
    }
}
