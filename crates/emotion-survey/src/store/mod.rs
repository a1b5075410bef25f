//! Concrete `SessionRepository` implementations.

mod json_file;
mod memory;

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};

use serde::{Deserialize, Serialize};

use crate::survey::{
    Answer, Diagnosis, NewSession, RepositoryError, Session, SessionId, SessionRepository,
    SessionStatus,
};

pub use json_file::JsonFileSessionStore;
pub use memory::InMemorySessionStore;

/// Plain record tables shared by the stores. Ids continue from `next_id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SessionTable {
    #[serde(default)]
    next_id: u64,
    #[serde(default)]
    sessions: Vec<Session>,
    #[serde(default)]
    answers: Vec<Answer>,
}

impl SessionTable {
    /// Repairs the id counter after loading a document written by hand or by an older build.
    fn normalized(mut self) -> Self {
        let highest = self
            .sessions
            .iter()
            .map(|session| session.id.0)
            .max()
            .unwrap_or(0);
        self.next_id = self.next_id.max(highest);
        self
    }

    fn create_session(&mut self, draft: NewSession) -> Session {
        self.next_id += 1;
        let session = Session {
            id: SessionId(self.next_id),
            tag_id: draft.tag_id,
            initial_state: draft.initial_state,
            status: SessionStatus::Started,
            final_diagnosis: None,
            created_at: draft.created_at,
        };
        self.sessions.push(session.clone());
        session
    }

    fn get_session(&self, id: SessionId) -> Option<Session> {
        self.sessions.iter().find(|session| session.id == id).cloned()
    }

    fn list_sessions(&self, status: Option<SessionStatus>) -> Vec<Session> {
        let mut sessions: Vec<Session> = self
            .sessions
            .iter()
            .filter(|session| status.map_or(true, |wanted| session.status == wanted))
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        sessions
    }

    fn add_answer(&mut self, answer: Answer) -> Result<Answer, RepositoryError> {
        if !self
            .sessions
            .iter()
            .any(|session| session.id == answer.session_id)
        {
            return Err(RepositoryError::NotFound);
        }
        if self.answers.iter().any(|existing| {
            existing.session_id == answer.session_id && existing.question_id == answer.question_id
        }) {
            return Err(RepositoryError::Conflict);
        }
        self.answers.push(answer.clone());
        Ok(answer)
    }

    fn record_answer(
        &mut self,
        answer: Answer,
        status: SessionStatus,
        final_diagnosis: Option<Diagnosis>,
    ) -> Result<Session, RepositoryError> {
        let session_id = answer.session_id;
        self.add_answer(answer)?;
        self.update_session_status(session_id, status, final_diagnosis)
    }

    fn list_answers(&self, id: SessionId) -> Vec<Answer> {
        let mut answers: Vec<Answer> = self
            .answers
            .iter()
            .filter(|answer| answer.session_id == id)
            .cloned()
            .collect();
        answers.sort_by_key(|answer| answer.question_id);
        answers
    }

    fn update_session_status(
        &mut self,
        id: SessionId,
        status: SessionStatus,
        final_diagnosis: Option<Diagnosis>,
    ) -> Result<Session, RepositoryError> {
        let session = self
            .sessions
            .iter_mut()
            .find(|session| session.id == id)
            .ok_or(RepositoryError::NotFound)?;
        session.status = status;
        session.final_diagnosis = final_diagnosis;
        Ok(session.clone())
    }

    fn delete_session(&mut self, id: SessionId) -> Result<Session, RepositoryError> {
        let position = self
            .sessions
            .iter()
            .position(|session| session.id == id)
            .ok_or(RepositoryError::NotFound)?;
        self.answers.retain(|answer| answer.session_id != id);
        Ok(self.sessions.remove(position))
    }

    fn purge_created_before(&mut self, cutoff: DateTime<Utc>) -> usize {
        let stale: HashSet<SessionId> = self
            .sessions
            .iter()
            .filter(|session| session.created_at < cutoff)
            .map(|session| session.id)
            .collect();
        self.answers
            .retain(|answer| !stale.contains(&answer.session_id));
        self.sessions.retain(|session| !stale.contains(&session.id));
        stale.len()
    }
}

/// Errors raised while opening a store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read session store {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("session store {path} is not valid JSON: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Store selected at startup: in memory, or backed by a single JSON file.
pub enum SessionStore {
    Memory(InMemorySessionStore),
    File(JsonFileSessionStore),
}

impl SessionStore {
    pub fn open(data_file: Option<&Path>) -> Result<Self, StoreError> {
        match data_file {
            Some(path) => Ok(Self::File(JsonFileSessionStore::open(path)?)),
            None => Ok(Self::Memory(InMemorySessionStore::default())),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            SessionStore::Memory(_) => "in-memory".to_string(),
            SessionStore::File(store) => format!("file {}", store.path().display()),
        }
    }

    fn inner(&self) -> &dyn SessionRepository {
        match self {
            SessionStore::Memory(store) => store,
            SessionStore::File(store) => store,
        }
    }
}

impl SessionRepository for SessionStore {
    fn create_session(&self, draft: NewSession) -> Result<Session, RepositoryError> {
        self.inner().create_session(draft)
    }

    fn get_session(&self, id: SessionId) -> Result<Option<Session>, RepositoryError> {
        self.inner().get_session(id)
    }

    fn list_sessions(
        &self,
        status: Option<SessionStatus>,
    ) -> Result<Vec<Session>, RepositoryError> {
        self.inner().list_sessions(status)
    }

    fn add_answer(&self, answer: Answer) -> Result<Answer, RepositoryError> {
        self.inner().add_answer(answer)
    }

    fn record_answer(
        &self,
        answer: Answer,
        status: SessionStatus,
        final_diagnosis: Option<Diagnosis>,
    ) -> Result<Session, RepositoryError> {
        self.inner().record_answer(answer, status, final_diagnosis)
    }

    fn list_answers(&self, id: SessionId) -> Result<Vec<Answer>, RepositoryError> {
        self.inner().list_answers(id)
    }

    fn update_session_status(
        &self,
        id: SessionId,
        status: SessionStatus,
        final_diagnosis: Option<Diagnosis>,
    ) -> Result<Session, RepositoryError> {
        self.inner()
            .update_session_status(id, status, final_diagnosis)
    }

    fn delete_session(&self, id: SessionId) -> Result<Session, RepositoryError> {
        self.inner().delete_session(id)
    }

    fn purge_created_before(&self, cutoff: DateTime<Utc>) -> Result<usize, RepositoryError> {
        self.inner().purge_created_before(cutoff)
    }
}
