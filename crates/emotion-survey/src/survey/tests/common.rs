use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use axum::response::Response;
use serde_json::Value;

use crate::store::InMemorySessionStore;
use crate::survey::domain::{
    Answer, AnswerSubmission, Diagnosis, NewSession, Session, SessionId, SessionStatus,
};
use crate::survey::events::{NotifyError, SurveyEvent, SurveyNotifier};
use crate::survey::repository::{RepositoryError, SessionRepository};
use crate::survey::{survey_router, SessionManager};

#[derive(Default)]
pub(super) struct MemoryNotifier {
    events: Mutex<Vec<SurveyEvent>>,
}

impl SurveyNotifier for MemoryNotifier {
    fn publish(&self, event: SurveyEvent) -> Result<(), NotifyError> {
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push(event);
        Ok(())
    }
}

impl MemoryNotifier {
    pub(super) fn events(&self) -> Vec<SurveyEvent> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }

    pub(super) fn kinds(&self) -> Vec<&'static str> {
        self.events().iter().map(SurveyEvent::kind).collect()
    }
}

/// Listener transport that is always down.
pub(super) struct OfflineNotifier;

impl SurveyNotifier for OfflineNotifier {
    fn publish(&self, _event: SurveyEvent) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("dashboard offline".to_string()))
    }
}

pub(super) struct UnavailableRepository;

impl SessionRepository for UnavailableRepository {
    fn create_session(&self, _draft: NewSession) -> Result<Session, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn get_session(&self, _id: SessionId) -> Result<Option<Session>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_sessions(
        &self,
        _status: Option<SessionStatus>,
    ) -> Result<Vec<Session>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn add_answer(&self, _answer: Answer) -> Result<Answer, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn record_answer(
        &self,
        _answer: Answer,
        _status: SessionStatus,
        _final_diagnosis: Option<Diagnosis>,
    ) -> Result<Session, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_answers(&self, _id: SessionId) -> Result<Vec<Answer>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_session_status(
        &self,
        _id: SessionId,
        _status: SessionStatus,
        _final_diagnosis: Option<Diagnosis>,
    ) -> Result<Session, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete_session(&self, _id: SessionId) -> Result<Session, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn purge_created_before(&self, _cutoff: DateTime<Utc>) -> Result<usize, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// In-memory store whose writes can be made to fail on demand.
#[derive(Default)]
pub(super) struct FlakyRepository {
    inner: InMemorySessionStore,
    failing: AtomicBool,
}

impl FlakyRepository {
    pub(super) fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), RepositoryError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(RepositoryError::Unavailable("disk full".to_string()))
        } else {
            Ok(())
        }
    }
}

impl SessionRepository for FlakyRepository {
    fn create_session(&self, draft: NewSession) -> Result<Session, RepositoryError> {
        self.check()?;
        self.inner.create_session(draft)
    }

    fn get_session(&self, id: SessionId) -> Result<Option<Session>, RepositoryError> {
        self.inner.get_session(id)
    }

    fn list_sessions(
        &self,
        status: Option<SessionStatus>,
    ) -> Result<Vec<Session>, RepositoryError> {
        self.inner.list_sessions(status)
    }

    fn add_answer(&self, answer: Answer) -> Result<Answer, RepositoryError> {
        self.check()?;
        self.inner.add_answer(answer)
    }

    fn record_answer(
        &self,
        answer: Answer,
        status: SessionStatus,
        final_diagnosis: Option<Diagnosis>,
    ) -> Result<Session, RepositoryError> {
        self.check()?;
        self.inner.record_answer(answer, status, final_diagnosis)
    }

    fn list_answers(&self, id: SessionId) -> Result<Vec<Answer>, RepositoryError> {
        self.inner.list_answers(id)
    }

    fn update_session_status(
        &self,
        id: SessionId,
        status: SessionStatus,
        final_diagnosis: Option<Diagnosis>,
    ) -> Result<Session, RepositoryError> {
        self.check()?;
        self.inner.update_session_status(id, status, final_diagnosis)
    }

    fn delete_session(&self, id: SessionId) -> Result<Session, RepositoryError> {
        self.check()?;
        self.inner.delete_session(id)
    }

    fn purge_created_before(&self, cutoff: DateTime<Utc>) -> Result<usize, RepositoryError> {
        self.check()?;
        self.inner.purge_created_before(cutoff)
    }
}

pub(super) type TestManager = SessionManager<InMemorySessionStore, MemoryNotifier>;

pub(super) fn build_manager() -> (
    TestManager,
    Arc<InMemorySessionStore>,
    Arc<MemoryNotifier>,
) {
    let repository = Arc::new(InMemorySessionStore::default());
    let notifier = Arc::new(MemoryNotifier::default());
    let manager = SessionManager::new(repository.clone(), notifier.clone());
    (manager, repository, notifier)
}

pub(super) fn yes(question_id: i64) -> AnswerSubmission {
    AnswerSubmission::new(question_id, "yes")
}

pub(super) fn no(question_id: i64) -> AnswerSubmission {
    AnswerSubmission::new(question_id, "no")
}

/// Answers every question with `value`, returning the last progress report.
pub(super) fn answer_all(
    manager: &TestManager,
    session_id: SessionId,
    value: &str,
) -> crate::survey::AnswerProgress {
    let total = manager.questions().len() as i64;
    let mut last = None;
    for question_id in 1..=total {
        last = Some(
            manager
                .record_answer(session_id, AnswerSubmission::new(question_id, value))
                .expect("answer recorded"),
        );
    }
    last.expect("at least one question")
}

pub(super) fn router_with_manager(manager: TestManager) -> axum::Router {
    survey_router(Arc::new(manager))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf8 body")
}
