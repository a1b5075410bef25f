use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{
    Answer, AnswerSubmission, AnswerValue, Diagnosis, NewSession, Session, SessionId,
    SessionStatus,
};
use super::events::{AnswerProgress, SessionOpened, SurveyEvent, SurveyNotifier};
use super::mapper;
use super::questions::{Question, QuestionSet};
use super::report::{self, ReportError, ReportRow};
use super::repository::{RepositoryError, SessionRepository};
use super::scoring;

/// Owns the survey lifecycle: creation, answer ingestion, completion and deletion.
///
/// Mutations and views assembled from several repository reads share one
/// lock, so no caller sees answers without the status they produced.
pub struct SessionManager<R, N> {
    repository: Arc<R>,
    notifier: Arc<N>,
    questions: QuestionSet,
    writer: Mutex<()>,
}

impl<R, N> SessionManager<R, N>
where
    R: SessionRepository + 'static,
    N: SurveyNotifier + 'static,
{
    pub fn new(repository: Arc<R>, notifier: Arc<N>) -> Self {
        Self::with_questions(repository, notifier, QuestionSet::standard())
    }

    pub fn with_questions(repository: Arc<R>, notifier: Arc<N>, questions: QuestionSet) -> Self {
        Self {
            repository,
            notifier,
            questions,
            writer: Mutex::new(()),
        }
    }

    pub fn questions(&self) -> &QuestionSet {
        &self.questions
    }

    fn write_guard(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn announce(&self, event: SurveyEvent) {
        let kind = event.kind();
        let session_id = event.session_id();
        if let Err(err) = self.notifier.publish(event) {
            warn!(kind, %session_id, error = %err, "failed to notify listeners");
        }
    }

    fn require_session(&self, id: SessionId) -> Result<Session, SurveyServiceError> {
        self.repository
            .get_session(id)?
            .ok_or(SurveyServiceError::NotFound(id))
    }

    /// Open a new session for a scanned tag. Repeated scans open independent sessions.
    pub fn create_session(&self, tag_id: &str) -> Result<Session, SurveyServiceError> {
        let tag_id = tag_id.trim();
        if tag_id.is_empty() {
            return Err(SurveyServiceError::Validation(
                "tagId must not be empty".to_string(),
            ));
        }

        let initial_state = mapper::map_tag(tag_id);
        let session = {
            let _guard = self.write_guard();
            self.repository.create_session(NewSession {
                tag_id: tag_id.to_string(),
                initial_state,
                created_at: Utc::now(),
            })?
        };

        info!(
            session_id = %session.id,
            tag_id = %session.tag_id,
            initial_state = session.initial_state.label(),
            "survey session started"
        );

        self.announce(SurveyEvent::SessionCreated(SessionOpened {
            session_id: session.id,
            tag_id: session.tag_id.clone(),
            initial_state: session.initial_state,
            questions: self.questions.questions().to_vec(),
        }));

        Ok(session)
    }

    /// Record one answer, completing the session once every question is answered.
    ///
    /// The answer and the resulting status are stored in one repository call,
    /// so a failed write leaves the session exactly as it was.
    pub fn record_answer(
        &self,
        session_id: SessionId,
        submission: AnswerSubmission,
    ) -> Result<AnswerProgress, SurveyServiceError> {
        let progress = {
            let _guard = self.write_guard();
            let session = self.require_session(session_id)?;

            let question_id = self
                .questions
                .resolve(submission.question_id)
                .ok_or_else(|| {
                    SurveyServiceError::Validation(format!(
                        "questionId {} is outside 1..={}",
                        submission.question_id,
                        self.questions.len()
                    ))
                })?;
            let value = submission
                .value
                .parse::<AnswerValue>()
                .map_err(|err| SurveyServiceError::Validation(err.to_string()))?;
            let voice_transcript = submission
                .transcript
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty());

            let mut answers = self.repository.list_answers(session_id)?;
            if answers.iter().any(|answer| answer.question_id == question_id) {
                return Err(SurveyServiceError::Conflict {
                    session_id,
                    question_id,
                });
            }

            let answer = Answer {
                session_id,
                question_id,
                value,
                voice_transcript,
                answered_at: Utc::now(),
            };
            answers.push(answer.clone());
            let answered = answers
                .iter()
                .map(|answer| answer.question_id)
                .collect::<BTreeSet<_>>()
                .len();
            let total = self.questions.len();

            let (status, final_diagnosis) = if answered >= total {
                let breakdown = scoring::evaluate(session.initial_state, &answers);
                info!(
                    %session_id,
                    initial_weight = breakdown.initial_weight,
                    answer_weight = breakdown.answer_weight,
                    final_score = breakdown.final_score,
                    diagnosis = breakdown.diagnosis.label(),
                    "survey session completed"
                );
                (SessionStatus::Completed, Some(breakdown.diagnosis))
            } else {
                (SessionStatus::InProgress, None)
            };
            let (status, final_diagnosis) = if session.status.can_advance_to(status) {
                (status, final_diagnosis)
            } else {
                (session.status, session.final_diagnosis)
            };

            self.repository
                .record_answer(answer, status, final_diagnosis)
                .map_err(|err| match err {
                    RepositoryError::Conflict => SurveyServiceError::Conflict {
                        session_id,
                        question_id,
                    },
                    RepositoryError::NotFound => SurveyServiceError::NotFound(session_id),
                    other => SurveyServiceError::Repository(other),
                })?;

            AnswerProgress {
                session_id,
                question_id,
                value,
                answered,
                total,
                status,
                final_diagnosis,
            }
        };

        self.announce(SurveyEvent::AnswerRecorded(progress.clone()));
        Ok(progress)
    }

    pub fn get_session(&self, session_id: SessionId) -> Result<Session, SurveyServiceError> {
        self.require_session(session_id)
    }

    /// Session metadata plus one entry per question, answered or pending.
    pub fn summary(&self, session_id: SessionId) -> Result<SurveySummary, SurveyServiceError> {
        let _guard = self.write_guard();
        let session = self.require_session(session_id)?;
        let answers = self.repository.list_answers(session_id)?;

        let questions: Vec<QuestionEntry> = self
            .questions
            .questions()
            .iter()
            .map(|question| {
                let answer = answers
                    .iter()
                    .find(|answer| answer.question_id == question.id);
                QuestionEntry::new(question, answer)
            })
            .collect();

        let counts = AnswerCounts::from_entries(&questions);

        Ok(SurveySummary {
            session,
            total: questions.len(),
            questions,
            counts,
        })
    }

    /// Sessions newest first, optionally restricted to one status.
    pub fn list_sessions(
        &self,
        status: Option<SessionStatus>,
    ) -> Result<Vec<Session>, SurveyServiceError> {
        Ok(self.repository.list_sessions(status)?)
    }

    /// Administrative removal of a session and its answers.
    pub fn delete_session(&self, session_id: SessionId) -> Result<Session, SurveyServiceError> {
        let _guard = self.write_guard();
        let removed = self
            .repository
            .delete_session(session_id)
            .map_err(|err| match err {
                RepositoryError::NotFound => SurveyServiceError::NotFound(session_id),
                other => SurveyServiceError::Repository(other),
            })?;
        info!(%session_id, "survey session deleted");
        Ok(removed)
    }

    /// Delete every session created before `cutoff`, returning how many were removed.
    pub fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, SurveyServiceError> {
        let _guard = self.write_guard();
        let removed = self.repository.purge_created_before(cutoff)?;

        info!(removed, %cutoff, "purged stale survey sessions");
        Ok(removed)
    }

    /// Dashboard counters across every stored session.
    pub fn statistics(&self) -> Result<SurveyStatistics, SurveyServiceError> {
        let _guard = self.write_guard();
        let sessions = self.repository.list_sessions(None)?;
        let mut stats = SurveyStatistics {
            total_sessions: sessions.len(),
            by_status: StatusCounts::default(),
            diagnoses: DiagnosisCounts::default(),
            questions: self
                .questions
                .questions()
                .iter()
                .map(|question| QuestionTally {
                    question_id: question.id,
                    prompt: question.prompt,
                    yes: 0,
                    no: 0,
                })
                .collect(),
        };

        for session in &sessions {
            stats.by_status.record(session.status);
            if let Some(diagnosis) = session.final_diagnosis {
                stats.diagnoses.record(diagnosis);
            }
            for answer in self.repository.list_answers(session.id)? {
                if let Some(tally) = stats
                    .questions
                    .iter_mut()
                    .find(|tally| tally.question_id == answer.question_id)
                {
                    match answer.value {
                        AnswerValue::Yes => tally.yes += 1,
                        AnswerValue::No => tally.no += 1,
                    }
                }
            }
        }

        Ok(stats)
    }

    /// Flat export rows, oldest session first, answers by question id.
    pub fn report_rows(&self) -> Result<Vec<ReportRow>, SurveyServiceError> {
        let _guard = self.write_guard();
        let mut sessions = self.repository.list_sessions(None)?;
        sessions.sort_by_key(|session| session.id);

        let mut joined = Vec::with_capacity(sessions.len());
        for session in sessions {
            let mut answers = self.repository.list_answers(session.id)?;
            answers.sort_by_key(|answer| answer.question_id);
            joined.push((session, answers));
        }

        Ok(report::build_rows(
            joined
                .iter()
                .map(|(session, answers)| (session, answers.as_slice())),
        ))
    }

    pub fn export_csv(&self) -> Result<Vec<u8>, SurveyServiceError> {
        let rows = self.report_rows()?;
        Ok(report::render_csv(&rows)?)
    }
}

/// Full view of one session for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveySummary {
    pub session: Session,
    pub total: usize,
    pub questions: Vec<QuestionEntry>,
    pub counts: AnswerCounts,
}

/// Recorded answer for a question, or a pending placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionEntry {
    pub question_id: u8,
    pub prompt: &'static str,
    pub pending: bool,
    pub value: Option<AnswerValue>,
    pub voice_transcript: Option<String>,
    pub answered_at: Option<DateTime<Utc>>,
}

impl QuestionEntry {
    fn new(question: &Question, answer: Option<&Answer>) -> Self {
        Self {
            question_id: question.id,
            prompt: question.prompt,
            pending: answer.is_none(),
            value: answer.map(|answer| answer.value),
            voice_transcript: answer.and_then(|answer| answer.voice_transcript.clone()),
            answered_at: answer.map(|answer| answer.answered_at),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AnswerCounts {
    pub yes: usize,
    pub no: usize,
    pub pending: usize,
}

impl AnswerCounts {
    fn from_entries(entries: &[QuestionEntry]) -> Self {
        entries.iter().fold(Self::default(), |mut counts, entry| {
            match entry.value {
                Some(AnswerValue::Yes) => counts.yes += 1,
                Some(AnswerValue::No) => counts.no += 1,
                None => counts.pending += 1,
            }
            counts
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyStatistics {
    pub total_sessions: usize,
    pub by_status: StatusCounts,
    pub diagnoses: DiagnosisCounts,
    pub questions: Vec<QuestionTally>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub started: usize,
    pub in_progress: usize,
    pub completed: usize,
}

impl StatusCounts {
    fn record(&mut self, status: SessionStatus) {
        match status {
            SessionStatus::Started => self.started += 1,
            SessionStatus::InProgress => self.in_progress += 1,
            SessionStatus::Completed => self.completed += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiagnosisCounts {
    pub feliz: usize,
    pub triste: usize,
    pub neutro: usize,
}

impl DiagnosisCounts {
    fn record(&mut self, diagnosis: Diagnosis) {
        match diagnosis {
            Diagnosis::Feliz => self.feliz += 1,
            Diagnosis::Triste => self.triste += 1,
            Diagnosis::Neutro => self.neutro += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionTally {
    pub question_id: u8,
    pub prompt: &'static str,
    pub yes: usize,
    pub no: usize,
}

/// Error raised by the session manager.
#[derive(Debug, thiserror::Error)]
pub enum SurveyServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("session {0} not found")]
    NotFound(SessionId),
    #[error("question {question_id} of session {session_id} is already answered")]
    Conflict {
        session_id: SessionId,
        question_id: u8,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Report(#[from] ReportError),
}

impl SurveyServiceError {
    /// Stable error kind exposed in API payloads.
    pub const fn kind(&self) -> &'static str {
        match self {
            SurveyServiceError::Validation(_) => "validation",
            SurveyServiceError::NotFound(_) => "not_found",
            SurveyServiceError::Conflict { .. } => "conflict",
            SurveyServiceError::Repository(_) => "persistence",
            SurveyServiceError::Report(_) => "report",
        }
    }
}
