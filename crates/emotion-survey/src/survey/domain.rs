use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned by the store when a session is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = std::num::ParseIntError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        raw.trim().parse::<u64>().map(SessionId)
    }
}

/// Emotional state inferred from the scanned tag before any question is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InitialState {
    Feliz,
    Triste,
    Surpreso,
    Neutro,
}

impl InitialState {
    pub const fn label(self) -> &'static str {
        match self {
            InitialState::Feliz => "Feliz",
            InitialState::Triste => "Triste",
            InitialState::Surpreso => "Surpreso",
            InitialState::Neutro => "Neutro",
        }
    }
}

/// Outcome computed once every question of a session has an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Diagnosis {
    Feliz,
    Triste,
    Neutro,
}

impl Diagnosis {
    pub const fn label(self) -> &'static str {
        match self {
            Diagnosis::Feliz => "Feliz",
            Diagnosis::Triste => "Triste",
            Diagnosis::Neutro => "Neutro",
        }
    }
}

/// Lifecycle position of a session. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Started,
    InProgress,
    Completed,
}

impl SessionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            SessionStatus::Started => "started",
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Completed => "completed",
        }
    }

    /// True when moving from `self` to `next` keeps the lifecycle monotonic.
    pub fn can_advance_to(self, next: SessionStatus) -> bool {
        next >= self
    }
}

impl FromStr for SessionStatus {
    type Err = UnknownStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "started" => Ok(SessionStatus::Started),
            "in_progress" => Ok(SessionStatus::InProgress),
            "completed" => Ok(SessionStatus::Completed),
            _ => Err(UnknownStatus(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown session status '{0}' (expected started, in_progress or completed)")]
pub struct UnknownStatus(pub String);

/// Binary answer captured from the voice transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerValue {
    Yes,
    No,
}

impl AnswerValue {
    pub const fn label(self) -> &'static str {
        match self {
            AnswerValue::Yes => "yes",
            AnswerValue::No => "no",
        }
    }
}

impl FromStr for AnswerValue {
    type Err = InvalidAnswerValue;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "yes" => Ok(AnswerValue::Yes),
            "no" => Ok(AnswerValue::No),
            _ => Err(InvalidAnswerValue(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("answer value '{0}' must be 'yes' or 'no'")]
pub struct InvalidAnswerValue(pub String);

/// One survey instance tied to a single tag scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    pub tag_id: String,
    pub initial_state: InitialState,
    pub status: SessionStatus,
    pub final_diagnosis: Option<Diagnosis>,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when persisting a new session; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSession {
    pub tag_id: String,
    pub initial_state: InitialState,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub session_id: SessionId,
    pub question_id: u8,
    pub value: AnswerValue,
    pub voice_transcript: Option<String>,
    pub answered_at: DateTime<Utc>,
}

/// Raw answer input as received from the voice front end, validated by the manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSubmission {
    pub question_id: i64,
    pub value: String,
    #[serde(default)]
    pub transcript: Option<String>,
}

impl AnswerSubmission {
    pub fn new(question_id: i64, value: impl Into<String>) -> Self {
        Self {
            question_id,
            value: value.into(),
            transcript: None,
        }
    }

    pub fn with_transcript(mut self, transcript: impl Into<String>) -> Self {
        self.transcript = Some(transcript.into());
        self
    }
}
