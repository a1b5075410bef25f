use std::io::Write;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use super::domain::{Answer, Session};

/// Column order of the CSV export. Stable across releases.
pub const REPORT_COLUMNS: [&str; 10] = [
    "session_id",
    "tag_id",
    "initial_state",
    "status",
    "final_diagnosis",
    "session_timestamp",
    "question_id",
    "answer_value",
    "transcript",
    "answer_timestamp",
];

/// One session×question row; question columns are empty for unanswered sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub session_id: u64,
    pub tag_id: String,
    pub initial_state: &'static str,
    pub status: &'static str,
    pub final_diagnosis: Option<&'static str>,
    pub session_timestamp: String,
    pub question_id: Option<u8>,
    pub answer_value: Option<&'static str>,
    pub transcript: Option<String>,
    pub answer_timestamp: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to encode report: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

fn timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Left-joins each session with its answers.
pub fn build_rows<'a, I>(sessions: I) -> Vec<ReportRow>
where
    I: IntoIterator<Item = (&'a Session, &'a [Answer])>,
{
    let mut rows = Vec::new();
    for (session, answers) in sessions {
        let base = ReportRow {
            session_id: session.id.0,
            tag_id: session.tag_id.clone(),
            initial_state: session.initial_state.label(),
            status: session.status.label(),
            final_diagnosis: session.final_diagnosis.map(|diagnosis| diagnosis.label()),
            session_timestamp: timestamp(&session.created_at),
            question_id: None,
            answer_value: None,
            transcript: None,
            answer_timestamp: None,
        };

        if answers.is_empty() {
            rows.push(base);
            continue;
        }

        for answer in answers {
            rows.push(ReportRow {
                question_id: Some(answer.question_id),
                answer_value: Some(answer.value.label()),
                transcript: answer.voice_transcript.clone(),
                answer_timestamp: Some(timestamp(&answer.answered_at)),
                ..base.clone()
            });
        }
    }
    rows
}

/// Writes the header followed by every row. The header is written even when
/// there are no rows.
pub fn write_csv<W: Write>(rows: &[ReportRow], writer: W) -> Result<(), ReportError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(REPORT_COLUMNS)?;
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn render_csv(rows: &[ReportRow]) -> Result<Vec<u8>, ReportError> {
    let mut buffer = Vec::new();
    write_csv(rows, &mut buffer)?;
    Ok(buffer)
}
