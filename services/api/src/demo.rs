use crate::infra::{build_manager, SurveyManager};
use chrono::{Duration, Utc};
use clap::Args;
use emotion_survey::config::AppConfig;
use emotion_survey::error::AppError;
use emotion_survey::store::SessionStore;
use emotion_survey::survey::{AnswerSubmission, AnswerValue, BroadcastNotifier, SessionStatus};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct ReportArgs {
    /// JSON document to export (defaults to SURVEY_DATA_FILE)
    #[arg(long)]
    pub(crate) data_file: Option<PathBuf>,
    /// Destination CSV file; the report goes to stdout when omitted
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Persist the demo sessions to this JSON document instead of memory
    #[arg(long)]
    pub(crate) data_file: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct PurgeArgs {
    /// Remove sessions older than this many days (defaults to SURVEY_RETENTION_DAYS)
    #[arg(long)]
    pub(crate) days: Option<u32>,
    /// JSON document to clean up (defaults to SURVEY_DATA_FILE)
    #[arg(long)]
    pub(crate) data_file: Option<PathBuf>,
}

/// A scripted visitor: the tag they scan and the answers they give, in order.
pub(crate) struct DemoVisitor {
    pub(crate) tag_id: &'static str,
    pub(crate) answers: [AnswerValue; 8],
}

const Y: AnswerValue = AnswerValue::Yes;
const N: AnswerValue = AnswerValue::No;

pub(crate) const DEMO_VISITORS: [DemoVisitor; 5] = [
    DemoVisitor {
        tag_id: "feliz",
        answers: [Y, Y, Y, Y, Y, Y, Y, Y],
    },
    DemoVisitor {
        tag_id: "triste",
        answers: [N, N, N, N, N, Y, N, N],
    },
    DemoVisitor {
        tag_id: "surpreso",
        answers: [Y, N, Y, N, Y, N, Y, N],
    },
    DemoVisitor {
        tag_id: "cafe123",
        answers: [Y, Y, Y, Y, N, Y, Y, Y],
    },
    DemoVisitor {
        tag_id: "deadbeef",
        answers: [N, N, Y, N, N, N, N, Y],
    },
];

fn open_manager(data_file: Option<PathBuf>) -> Result<std::sync::Arc<SurveyManager>, AppError> {
    let store = SessionStore::open(data_file.as_deref())?;
    Ok(build_manager(store, BroadcastNotifier::default()))
}

fn required_data_file(
    explicit: Option<PathBuf>,
    config: &AppConfig,
    command: &'static str,
) -> Result<PathBuf, AppError> {
    explicit
        .or_else(|| config.storage.data_file.clone())
        .ok_or(AppError::MissingDataFile(command))
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let data_file = required_data_file(args.data_file, &config, "report")?;
    let manager = open_manager(Some(data_file))?;
    let csv = manager.export_csv()?;

    match args.output {
        Some(path) => {
            fs::write(&path, &csv)?;
            println!("Report written to {}", path.display());
        }
        None => std::io::stdout().write_all(&csv)?,
    }
    Ok(())
}

pub(crate) fn run_purge(args: PurgeArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let data_file = required_data_file(args.data_file, &config, "purge")?;
    let days = args.days.unwrap_or(config.storage.retention_days);
    let manager = open_manager(Some(data_file))?;

    let cutoff = Utc::now() - Duration::days(i64::from(days));
    let removed = manager.purge_older_than(cutoff)?;
    println!("Removed {removed} session(s) created before {}", cutoff.to_rfc3339());
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let manager = open_manager(args.data_file)?;

    println!("Emotion survey demo");
    for visitor in &DEMO_VISITORS {
        let outcome = seed_visitor(&manager, visitor)?;
        println!(
            "- tag {:<9} | initial {:<8} | yes {} / no {} | diagnosis {}",
            visitor.tag_id,
            outcome.initial_state,
            outcome.yes,
            outcome.no,
            outcome.diagnosis,
        );
    }

    let stats = manager.statistics()?;
    println!(
        "\n{} session(s): {} feliz | {} triste | {} neutro",
        stats.total_sessions, stats.diagnoses.feliz, stats.diagnoses.triste, stats.diagnoses.neutro
    );
    Ok(())
}

#[derive(Debug)]
pub(crate) struct DemoOutcome {
    pub(crate) initial_state: &'static str,
    pub(crate) yes: usize,
    pub(crate) no: usize,
    pub(crate) diagnosis: &'static str,
}

pub(crate) fn seed_visitor(
    manager: &SurveyManager,
    visitor: &DemoVisitor,
) -> Result<DemoOutcome, AppError> {
    let session = manager.create_session(visitor.tag_id)?;
    let mut progress = None;
    for (index, value) in visitor.answers.iter().enumerate() {
        let submission = AnswerSubmission::new(index as i64 + 1, value.label());
        progress = Some(manager.record_answer(session.id, submission)?);
    }

    let diagnosis = progress
        .filter(|progress| progress.status == SessionStatus::Completed)
        .and_then(|progress| progress.final_diagnosis)
        .map(|diagnosis| diagnosis.label())
        .unwrap_or("pending");
    let yes = visitor
        .answers
        .iter()
        .filter(|value| **value == AnswerValue::Yes)
        .count();

    Ok(DemoOutcome {
        initial_state: session.initial_state.label(),
        yes,
        no: visitor.answers.len() - yes,
        diagnosis,
    })
}
