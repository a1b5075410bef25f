use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::{SessionTable, StoreError};
use crate::survey::{
    Answer, Diagnosis, NewSession, RepositoryError, Session, SessionId, SessionRepository,
    SessionStatus,
};

/// Single-file store: every mutation rewrites the whole JSON document.
///
/// Writes go to a sibling temp file that is synced and renamed over the
/// document, so a crash leaves either the old or the new contents. A failed
/// write leaves the in-memory tables untouched.
#[derive(Debug)]
pub struct JsonFileSessionStore {
    path: PathBuf,
    table: Mutex<SessionTable>,
}

impl JsonFileSessionStore {
    /// Loads the document at `path`; a missing or empty file starts an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let table = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|source| StoreError::Io {
                path: path.display().to_string(),
                source,
            })?;
            if content.trim().is_empty() {
                SessionTable::default()
            } else {
                serde_json::from_str::<SessionTable>(&content)
                    .map_err(|source| StoreError::Corrupt {
                        path: path.display().to_string(),
                        source,
                    })?
                    .normalized()
            }
        } else {
            SessionTable::default()
        };

        info!(
            path = %path.display(),
            sessions = table.sessions.len(),
            answers = table.answers.len(),
            "session store loaded"
        );

        Ok(Self {
            path,
            table: Mutex::new(table),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn table(&self) -> Result<MutexGuard<'_, SessionTable>, RepositoryError> {
        self.table
            .lock()
            .map_err(|_| RepositoryError::Unavailable("session table lock poisoned".to_string()))
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| "sessions.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn persist(&self, table: &SessionTable) -> Result<(), RepositoryError> {
        let unavailable = |err: std::io::Error| {
            RepositoryError::Unavailable(format!(
                "failed to write {}: {err}",
                self.path.display()
            ))
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(unavailable)?;
            }
        }

        let document = serde_json::to_vec_pretty(table)
            .map_err(|err| RepositoryError::Unavailable(err.to_string()))?;

        let temp_path = self.temp_path();
        let mut temp_file = File::create(&temp_path).map_err(unavailable)?;
        temp_file.write_all(&document).map_err(unavailable)?;
        temp_file.sync_all().map_err(unavailable)?;
        drop(temp_file);

        fs::rename(&temp_path, &self.path).map_err(unavailable)?;
        debug!(path = %self.path.display(), bytes = document.len(), "session store saved");
        Ok(())
    }

    /// Applies `change` to a copy of the tables and commits it only once the
    /// document is on disk.
    fn mutate<T>(
        &self,
        change: impl FnOnce(&mut SessionTable) -> Result<T, RepositoryError>,
    ) -> Result<T, RepositoryError> {
        let mut table = self.table()?;
        let mut draft = table.clone();
        let output = change(&mut draft)?;
        self.persist(&draft)?;
        *table = draft;
        Ok(output)
    }
}

impl SessionRepository for JsonFileSessionStore {
    fn create_session(&self, draft: NewSession) -> Result<Session, RepositoryError> {
        self.mutate(|table| Ok(table.create_session(draft)))
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
        self.mutate(|table| table.add_answer(answer))
    }

    fn record_answer(
        &self,
        answer: Answer,
        status: SessionStatus,
        final_diagnosis: Option<Diagnosis>,
    ) -> Result<Session, RepositoryError> {
        self.mutate(|table| table.record_answer(answer, status, final_diagnosis))
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
        self.mutate(|table| table.update_session_status(id, status, final_diagnosis))
    }

    fn delete_session(&self, id: SessionId) -> Result<Session, RepositoryError> {
        self.mutate(|table| table.delete_session(id))
    }

    fn purge_created_before(&self, cutoff: DateTime<Utc>) -> Result<usize, RepositoryError> {
        self.mutate(|table| Ok(table.purge_created_before(cutoff)))
    }
}
