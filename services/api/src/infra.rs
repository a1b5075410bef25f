use emotion_survey::store::SessionStore;
use emotion_survey::survey::{BroadcastNotifier, SessionManager};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Manager wired to the runtime-selected store and the live event channel.
pub(crate) type SurveyManager = SessionManager<SessionStore, BroadcastNotifier>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn build_manager(store: SessionStore, notifier: BroadcastNotifier) -> Arc<SurveyManager> {
    Arc::new(SessionManager::new(Arc::new(store), Arc::new(notifier)))
}
