use crate::cli::ServeArgs;
use crate::infra::{build_manager, AppState, SurveyManager};
use crate::routes::with_survey_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use emotion_survey::config::AppConfig;
use emotion_survey::error::AppError;
use emotion_survey::store::SessionStore;
use emotion_survey::survey::{consume_tag_feed, BroadcastNotifier};
use emotion_survey::telemetry;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(data_file) = args.data_file.take() {
        config.storage.data_file = Some(data_file);
    }
    if let Some(feed_path) = args.tag_feed.take() {
        config.tag_reader.feed_path = Some(feed_path);
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = SessionStore::open(config.storage.data_file.as_deref())?;
    info!(store = %store.describe(), "session store ready");

    let notifier = BroadcastNotifier::new(config.events.capacity);
    let manager = build_manager(store, notifier.clone());

    if let Some(feed_path) = config.tag_reader.feed_path.clone() {
        spawn_tag_feed(feed_path, manager.clone());
    }

    let app = with_survey_routes(manager)
        .layer(Extension(notifier))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "emotion survey service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn spawn_tag_feed(path: PathBuf, manager: Arc<SurveyManager>) {
    tokio::spawn(async move {
        let file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "tag feed unavailable");
                return;
            }
        };

        info!(path = %path.display(), "reading tag feed");
        if let Err(err) = consume_tag_feed(BufReader::new(file), manager).await {
            warn!(path = %path.display(), error = %err, "tag feed stopped");
        }
    });
}
