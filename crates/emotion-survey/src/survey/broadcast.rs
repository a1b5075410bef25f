//! Fan-out of survey events to live listeners over a tokio broadcast channel.

use std::convert::Infallible;
use std::time::Duration;

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{Stream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info, warn};

use super::events::{NotifyError, SurveyEvent, SurveyNotifier};

/// Best-effort notifier: publishing never blocks and never fails when nobody listens.
///
/// Listeners that fall more than `capacity` events behind skip the missed
/// events; listeners that connect late see only new events.
#[derive(Clone)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<SurveyEvent>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SurveyEvent> {
        self.tx.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// One SSE message per event: the event type is the SSE event name, the
    /// JSON object is the data.
    pub fn event_stream(&self) -> impl Stream<Item = Result<Event, Infallible>> {
        BroadcastStream::new(self.subscribe()).filter_map(|received| async move {
            match received {
                Ok(event) => match Event::default().event(event.kind()).json_data(&event) {
                    Ok(message) => Some(Ok(message)),
                    Err(err) => {
                        warn!(error = %err, "failed to encode survey event");
                        None
                    }
                },
                Err(err) => {
                    warn!(error = ?err, "event listener lagged behind");
                    None
                }
            }
        })
    }

    pub fn sse(&self) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
        info!(listeners = self.listener_count() + 1, "event listener connected");
        Sse::new(self.event_stream()).keep_alive(
            KeepAlive::new()
                .interval(Duration::from_secs(30))
                .text("keep-alive"),
        )
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(100)
    }
}

impl SurveyNotifier for BroadcastNotifier {
    fn publish(&self, event: SurveyEvent) -> Result<(), NotifyError> {
        let kind = event.kind();
        match self.tx.send(event) {
            Ok(listeners) => debug!(kind, listeners, "survey event broadcast"),
            Err(_) => debug!(kind, "survey event dropped, no listeners connected"),
        }
        Ok(())
    }
}
