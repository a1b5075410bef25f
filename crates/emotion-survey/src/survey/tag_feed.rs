//! Line-delimited tag-reader feed. Each non-empty line is one scan.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{info, warn};

use super::events::SurveyNotifier;
use super::repository::SessionRepository;
use super::service::SessionManager;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagFeedStats {
    pub sessions_created: usize,
    pub rejected: usize,
}

/// Consume the feed until EOF, opening a session per scanned tag.
///
/// A line the manager rejects is logged and skipped; only read errors end the feed early.
pub async fn consume_tag_feed<F, R, N>(
    feed: F,
    manager: Arc<SessionManager<R, N>>,
) -> std::io::Result<TagFeedStats>
where
    F: AsyncBufRead + Unpin,
    R: SessionRepository + 'static,
    N: SurveyNotifier + 'static,
{
    let mut stats = TagFeedStats::default();
    let mut lines = feed.lines();

    while let Some(line) = lines.next_line().await? {
        let tag_id = line.trim();
        if tag_id.is_empty() {
            continue;
        }

        match manager.create_session(tag_id) {
            Ok(session) => {
                info!(session_id = %session.id, tag_id, "tag scanned");
                stats.sessions_created += 1;
            }
            Err(err) => {
                warn!(tag_id, error = %err, "tag scan rejected");
                stats.rejected += 1;
            }
        }
    }

    info!(
        sessions_created = stats.sessions_created,
        rejected = stats.rejected,
        "tag feed closed"
    );
    Ok(stats)
}
