use super::common::*;
use crate::survey::domain::InitialState;
use crate::survey::tag_feed::consume_tag_feed;
use std::sync::Arc;

#[tokio::test]
async fn each_feed_line_opens_a_session() {
    let (manager, _, notifier) = build_manager();
    let manager = Arc::new(manager);
    let feed: &[u8] = b"a1b2c3\r\n\n   \ndeadbeef\ncafe123\n";

    let stats = consume_tag_feed(feed, manager.clone())
        .await
        .expect("feed consumed");

    assert_eq!(stats.sessions_created, 3);
    assert_eq!(stats.rejected, 0);
    assert_eq!(notifier.kinds().len(), 3);

    let mut states: Vec<InitialState> = manager
        .list_sessions(None)
        .expect("list")
        .into_iter()
        .map(|session| session.initial_state)
        .collect();
    states.reverse();
    assert_eq!(
        states,
        vec![InitialState::Feliz, InitialState::Triste, InitialState::Neutro]
    );
}

#[tokio::test]
async fn store_failures_are_counted_and_skipped() {
    let manager = Arc::new(crate::survey::SessionManager::new(
        Arc::new(UnavailableRepository),
        Arc::new(MemoryNotifier::default()),
    ));
    let feed: &[u8] = b"feliz\ntriste\n";

    let stats = consume_tag_feed(feed, manager).await.expect("feed consumed");

    assert_eq!(stats.sessions_created, 0);
    assert_eq!(stats.rejected, 2);
}
