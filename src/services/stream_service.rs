//! Event-stream delivery of menu snapshots.
//!
//! Each snapshot becomes one `menu` event. Every line of the snapshot text is
//! sent as its own `data:` field and the event ends with a blank line:
//!
//! ```text
//! event: menu
//! data: [
//! data:     {
//! ...
//! data: ]
//!
//! ```

use std::convert::Infallible;

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

use crate::errors::StoreError;
use crate::services::broadcast_service::Subscription;
use crate::state::app::AppState;

pub const EVENT_NAME: &str = "menu";

/// Frame one snapshot as a `menu` event.
pub fn frame_event(snapshot: &[u8]) -> Bytes {
    let text = String::from_utf8_lossy(snapshot);

    let mut out = String::with_capacity(text.len() + 64);
    out.push_str("event: ");
    out.push_str(EVENT_NAME);
    out.push('\n');
    for line in text.split('\n') {
        out.push_str("data: ");
        out.push_str(line);
        out.push('\n');
    }
    out.push('\n');

    Bytes::from(out)
}

/// Open a menu stream for one client.
///
/// The subscriber is registered before the current menu is read, so no
/// mutation in between can be missed. The stream starts with the current
/// menu and then yields one event per published snapshot. It ends when the
/// subscription is closed; dropping it (client disconnect) unsubscribes.
///
/// Fails when the current menu cannot be read, so besides a transport that
/// cannot stream, an unreadable menu file also refuses the stream with 500.
pub fn open(
    state: &AppState,
) -> Result<impl Stream<Item = Result<Bytes, Infallible>> + Send + 'static, StoreError> {
    let subscription = state.broadcaster.subscribe();
    let current = state.store.snapshot()?;

    tracing::debug!(
        subscription_id = subscription.id(),
        entries = current.menu.len(),
        "menu stream opened"
    );

    Ok(events(current.encoded, subscription))
}

fn events(
    initial: Bytes,
    subscription: Subscription,
) -> impl Stream<Item = Result<Bytes, Infallible>> + Send + 'static {
    let first = stream::once(async move { Ok(frame_event(&initial)) });

    let updates = stream::unfold(subscription, |mut sub| async move {
        let snapshot = sub.recv().await?;
        Some((Ok(frame_event(&snapshot)), sub))
    });

    first.chain(updates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::persistence::MenuStore;
    use crate::services::broadcast_service::Broadcaster;

    #[test]
    fn single_line_snapshot() {
        let framed = frame_event(b"[]");
        assert_eq!(framed, "event: menu\ndata: []\n\n");
    }

    #[test]
    fn each_line_gets_its_own_data_field() {
        let framed = frame_event(b"[\n    {\"dish\": \"Stew\"}\n]");
        assert_eq!(
            framed,
            "event: menu\ndata: [\ndata:     {\"dish\": \"Stew\"}\ndata: ]\n\n"
        );
    }

    #[test]
    fn trailing_newline_yields_empty_data_field() {
        let framed = frame_event(b"[{'dish':'Stew'}]\n");
        assert_eq!(framed, "event: menu\ndata: [{'dish':'Stew'}]\ndata: \n\n");
    }

    #[tokio::test]
    async fn stream_starts_with_current_menu_then_follows_updates() {
        let dir = tempfile::TempDir::new().unwrap();
        let state = AppState::new(
            MenuStore::new(dir.path().join("menu.json")),
            Arc::new(Broadcaster::default()),
        );

        let mut events = Box::pin(open(&state).unwrap());
        assert_eq!(state.broadcaster.subscriber_count(), 1);

        let first = events.next().await.unwrap().unwrap();
        assert_eq!(first, "event: menu\ndata: []\n\n");

        state.broadcaster.publish(1, Bytes::from_static(b"[1]"));
        let second = events.next().await.unwrap().unwrap();
        assert_eq!(second, "event: menu\ndata: [1]\n\n");

        drop(events);
        assert_eq!(state.broadcaster.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn stream_ends_when_subscriptions_are_closed() {
        let dir = tempfile::TempDir::new().unwrap();
        let broadcaster = Arc::new(Broadcaster::default());
        let state = AppState::new(
            MenuStore::new(dir.path().join("menu.json")),
            Arc::clone(&broadcaster),
        );

        let mut events = Box::pin(open(&state).unwrap());
        events.next().await.unwrap().unwrap();

        broadcaster.close_all();
        assert!(events.next().await.is_none());
    }

    #[test]
    fn unreadable_menu_refuses_the_stream() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("menu.json");
        std::fs::write(&path, "not json").unwrap();
        let state = AppState::new(MenuStore::new(path), Arc::new(Broadcaster::default()));

        assert!(open(&state).is_err());
        assert_eq!(state.broadcaster.subscriber_count(), 0);
    }
}
