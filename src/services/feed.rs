// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Live feed change notifications.
//!
//! Post creations and deletions are broadcast to every open subscription.
//! A subscription is an explicit handle: dropping it (or calling
//! [`FeedSubscription::unsubscribe`]) stops delivery.

use crate::models::FeedEvent;
use axum::response::sse::Event;
use futures_util::{Stream, StreamExt};
use std::convert::Infallible;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

/// Events buffered per subscriber before a slow one starts skipping.
pub const FEED_CHANNEL_CAPACITY: usize = 100;

/// Fan-out of feed events to connected clients.
#[derive(Clone)]
pub struct FeedBroadcaster {
    tx: broadcast::Sender<FeedEvent>,
}

impl Default for FeedBroadcaster {
    fn default() -> Self {
        Self::new(FEED_CHANNEL_CAPACITY)
    }
}

impl FeedBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Send an event to all subscribers. Returns how many received it.
    pub fn publish(&self, event: FeedEvent) -> usize {
        let name = event.name();
        match self.tx.send(event) {
            Ok(count) => {
                tracing::debug!(event = name, subscribers = count, "Feed event published");
                count
            }
            // No subscribers
            Err(_) => 0,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Open a new subscription. Only events published afterwards are delivered.
    pub fn subscribe(&self) -> FeedSubscription {
        FeedSubscription {
            rx: self.tx.subscribe(),
        }
    }
}

/// One consumer's view of the feed.
pub struct FeedSubscription {
    rx: broadcast::Receiver<FeedEvent>,
}

impl FeedSubscription {
    /// Wait for the next event. Returns `None` once the broadcaster is gone.
    ///
    /// Events missed by a lagging subscriber are skipped.
    pub async fn recv(&mut self) -> Option<FeedEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Feed subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Stop receiving events.
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// Convert into an SSE event stream; dropping the stream unsubscribes.
    pub fn into_sse_stream(self) -> impl Stream<Item = Result<Event, Infallible>> {
        BroadcastStream::new(self.rx).filter_map(|result| async move {
            match result {
                Ok(feed_event) => Event::default()
                    .event(feed_event.name())
                    .json_data(&feed_event)
                    .ok()
                    .map(Ok),
                Err(e) => {
                    tracing::warn!(error = ?e, "Feed stream error");
                    None
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deleted(id: &str) -> FeedEvent {
        FeedEvent::PostDeleted {
            post_id: id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let feed = FeedBroadcaster::default();
        let mut a = feed.subscribe();
        let mut b = feed.subscribe();

        assert_eq!(feed.publish(deleted("p1")), 2);
        assert_eq!(a.recv().await, Some(deleted("p1")));
        assert_eq!(b.recv().await, Some(deleted("p1")));
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let feed = FeedBroadcaster::default();
        let sub = feed.subscribe();
        assert_eq!(feed.subscriber_count(), 1);

        sub.unsubscribe();
        assert_eq!(feed.subscriber_count(), 0);
        assert_eq!(feed.publish(deleted("p1")), 0);
    }

    #[tokio::test]
    async fn test_dropping_stream_unsubscribes() {
        let feed = FeedBroadcaster::default();
        let stream = feed.subscribe().into_sse_stream();
        assert_eq!(feed.subscriber_count(), 1);
        drop(stream);
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_lagging_subscriber_skips_missed_events() {
        let feed = FeedBroadcaster::new(2);
        let mut sub = feed.subscribe();
        for i in 0..5 {
            feed.publish(deleted(&format!("p{i}")));
        }
        // Oldest events were overwritten; the subscriber resumes with what's buffered.
        assert_eq!(sub.recv().await, Some(deleted("p3")));
        assert_eq!(sub.recv().await, Some(deleted("p4")));
    }

    #[tokio::test]
    async fn test_only_later_events_delivered() {
        let feed = FeedBroadcaster::default();
        feed.publish(deleted("before"));
        let mut sub = feed.subscribe();
        feed.publish(deleted("after"));
        assert_eq!(sub.recv().await, Some(deleted("after")));
    }

    #[tokio::test]
    async fn test_closed_broadcaster_ends_subscription() {
        let feed = FeedBroadcaster::default();
        let mut sub = feed.subscribe();
        drop(feed);
        assert_eq!(sub.recv().await, None);
    }
}
