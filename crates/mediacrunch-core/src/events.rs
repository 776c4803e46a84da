//! Event broadcasting abstraction
//!
//! A crunch job produces a single-consumer mpsc stream. Headless
//! consumers often want more than one observer (progress printer, status
//! line, test harness), so this bus fans events out over a broadcast
//! channel.

use tokio::sync::{broadcast, mpsc};
use tracing::trace;

use mediacrunch_lib::core::crunch::CrunchEvent;

/// Fan-out bus for crunch job events.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CrunchEvent>,
}

impl EventBus {
    /// Creates a bus retaining up to `capacity` undelivered events per
    /// subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribes to all events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<CrunchEvent> {
        self.tx.subscribe()
    }

    /// Publishes an event to all current subscribers.
    pub fn publish(&self, event: CrunchEvent) {
        if self.tx.send(event).is_err() {
            trace!("no subscribers for crunch event");
        }
    }

    /// Drains a job's mpsc stream into the bus. Returns when the stream
    /// closes (after the terminal event).
    pub async fn forward(&self, mut rx: mpsc::Receiver<CrunchEvent>) {
        while let Some(event) = rx.recv().await {
            self.publish(event);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_publish_reaches_all_subscribers() {
        let bus = EventBus::new(8);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.publish(CrunchEvent::Progress { percent: 42.0 });

        assert_eq!(a.recv().await.unwrap(), CrunchEvent::Progress { percent: 42.0 });
        assert_eq!(b.recv().await.unwrap(), CrunchEvent::Progress { percent: 42.0 });
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_a_no_op() {
        let bus = EventBus::new(8);
        bus.publish(CrunchEvent::Failed {
            message: "nobody listening".to_string(),
        });
    }

    #[tokio::test]
    async fn test_forward_drains_job_stream() {
        let bus = EventBus::new(8);
        let mut sub = bus.subscribe();

        let (tx, rx) = mpsc::channel(8);
        let forwarder = tokio::spawn({
            let bus = bus.clone();
            async move { bus.forward(rx).await }
        });

        tx.send(CrunchEvent::Progress { percent: 10.0 }).await.unwrap();
        tx.send(CrunchEvent::Completed {
            output_path: PathBuf::from("/tmp/crunched_1.mp4"),
        })
        .await
        .unwrap();
        drop(tx);

        forwarder.await.unwrap();

        assert_eq!(sub.recv().await.unwrap(), CrunchEvent::Progress { percent: 10.0 });
        assert!(matches!(
            sub.recv().await.unwrap(),
            CrunchEvent::Completed { .. }
        ));
    }
}
