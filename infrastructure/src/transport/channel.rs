//! In-process job transport over a bounded tokio channel
//!
//! Stands in for a durable job runtime: `send` returns as soon as the event
//! is queued, and a [`JobWorker`](crate::worker::JobWorker) on the other end
//! runs the handler. Events are not persisted, so a process restart loses
//! queued jobs; the lazy run timeout then fails the affected runs.

use async_trait::async_trait;
use diligence_application::ports::job_transport::{JobEvent, JobTransport, TransportError};
use tokio::sync::mpsc;
use tracing::debug;

pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Receiving end handed to the worker
pub type JobReceiver = mpsc::Receiver<JobEvent>;

#[derive(Clone)]
pub struct ChannelJobTransport {
    tx: mpsc::Sender<JobEvent>,
}

impl ChannelJobTransport {
    /// Create a transport and the receiver its worker consumes.
    pub fn new(capacity: usize) -> (Self, JobReceiver) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait]
impl JobTransport for ChannelJobTransport {
    async fn send(&self, event: JobEvent) -> Result<(), TransportError> {
        debug!(event = %event.name, "Queueing job event");
        self.tx.send(event).await.map_err(|_| TransportError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_events_arrive_in_order() {
        let (transport, mut rx) = ChannelJobTransport::new(4);
        transport.send(JobEvent::new("a", json!(1))).await.unwrap();
        transport.send(JobEvent::new("b", json!(2))).await.unwrap();

        assert_eq!(rx.recv().await.unwrap().name, "a");
        assert_eq!(rx.recv().await.unwrap().name, "b");
    }

    #[tokio::test]
    async fn test_send_after_receiver_dropped_is_closed() {
        let (transport, rx) = ChannelJobTransport::new(1);
        drop(rx);
        let err = transport.send(JobEvent::new("a", json!(null))).await.unwrap_err();
        assert_eq!(err, TransportError::Closed);
    }
}
