//! In-process domain events.
//!
//! Services emit events after a successful write; a single consumer task logs
//! them. Delivery is best-effort and never blocks or fails the originating
//! request.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    BlockCreated {
        block_id: Uuid,
        block_no: String,
    },
    BlockUpdated {
        block_id: Uuid,
    },
    BlockStatusChanged {
        block_id: Uuid,
        old_status: Option<String>,
        new_status: String,
    },
    InvoiceCreated {
        invoice_id: Uuid,
        gate_pass_no: String,
        block_count: usize,
    },
    ClientCreated {
        client_id: Uuid,
    },
    ClientDeleted {
        client_id: Uuid,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Send an event; a full or closed channel is logged and swallowed.
    pub async fn send(&self, event: Event) {
        if let Err(e) = self.sender.send(event).await {
            warn!(error = %e, "failed to send event");
        }
    }
}

/// Create a channel pair with the given buffer size.
pub fn channel(buffer: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(buffer);
    (EventSender::new(tx), rx)
}

/// Consumer loop; runs until every sender is dropped.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::InvoiceCreated {
                invoice_id,
                gate_pass_no,
                block_count,
            } => info!(%invoice_id, %gate_pass_no, block_count, "invoice created"),
            Event::BlockStatusChanged {
                block_id,
                old_status,
                new_status,
            } => info!(%block_id, ?old_status, %new_status, "block status changed"),
            other => info!(event = ?other, "event processed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_are_delivered_in_order() {
        let (sender, mut rx) = channel(8);
        let id = Uuid::new_v4();
        sender
            .send(Event::BlockCreated {
                block_id: id,
                block_no: "B-1".into(),
            })
            .await;
        sender.send(Event::BlockUpdated { block_id: id }).await;

        match rx.recv().await.unwrap() {
            Event::BlockCreated { block_no, .. } => assert_eq!(block_no, "B-1"),
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(matches!(rx.recv().await.unwrap(), Event::BlockUpdated { .. }));
    }

    #[tokio::test]
    async fn send_after_receiver_drop_does_not_panic() {
        let (sender, rx) = channel(1);
        drop(rx);
        sender
            .send(Event::ClientCreated {
                client_id: Uuid::new_v4(),
            })
            .await;
    }
}
