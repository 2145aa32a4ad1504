use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Catalog lifecycle events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductDeactivated(Uuid),
    ProductReactivated(Uuid),
    ProductDeleted(Uuid),
    ProductViewed(Uuid),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging on failure instead of propagating. Event
    /// delivery is never allowed to fail a catalog operation.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(err) = self.send(event).await {
            warn!("Failed to publish event: {}", err);
        }
    }
}

/// Drains the event channel, logging each event. Downstream consumers
/// (search indexing, notifications) subscribe here when they exist.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::ProductViewed(id) => {
                tracing::debug!(product_id = %id, "event: product viewed");
            }
            other => {
                info!(event = ?other, "catalog event");
            }
        }
    }
    info!("Event channel closed; event processor exiting");
}
