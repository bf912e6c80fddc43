use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info};

/// Domain events emitted by the services after state changes commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    CartUpdated {
        session_id: String,
    },
    OrderPlaced(i32),
    OrderStatusChanged {
        order_id: i32,
        old_status: String,
        new_status: String,
    },
    PaymentIntentCreated {
        order_id: i32,
        intent_id: String,
    },
    PaymentCaptured(i32),
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

    /// Sends an event, logging instead of failing when the channel is closed.
    /// State changes must not be rolled back because an observer went away.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            error!("Event delivery failed: {}", e);
        }
    }
}

/// Background loop that drains the event channel. Currently the events only
/// feed structured logs; downstream consumers subscribe here.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::CartUpdated { session_id } => {
                info!(session_id = %session_id, "cart updated");
            }
            Event::OrderPlaced(order_id) => {
                info!(order_id, "order placed");
            }
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(order_id, %old_status, %new_status, "order status changed");
            }
            Event::PaymentIntentCreated {
                order_id,
                intent_id,
            } => {
                info!(order_id, %intent_id, "payment intent created");
            }
            Event::PaymentCaptured(order_id) => {
                info!(order_id, "payment captured");
            }
        }
    }

    info!("Event processing loop stopped");
}
