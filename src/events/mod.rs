use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

/// Cloneable handle for publishing domain events onto the process-wide
/// channel.
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
}

// The events that can occur in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Master data events
    StorageCreated(Uuid),
    StorageUpdated(Uuid),
    StorageDeleted(Uuid),
    ItemCreated(Uuid),
    ItemUpdated(Uuid),
    ItemDeleted(Uuid),
    SupplierCreated(Uuid),
    SupplierUpdated(Uuid),
    SupplierDeleted(Uuid),

    // Inventory events
    InventoryCreated(Uuid),
    InventoryUpdated(Uuid),
    InventoryDeleted(Uuid),
    StockMoved {
        movement_id: Uuid,
        movement_type: String,
        storage_id: Uuid,
        item_id: Uuid,
        quantity: i32,
        quantity_after: i32,
        reference_no: String,
    },

    // Transfer-in events
    TransferInReceived {
        doc_id: Uuid,
        code: String,
        lines: usize,
    },
    TransferInUpdated(Uuid),
    TransferInDeleted(Uuid),
}

/// Drains the event channel for the lifetime of the process, logging each
/// event. Runs as a spawned task; exits when every sender is dropped.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::StockMoved {
                movement_id,
                movement_type,
                storage_id,
                item_id,
                quantity,
                quantity_after,
                reference_no,
            } => {
                info!(
                    %movement_id,
                    %movement_type,
                    %storage_id,
                    %item_id,
                    quantity,
                    quantity_after,
                    %reference_no,
                    "stock moved"
                );
            }
            Event::TransferInReceived { doc_id, code, lines } => {
                info!(%doc_id, %code, lines, "transfer-in received");
            }
            other => {
                debug!(event = ?other, "domain event");
            }
        }
    }

    debug!("event channel closed; event processor exiting");
}
