//! Domain events and the per-tenant event bus.
//!
//! Services publish [`DomainEvent`]s on the tenant's [`EventBus`]. Two kinds of
//! subscribers exist: the event log, which persists every envelope into the
//! tenant's `events` collection, and notification streams served over SSE.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{debug, error, trace, warn};

use crate::{models::EventRecord, repository::Repository};

/// Capacity of a tenant's event channel; slower subscribers observe `Lagged`.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    UserRegistered {
        user_id: String,
        email:   String,
    },
    OrderPlaced {
        order_id:    String,
        user_id:     String,
        total_cents: u64,
    },
    OrderStatusChanged {
        order_id: String,
        user_id:  String,
        from:     String,
        to:       String,
    },
    ReviewPosted {
        review_id:  String,
        product_id: String,
        user_id:    String,
        rating:     u8,
    },
    ProductRatingChanged {
        product_id:  String,
        rating:      f64,
        num_reviews: u64,
    },
    LowStock {
        product_id: String,
        name:       String,
        stock:      u64,
    },
    ImageUploaded {
        image_id: String,
        owner_id: String,
        key:      String,
    },
}

impl DomainEvent {
    /// The `type` tag of the event.
    pub const fn event_type(&self) -> &'static str {
        match *self {
            Self::UserRegistered { .. } => "user_registered",
            Self::OrderPlaced { .. } => "order_placed",
            Self::OrderStatusChanged { .. } => "order_status_changed",
            Self::ReviewPosted { .. } => "review_posted",
            Self::ProductRatingChanged { .. } => "product_rating_changed",
            Self::LowStock { .. } => "low_stock",
            Self::ImageUploaded { .. } => "image_uploaded",
        }
    }

    /// Whether a customer should be notified of this event.
    pub fn concerns_user(&self, user: &str) -> bool {
        match *self {
            Self::UserRegistered { ref user_id, .. } |
            Self::OrderPlaced { ref user_id, .. } |
            Self::OrderStatusChanged { ref user_id, .. } |
            Self::ReviewPosted { ref user_id, .. } => user_id == user,
            Self::ImageUploaded { ref owner_id, .. } => owner_id == user,
            Self::ProductRatingChanged { .. } | Self::LowStock { .. } => false,
        }
    }
}

/// A published event with its delivery metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub id:          String,
    pub tenant:      String,
    pub occurred_at: DateTime<Utc>,
    #[serde(flatten)]
    pub event:       DomainEvent,
}

/// Broadcast channel of one tenant's events.
#[derive(Debug, Clone)]
pub struct EventBus {
    tenant: String,
    sender: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    pub fn new(tenant: &str) -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            tenant: tenant.to_owned(),
            sender,
        }
    }

    /// Wraps and publishes an event. Having no subscribers is not an error.
    pub fn publish(&self, event: DomainEvent) -> EventEnvelope {
        let envelope = EventEnvelope {
            id: cuid2::create_id(),
            tenant: self.tenant.clone(),
            occurred_at: Utc::now(),
            event,
        };
        trace!("Publishing {} for tenant {}", envelope.event.event_type(), self.tenant);
        let _ = self.sender.send(envelope.clone());
        envelope
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> { self.sender.subscribe() }
}

/// Spawns the task persisting every event of `bus` into `log`.
///
/// The task ends when the bus is dropped.
pub fn spawn_event_log(bus: &EventBus, log: Repository<EventRecord>) -> JoinHandle<()> {
    let mut receiver = bus.subscribe();
    let tenant = bus.tenant.clone();
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(envelope) => {
                    let id = envelope.id.clone();
                    if let Err(e) = log.insert_with_id(&id, EventRecord::new(envelope)).await {
                        error!("Failed to persist event {} for tenant {}: {}", id, tenant, e);
                    }
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Event log of tenant {} skipped {} events", tenant, skipped);
                },
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        debug!("Event log of tenant {} stopped", tenant);
    })
}
