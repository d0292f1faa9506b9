use serde::{Deserialize, Serialize};

use super::Entity;
use crate::events::EventEnvelope;

/// Sort key of the event log.
pub const OCCURRED_AT_US: &str = "occurred_at_us";

/// A persisted domain event. The document id is the envelope id.
///
/// `occurred_at_us` duplicates the envelope timestamp as microseconds so the
/// log sorts numerically by when events happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(flatten)]
    pub envelope:       EventEnvelope,
    pub occurred_at_us: i64,
}

impl EventRecord {
    pub fn new(envelope: EventEnvelope) -> Self {
        Self {
            occurred_at_us: envelope.occurred_at.timestamp_micros(),
            envelope,
        }
    }
}

impl Entity for EventRecord {
    const COLLECTION: &'static str = "events";
    const NAME: &'static str = "Event";
}
