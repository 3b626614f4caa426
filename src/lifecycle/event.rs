use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Event Envelope - Audit Metadata
// ============================================================================
//
// Wraps domain events with the metadata written to the append-only audit
// trail. Generic over the event payload.
//
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EventEnvelope<E> {
    // Event Identity
    pub event_id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: Uuid,

    // Event Type Information
    pub event_type: String,

    // Event Payload
    pub event_data: E,

    // Correlation (groups events written by one ledger operation)
    pub correlation_id: Uuid,

    // Actor Information
    pub user_id: Option<Uuid>,

    // Timing
    pub recorded_at: DateTime<Utc>,
}

impl<E: DomainEvent> EventEnvelope<E> {
    pub fn new(aggregate_type: &str, aggregate_id: Uuid, event_data: E, correlation_id: Uuid) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            aggregate_type: aggregate_type.to_string(),
            aggregate_id,
            event_type: event_data.event_type().to_string(),
            event_data,
            correlation_id,
            user_id: None,
            recorded_at: Utc::now(),
        }
    }

    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Erase the payload type so envelopes from different aggregates share one table
    pub fn into_json(self) -> Result<EventEnvelope<serde_json::Value>, serde_json::Error> {
        Ok(EventEnvelope {
            event_id: self.event_id,
            aggregate_type: self.aggregate_type,
            aggregate_id: self.aggregate_id,
            event_type: self.event_type,
            event_data: serde_json::to_value(&self.event_data)?,
            correlation_id: self.correlation_id,
            user_id: self.user_id,
            recorded_at: self.recorded_at,
        })
    }
}

// ============================================================================
// Domain Event Trait
// ============================================================================

/// All lifecycle events implement this to be recorded in the audit trail.
pub trait DomainEvent: Serialize + Clone + Send + Sync {
    fn event_type(&self) -> &'static str;
}

pub fn serialize_event<E: Serialize>(event: &E) -> Result<String, serde_json::Error> {
    serde_json::to_string(event)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Clone, Debug, PartialEq)]
    struct TestEvent {
        data: String,
    }

    impl DomainEvent for TestEvent {
        fn event_type(&self) -> &'static str {
            "TestEvent"
        }
    }

    #[test]
    fn test_event_envelope_creation() {
        let aggregate_id = Uuid::new_v4();
        let correlation_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        let envelope = EventEnvelope::new(
            "Order",
            aggregate_id,
            TestEvent { data: "test".to_string() },
            correlation_id,
        )
        .with_user(user_id);

        assert_eq!(envelope.aggregate_id, aggregate_id);
        assert_eq!(envelope.aggregate_type, "Order");
        assert_eq!(envelope.event_type, "TestEvent");
        assert_eq!(envelope.correlation_id, correlation_id);
        assert_eq!(envelope.user_id, Some(user_id));
    }

    #[test]
    fn test_into_json_keeps_metadata() {
        let envelope = EventEnvelope::new(
            "OrderReturn",
            Uuid::new_v4(),
            TestEvent { data: "payload".to_string() },
            Uuid::new_v4(),
        );
        let event_id = envelope.event_id;

        let json = envelope.into_json().unwrap();
        assert_eq!(json.event_id, event_id);
        assert_eq!(json.event_data["data"], "payload");
        assert_eq!(serialize_event(&json.event_data).unwrap(), r#"{"data":"payload"}"#);
    }
}
