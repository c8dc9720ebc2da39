//! Recognition events for UI and notification sinks

use serde::Serialize;
use signstream_core::{Emission, Result};
use tokio::sync::broadcast;

/// Event published by a recognition session
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RecognitionEvent {
    /// A stabilized label was emitted
    Emitted { model: String, emission: Emission },

    /// A model switch completed
    ModelSwitched { key: String, name: String },

    /// A model switch failed; the previous model stays active
    SwitchFailed { key: String, reason: String },
}

impl RecognitionEvent {
    /// Encode as a single JSON line for machine consumers
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Event bus for broadcasting recognition events to subscribers
pub struct EventBus {
    sender: broadcast::Sender<RecognitionEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<RecognitionEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: RecognitionEvent) {
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event);
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        bus.publish(RecognitionEvent::ModelSwitched {
            key: "numeros".into(),
            name: "Números LSB".into(),
        });

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, RecognitionEvent::ModelSwitched { key, .. } if key == "numeros"));
    }

    #[test]
    fn test_event_json_is_tagged() {
        let event = RecognitionEvent::Emitted {
            model: "saludos".into(),
            emission: Emission::new("Hola", 0.5),
        };

        assert_eq!(
            event.to_json().unwrap(),
            r#"{"event":"emitted","model":"saludos","emission":{"label":"Hola","probability":0.5}}"#
        );
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new(4);
        bus.publish(RecognitionEvent::SwitchFailed {
            key: "x".into(),
            reason: "unknown".into(),
        });
    }
}
