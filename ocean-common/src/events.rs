//! Event types for the OceanGPT event system
//!
//! Provides the shared event definitions and the EventBus used by every
//! component that observes conversation, selection, or playback changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Author of a conversation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// Immutable snapshot of one transcript entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageInfo {
    /// Unique, monotonically increasing message id
    pub id: u64,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Who caused a shared-state change
///
/// User changes always apply immediately; scenario changes come from the
/// playback engine's timer-driven steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeSource {
    User,
    Scenario,
}

/// OceanGPT event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
/// Viewer and inspector front ends render purely from these.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OceanEvent {
    /// A message was appended to the transcript
    MessageAppended {
        message: MessageInfo,
        timestamp: DateTime<Utc>,
    },

    /// The transcript was cleared
    ConversationReset {
        timestamp: DateTime<Utc>,
    },

    /// The inspected entity changed
    SelectionChanged {
        old_entity_id: Option<String>,
        new_entity_id: Option<String>,
        source: ChangeSource,
        timestamp: DateTime<Utc>,
    },

    /// The viewer highlight set was replaced
    HighlightChanged {
        entity_ids: Vec<String>,
        source: ChangeSource,
        timestamp: DateTime<Utc>,
    },

    /// A scenario playback session began
    ScenarioStarted {
        scenario_id: String,
        generation: u64,
        step_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// A scenario step was applied
    ///
    /// Emitted for every step, including presentation-only actions that do
    /// not touch conversation or selection state.
    ScenarioStepStarted {
        scenario_id: String,
        generation: u64,
        step_index: usize,
        action: String,
        description: String,
        duration_secs: f64,
        timestamp: DateTime<Utc>,
    },

    /// A scenario ran past its last step
    ScenarioCompleted {
        scenario_id: String,
        generation: u64,
        timestamp: DateTime<Utc>,
    },

    /// A scenario was interrupted by `stop()` or a newer `start()`
    ScenarioStopped {
        scenario_id: String,
        generation: u64,
        step_index: Option<usize>,
        timestamp: DateTime<Utc>,
    },

    /// The query responder answered a free-text query
    QueryAnswered {
        query_id: String,
        matched_ids: Vec<String>,
        confidence: f64,
        timestamp: DateTime<Utc>,
    },
}

impl OceanEvent {
    /// Event type string, used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            OceanEvent::MessageAppended { .. } => "MessageAppended",
            OceanEvent::ConversationReset { .. } => "ConversationReset",
            OceanEvent::SelectionChanged { .. } => "SelectionChanged",
            OceanEvent::HighlightChanged { .. } => "HighlightChanged",
            OceanEvent::ScenarioStarted { .. } => "ScenarioStarted",
            OceanEvent::ScenarioStepStarted { .. } => "ScenarioStepStarted",
            OceanEvent::ScenarioCompleted { .. } => "ScenarioCompleted",
            OceanEvent::ScenarioStopped { .. } => "ScenarioStopped",
            OceanEvent::QueryAnswered { .. } => "QueryAnswered",
        }
    }
}

/// Central event distribution bus
///
/// Thin wrapper over a tokio broadcast channel. Slow subscribers lag and
/// lose the oldest events rather than blocking emitters.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<OceanEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Examples
    ///
    /// ```
    /// use ocean_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(256);
    /// assert_eq!(event_bus.capacity(), 256);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<OceanEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: OceanEvent,
    ) -> Result<usize, broadcast::error::SendError<OceanEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: OceanEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_without_subscribers_errors() {
        let bus = EventBus::new(8);
        let result = bus.emit(OceanEvent::ConversationReset {
            timestamp: Utc::now(),
        });
        assert!(result.is_err());

        // Lossy variant swallows the error
        bus.emit_lossy(OceanEvent::ConversationReset {
            timestamp: Utc::now(),
        });
    }

    #[tokio::test]
    async fn test_subscriber_receives_events_in_order() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        bus.emit(OceanEvent::ScenarioStarted {
            scenario_id: "demo".to_string(),
            generation: 1,
            step_count: 2,
            timestamp: Utc::now(),
        })
        .unwrap();
        bus.emit(OceanEvent::ScenarioCompleted {
            scenario_id: "demo".to_string(),
            generation: 1,
            timestamp: Utc::now(),
        })
        .unwrap();

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.event_type(), "ScenarioStarted");
        assert_eq!(second.event_type(), "ScenarioCompleted");
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = OceanEvent::SelectionChanged {
            old_entity_id: None,
            new_entity_id: Some("R12345".to_string()),
            source: ChangeSource::Scenario,
            timestamp: Utc::now(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "SelectionChanged");
        assert_eq!(json["new_entity_id"], "R12345");
        assert_eq!(json["source"], "scenario");
    }

    #[test]
    fn test_message_role_serialization() {
        assert_eq!(serde_json::to_string(&MessageRole::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&MessageRole::Assistant).unwrap(),
            "\"assistant\""
        );
        assert_eq!(MessageRole::Assistant.to_string(), "assistant");
    }
}
