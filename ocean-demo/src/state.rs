//! Shared UI state
//!
//! Conversation and selection stores shared between the chat service, the
//! playback engine, and the HTTP surface. Renderers never read these
//! directly; they subscribe to the event bus.

use crate::conversation::ConversationState;
use crate::selection::SelectionState;
use ocean_common::events::{EventBus, OceanEvent};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Default event channel capacity
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Shared state accessible by all components
pub struct SharedState {
    pub events: EventBus,
    pub conversation: Arc<ConversationState>,
    pub selection: Arc<SelectionState>,
}

impl SharedState {
    /// Fresh state with the welcome message seeded
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let events = EventBus::new(capacity);
        Self {
            conversation: Arc::new(ConversationState::with_welcome(events.clone())),
            selection: Arc::new(SelectionState::new(events.clone())),
            events,
        }
    }

    /// Subscribe to event stream for SSE and viewers
    pub fn subscribe_events(&self) -> broadcast::Receiver<OceanEvent> {
        self.events.subscribe()
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
