//! Selection state
//!
//! Holds the single currently inspected float and the viewer highlight set.
//! No history is kept: selecting a float silently discards the previous one.

use ocean_common::events::{ChangeSource, EventBus, OceanEvent};
use ocean_common::time::now;
use tokio::sync::RwLock;
use tracing::debug;

pub struct SelectionState {
    current: RwLock<Option<String>>,
    highlighted: RwLock<Vec<String>>,
    events: EventBus,
}

impl SelectionState {
    pub fn new(events: EventBus) -> Self {
        Self {
            current: RwLock::new(None),
            highlighted: RwLock::new(Vec::new()),
            events,
        }
    }

    /// Overwrite the current selection; `None` clears it
    ///
    /// Returns the previous selection. A change is published even when the
    /// same id is selected again so that renderers can re-focus.
    pub async fn select(&self, entity_id: Option<String>, source: ChangeSource) -> Option<String> {
        let mut current = self.current.write().await;
        let old = std::mem::replace(&mut *current, entity_id.clone());
        debug!("Selection {:?} -> {:?} ({:?})", old, entity_id, source);
        self.events.emit_lossy(OceanEvent::SelectionChanged {
            old_entity_id: old.clone(),
            new_entity_id: entity_id,
            source,
            timestamp: now(),
        });
        old
    }

    pub async fn current(&self) -> Option<String> {
        self.current.read().await.clone()
    }

    /// Replace the viewer highlight set
    pub async fn set_highlighted(&self, entity_ids: Vec<String>, source: ChangeSource) {
        let mut highlighted = self.highlighted.write().await;
        *highlighted = entity_ids.clone();
        self.events.emit_lossy(OceanEvent::HighlightChanged {
            entity_ids,
            source,
            timestamp: now(),
        });
    }

    pub async fn highlighted(&self) -> Vec<String> {
        self.highlighted.read().await.clone()
    }
}
