//! Viewer bridge
//!
//! Forwards selection, highlight, and presentation-step events from the
//! EventBus to a `ViewerSink` (the globe renderer). The renderer never reads
//! shared state directly.

use crate::scenario::StepAction;
use ocean_common::events::OceanEvent;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Receiver side of the viewer bridge
pub trait ViewerSink: Send + Sync {
    /// Fly to `entity_id`, or return to the overview on `None`
    fn set_focus(&self, entity_id: Option<&str>);

    /// Replace the pulsing highlight set
    fn set_highlighted(&self, entity_ids: &[String]);

    /// A scenario step with no shared-state effect (profile, compare, ...)
    fn present(&self, action: &str, description: &str);
}

/// Sink that only logs, used by the headless binary
#[derive(Debug, Default)]
pub struct LoggingViewer;

impl ViewerSink for LoggingViewer {
    fn set_focus(&self, entity_id: Option<&str>) {
        match entity_id {
            Some(id) => info!("Viewer: focus on float {}", id),
            None => info!("Viewer: overview"),
        }
    }

    fn set_highlighted(&self, entity_ids: &[String]) {
        info!("Viewer: highlight {:?}", entity_ids);
    }

    fn present(&self, action: &str, description: &str) {
        info!("Viewer: [{}] {}", action, description);
    }
}

/// One call received by a `RecordingViewer`
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerCall {
    Focus(Option<String>),
    Highlight(Vec<String>),
    Present(String),
}

/// Sink that records calls, for tests and inspection
#[derive(Debug, Default)]
pub struct RecordingViewer {
    calls: Mutex<Vec<ViewerCall>>,
}

impl RecordingViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ViewerCall> {
        match self.calls.lock() {
            Ok(calls) => calls.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn record(&self, call: ViewerCall) {
        match self.calls.lock() {
            Ok(mut calls) => calls.push(call),
            Err(poisoned) => poisoned.into_inner().push(call),
        }
    }
}

impl ViewerSink for RecordingViewer {
    fn set_focus(&self, entity_id: Option<&str>) {
        self.record(ViewerCall::Focus(entity_id.map(str::to_string)));
    }

    fn set_highlighted(&self, entity_ids: &[String]) {
        self.record(ViewerCall::Highlight(entity_ids.to_vec()));
    }

    fn present(&self, action: &str, _description: &str) {
        self.record(ViewerCall::Present(action.to_string()));
    }
}

/// Forward viewer-relevant events until the bus closes
pub async fn run_viewer_bridge(mut rx: broadcast::Receiver<OceanEvent>, sink: Arc<dyn ViewerSink>) {
    debug!("Viewer bridge started");

    loop {
        match rx.recv().await {
            Ok(event) => forward(&event, sink.as_ref()),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Viewer bridge: lagged {} events", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!("Viewer bridge: event bus closed, shutting down");
                break;
            }
        }
    }

    debug!("Viewer bridge stopped");
}

/// Spawn the bridge as a background task
pub fn spawn_viewer_bridge(
    rx: broadcast::Receiver<OceanEvent>,
    sink: Arc<dyn ViewerSink>,
) -> JoinHandle<()> {
    tokio::spawn(run_viewer_bridge(rx, sink))
}

fn forward(event: &OceanEvent, sink: &dyn ViewerSink) {
    match event {
        OceanEvent::SelectionChanged { new_entity_id, .. } => sink.set_focus(new_entity_id.as_deref()),
        OceanEvent::HighlightChanged { entity_ids, .. } => sink.set_highlighted(entity_ids),
        OceanEvent::ScenarioStepStarted {
            action,
            description,
            ..
        } if StepAction::from(action.as_str()).is_presentation_only() => {
            sink.present(action, description)
        }
        _ => {}
    }
}
