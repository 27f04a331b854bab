//! Scenario player - timed step sequencing
//!
//! **Responsibilities:**
//! - Lifecycle control (start, stop, status)
//! - Step application against conversation and selection state
//! - One driver task per session, aborted when the session ends
//!
//! All transitions run under a single engine lock, so a step being applied
//! is never interleaved with a `start()`/`stop()` or with another step.
//! Every driver wake-up carries the generation it was scheduled for and is
//! discarded if that session is no longer current.

use super::session::{PlaybackSession, PlayerStatus};
use crate::error::{Error, Result};
use crate::scenario::{Scenario, ScenarioLibrary, Step, StepAction};
use crate::state::SharedState;
use ocean_common::events::{ChangeSource, OceanEvent};
use ocean_common::time::{now, scaled_seconds};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Mutable engine state, guarded by the engine lock
#[derive(Default)]
struct PlayerInner {
    session: Option<PlaybackSession>,
    /// Last generation handed out; sessions get `next_generation + 1`
    next_generation: u64,
    /// Driver task of the current session (holds its one pending timer)
    driver: Option<JoinHandle<()>>,
}

/// Drives at most one scenario session at a time
pub struct ScenarioPlayer {
    inner: Arc<Mutex<PlayerInner>>,
    state: Arc<SharedState>,
    library: Arc<ScenarioLibrary>,
    /// Wall-clock length of one step-duration second
    step_unit: Duration,
}

impl ScenarioPlayer {
    pub fn new(state: Arc<SharedState>, library: Arc<ScenarioLibrary>, step_unit: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(PlayerInner::default())),
            state,
            library,
            step_unit,
        }
    }

    /// Clone the inner Arcs for the driver task
    fn clone_handles(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            state: Arc::clone(&self.state),
            library: Arc::clone(&self.library),
            step_unit: self.step_unit,
        }
    }

    pub fn library(&self) -> &Arc<ScenarioLibrary> {
        &self.library
    }

    pub fn step_unit(&self) -> Duration {
        self.step_unit
    }

    /// Start a library scenario by id
    ///
    /// Unknown ids leave the current session untouched.
    pub async fn start_by_id(&self, scenario_id: &str) -> Result<u64> {
        let scenario = self
            .library
            .get(scenario_id)
            .ok_or_else(|| Error::ScenarioNotFound(scenario_id.to_string()))?;
        Ok(self.start(scenario).await)
    }

    /// Begin playing `scenario`, replacing any running session
    ///
    /// Step 0 is applied before this returns. Returns the new session's
    /// generation. An empty scenario completes immediately.
    pub async fn start(&self, scenario: Arc<Scenario>) -> u64 {
        let mut inner = self.inner.lock().await;
        self.stop_locked(&mut inner);

        inner.next_generation += 1;
        let generation = inner.next_generation;
        info!(
            "Starting scenario '{}' ({} steps, generation {})",
            scenario.id(),
            scenario.steps().len(),
            generation
        );
        self.state.events.emit_lossy(OceanEvent::ScenarioStarted {
            scenario_id: scenario.id().to_string(),
            generation,
            step_count: scenario.steps().len(),
            timestamp: now(),
        });
        inner.session = Some(PlaybackSession::new(scenario, generation));

        if let Some(delay) = self.advance_locked(&mut inner).await {
            inner.driver = Some(self.spawn_driver(generation, delay));
        }
        generation
    }

    /// Halt the current session; no-op when idle
    ///
    /// Returns true if a session was stopped. Mutations already applied are
    /// kept.
    pub async fn stop(&self) -> bool {
        let mut inner = self.inner.lock().await;
        self.stop_locked(&mut inner)
    }

    pub async fn status(&self) -> PlayerStatus {
        let inner = self.inner.lock().await;
        match &inner.session {
            Some(session) if session.is_running() => PlayerStatus::Running(session.status()),
            _ => PlayerStatus::Idle,
        }
    }

    pub async fn is_running(&self) -> bool {
        !self.status().await.is_idle()
    }

    /// Number of step timers still pending (0 or 1)
    pub async fn pending_timers(&self) -> usize {
        let inner = self.inner.lock().await;
        inner
            .driver
            .as_ref()
            .map_or(0, |handle| usize::from(!handle.is_finished()))
    }

    fn stop_locked(&self, inner: &mut PlayerInner) -> bool {
        if let Some(driver) = inner.driver.take() {
            driver.abort();
        }
        let Some(mut session) = inner.session.take() else {
            return false;
        };
        session.finish();
        info!(
            "Stopped scenario '{}' at step {:?} (generation {})",
            session.scenario().id(),
            session.step_index(),
            session.generation()
        );
        self.state.events.emit_lossy(OceanEvent::ScenarioStopped {
            scenario_id: session.scenario().id().to_string(),
            generation: session.generation(),
            step_index: session.step_index(),
            timestamp: now(),
        });
        true
    }

    /// One driver per session: sleep for the current step, then advance
    fn spawn_driver(&self, generation: u64, first_delay: Duration) -> JoinHandle<()> {
        let player = self.clone_handles();
        tokio::spawn(async move {
            let mut delay = first_delay;
            loop {
                tokio::time::sleep(delay).await;
                match player.on_timer(generation).await {
                    Some(next) => delay = next,
                    None => break,
                }
            }
        })
    }

    async fn on_timer(&self, generation: u64) -> Option<Duration> {
        let mut inner = self.inner.lock().await;
        let current = inner
            .session
            .as_ref()
            .is_some_and(|session| session.accepts(generation));
        if !current {
            debug!("Discarding stale step timer (generation {})", generation);
            return None;
        }
        self.advance_locked(&mut inner).await
    }

    /// Apply the next step, or complete the session past the last one
    ///
    /// Returns how long to wait before advancing again.
    async fn advance_locked(&self, inner: &mut PlayerInner) -> Option<Duration> {
        let session = inner.session.as_mut().filter(|s| s.is_running())?;
        let (index, step) = session.advance();

        match step {
            Some(step) => {
                self.apply_step(session, index, &step).await;
                Some(scaled_seconds(step.duration_secs, self.step_unit))
            }
            None => {
                session.finish();
                let scenario_id = session.scenario().id().to_string();
                let generation = session.generation();
                inner.session = None;
                // Completion runs on the driver itself; dropping the handle detaches it
                inner.driver = None;
                info!("Scenario '{}' completed (generation {})", scenario_id, generation);
                self.state.events.emit_lossy(OceanEvent::ScenarioCompleted {
                    scenario_id,
                    generation,
                    timestamp: now(),
                });
                None
            }
        }
    }

    async fn apply_step(&self, session: &mut PlaybackSession, index: usize, step: &Step) {
        let scenario = Arc::clone(session.scenario());
        debug!(
            "Scenario '{}' step {}: {} ({})",
            scenario.id(),
            index,
            step.action,
            step.description
        );
        self.state.events.emit_lossy(OceanEvent::ScenarioStepStarted {
            scenario_id: scenario.id().to_string(),
            generation: session.generation(),
            step_index: index,
            action: step.action.to_string(),
            description: step.description.clone(),
            duration_secs: step.duration_secs,
            timestamp: now(),
        });

        match &step.action {
            StepAction::Chat => {
                if session.take_first_chat() {
                    let text = if scenario.query().is_empty() {
                        step.description.as_str()
                    } else {
                        scenario.query()
                    };
                    self.state.conversation.append_user_message(text).await;
                } else {
                    self.state
                        .conversation
                        .append_assistant_message(step.description.clone())
                        .await;
                }
            }
            StepAction::FocusViewer => match step.target.as_ref().and_then(|t| t.primary()) {
                Some(entity_id) => {
                    self.state
                        .selection
                        .select(Some(entity_id.to_string()), ChangeSource::Scenario)
                        .await;
                }
                None => debug!("focus-viewer without target: viewer-only"),
            },
            StepAction::HighlightEntities => match &step.target {
                Some(target) => {
                    self.state
                        .selection
                        .set_highlighted(target.ids(), ChangeSource::Scenario)
                        .await;
                }
                None => debug!("highlight-entities without target: viewer-only"),
            },
            _ => {}
        }
    }
}
