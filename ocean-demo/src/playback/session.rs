//! Playback session and status snapshot

use crate::scenario::{Scenario, Step};
use serde::Serialize;
use std::sync::Arc;

/// Runtime progress through one scenario
///
/// Owned exclusively by the engine. A new session gets a fresh generation;
/// timers carry the generation they were scheduled for and are ignored
/// once it no longer matches.
#[derive(Debug)]
pub struct PlaybackSession {
    scenario: Arc<Scenario>,
    generation: u64,
    /// `None` before the first step (index −1)
    step_index: Option<usize>,
    running: bool,
    /// Whether the scenario's example query has been typed yet
    query_sent: bool,
}

impl PlaybackSession {
    pub fn new(scenario: Arc<Scenario>, generation: u64) -> Self {
        Self {
            scenario,
            generation,
            step_index: None,
            running: true,
            query_sent: false,
        }
    }

    pub fn scenario(&self) -> &Arc<Scenario> {
        &self.scenario
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn step_index(&self) -> Option<usize> {
        self.step_index
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether a timer scheduled for `generation` may still act on this session
    pub fn accepts(&self, generation: u64) -> bool {
        self.running && self.generation == generation
    }

    /// Move to the next index and return it with its step, if in bounds
    pub fn advance(&mut self) -> (usize, Option<Step>) {
        let next = self.step_index.map_or(0, |i| i + 1);
        self.step_index = Some(next);
        (next, self.scenario.step(next).cloned())
    }

    /// First call returns true; later calls false
    pub fn take_first_chat(&mut self) -> bool {
        !std::mem::replace(&mut self.query_sent, true)
    }

    pub fn finish(&mut self) {
        self.running = false;
    }

    pub fn status(&self) -> RunningStatus {
        let current = self.step_index.and_then(|i| self.scenario.step(i));
        RunningStatus {
            scenario_id: self.scenario.id().to_string(),
            title: self.scenario.title().to_string(),
            generation: self.generation,
            step_index: self.step_index,
            step_count: self.scenario.steps().len(),
            action: current.map(|s| s.action.to_string()),
            description: current.map(|s| s.description.clone()),
        }
    }
}

/// Details of the running session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunningStatus {
    pub scenario_id: String,
    pub title: String,
    pub generation: u64,
    pub step_index: Option<usize>,
    pub step_count: usize,
    pub action: Option<String>,
    pub description: Option<String>,
}

/// Externally visible engine state
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum PlayerStatus {
    Idle,
    Running(RunningStatus),
}

impl PlayerStatus {
    pub fn is_idle(&self) -> bool {
        matches!(self, PlayerStatus::Idle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::StepAction;

    fn two_step() -> Arc<Scenario> {
        Arc::new(
            Scenario::new(
                "two",
                "Two",
                "",
                "q",
                vec![
                    Step::new(StepAction::Chat, "a", 1.0),
                    Step::new(StepAction::Export, "b", 1.0),
                ],
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_advance_walks_indices_then_runs_out() {
        let mut session = PlaybackSession::new(two_step(), 7);
        assert_eq!(session.step_index(), None);

        let (i, step) = session.advance();
        assert_eq!(i, 0);
        assert_eq!(step.unwrap().description, "a");

        let (i, step) = session.advance();
        assert_eq!(i, 1);
        assert_eq!(step.unwrap().action, StepAction::Export);

        let (i, step) = session.advance();
        assert_eq!(i, 2);
        assert!(step.is_none());
    }

    #[test]
    fn test_accepts_checks_generation_and_running() {
        let mut session = PlaybackSession::new(two_step(), 3);
        assert!(session.accepts(3));
        assert!(!session.accepts(2));
        session.finish();
        assert!(!session.accepts(3));
    }

    #[test]
    fn test_first_chat_only_once() {
        let mut session = PlaybackSession::new(two_step(), 1);
        assert!(session.take_first_chat());
        assert!(!session.take_first_chat());
    }

    #[test]
    fn test_status_serialization() {
        let mut session = PlaybackSession::new(two_step(), 1);
        session.advance();
        let json = serde_json::to_value(PlayerStatus::Running(session.status())).unwrap();
        assert_eq!(json["state"], "running");
        assert_eq!(json["scenario_id"], "two");
        assert_eq!(json["step_index"], 0);
        assert_eq!(json["action"], "chat");

        let idle = serde_json::to_value(PlayerStatus::Idle).unwrap();
        assert_eq!(idle["state"], "idle");
    }
}
