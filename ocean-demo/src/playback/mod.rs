//! Scenario playback
//!
//! Replays pre-authored scenarios one timed step at a time. At most one
//! session is live; starting another interrupts it.

mod engine;
mod session;

pub use engine::ScenarioPlayer;
pub use session::{PlaybackSession, PlayerStatus, RunningStatus};
