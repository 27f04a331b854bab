//! # OceanGPT demo engine
//!
//! Back end for the OceanGPT float explorer:
//! - Scenario playback: timed, interruptible guided demos
//! - Conversation and selection state shared with the viewer and inspector
//! - Mock float catalog and canned query responder
//! - HTTP/JSON control surface with an SSE event stream

pub mod api;
pub mod catalog;
pub mod config;
pub mod conversation;
pub mod error;
pub mod playback;
pub mod responder;
pub mod scenario;
pub mod selection;
pub mod state;
pub mod viewer;

pub use error::{Error, Result};
