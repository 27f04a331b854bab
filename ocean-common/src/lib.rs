//! # OceanGPT Common Library
//!
//! Shared code for the OceanGPT demo services:
//! - Event types (OceanEvent enum) and the broadcast EventBus
//! - Configuration loading (TOML file, environment, compiled defaults)
//! - Timestamp and duration helpers
//! - Common error type

pub mod config;
pub mod error;
pub mod events;
pub mod time;

pub use error::{Error, Result};
pub use events::{EventBus, OceanEvent};
