//! Error types for ocean-demo
//!
//! Every error here is local to the call that produced it; none is fatal to
//! the process.

use thiserror::Error;

/// Main error type for ocean-demo
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unknown float identifier requested from the catalog
    #[error("Float not found: {0}")]
    EntityNotFound(String),

    /// Unknown scenario identifier
    #[error("Scenario not found: {0}")]
    ScenarioNotFound(String),

    /// Malformed scenario definition (e.g. a step with non-positive duration)
    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),

    /// Query responder failure
    #[error("Query error: {0}")]
    Query(String),

    /// Invalid request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors bubbled up from ocean-common
    #[error(transparent)]
    Common(#[from] ocean_common::Error),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using ocean-demo Error
pub type Result<T> = std::result::Result<T, Error>;
