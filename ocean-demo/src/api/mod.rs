//! HTTP/JSON control surface and SSE stream

pub mod handlers;
pub mod server;
pub mod sse;

pub use server::{build_router, run, AppContext};
