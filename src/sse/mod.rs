//! Server-sent events client
//!
//! Reads a `text/event-stream` response over `reqwest` and forwards parsed
//! events on a channel. There is no reconnection: a transport failure is
//! reported once and the caller decides how to degrade.

mod client;
mod types;

pub use client::SseClient;
pub use types::{SseConfig, SseError, SseMessage};
