//! alu-dash: live aluminium price dashboard
//!
//! This library provides the core components for:
//! - Price source adapters for LME, MCX and exchange-rate scrapers
//! - Server-sent events transport
//! - Per-feed live update schedulers (stream, poll, manual)
//! - Derived metrics: spread, market structure, landed quotes
//! - Onboarding and alert form boundaries
//! - JSON API, terminal views and observability

pub mod aggregate;
pub mod alerts;
pub mod api;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod feed;
pub mod format;
pub mod onboarding;
pub mod scheduler;
pub mod session;
pub mod sse;
pub mod telemetry;
