//! HTTP front end for the GCM relay.
//!
//! Endpoints:
//! - POST /api/send — validate a notification request and deliver it through GCM
//! - GET  /health   — liveness probe

pub mod routes;
pub mod state;
