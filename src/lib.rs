//! RTSP restreaming server core.
//!
//! A single endpoint accepts both publishers (RECORD) and players
//! (PLAY) on the same path and relays the publisher's media to every
//! current player of that path. This crate owns the path and session
//! state machine: which client holds which role on which path, the
//! admission limits, and the transition notifications a host hooks
//! into. The RTSP wire protocol, transport negotiation and media
//! forwarding live in the host engine, which feeds connection
//! lifecycle events in through the [`engine`] boundary.

pub mod app;
pub mod auth;
pub mod engine;
pub mod hooks;
pub mod session;
pub mod statics;
