//! X11-specific implementations.
//!
//! This module provides concrete backends for the
//! [`WindowSystem`](crate::traits::WindowSystem) and
//! [`EventSource`](crate::traits::EventSource) traits, powered by the
//! pure-Rust X11 protocol implementation in `x11rb`.
//!
//! Nothing outside this module should reference X11 directly.

pub mod backend;
