//! **smallwm**: the client-management core of a minimal click-to-focus
//! window manager.
//!
//! Every managed top-level window is a *client* that is either visible,
//! hidden behind an icon, or being moved/resized through a placeholder.
//! Hidden clients are laid out as a row of labelled icons across the top of
//! the screen.
//!
//! # Architecture
//!
//! The crate is organised around two core traits:
//!
//! * [`traits::WindowSystem`] abstracts the windowing-system requests the
//!   core issues, so client bookkeeping is not coupled to any specific
//!   display server and can be tested against an in-memory fake.
//! * [`traits::EventSource`] abstracts where windowing-system events come
//!   from, so the event loop is not coupled to any specific transport.
//!
//! [`manager::ClientManager`] owns the [`registry::Registry`] and drives the
//! state machine; [`icons`] and [`focus`] extend it with icon layout and
//! click-to-focus.  The X11 implementation lives in [`x11`].

pub mod client;
pub mod config;
pub mod focus;
pub mod icons;
pub mod manager;
pub mod registry;
pub mod traits;
pub mod types;
#[cfg(feature = "backend-x11")]
pub mod x11;

#[cfg(test)]
pub(crate) mod testing;
