//! Types used throughout smallwm.
//!
//! This module defines the vocabulary that all components share:
//! [`WindowId`] / [`GcId`] name windowing-system resources,
//! [`Geometry`] and [`WindowAttributes`] describe windows, and [`Event`]
//! is what an [`EventSource`](crate::traits::EventSource) feeds into
//! [`ClientManager::handle`](crate::manager::ClientManager::handle).

use std::fmt;
use std::ops::BitOr;

/// Opaque handle of a native window (or of a surface the manager created).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u32);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// Opaque handle of a drawing context (an X11 graphics context).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GcId(pub u32);

/// Position and size of a window, in root coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// Window class as reported by the windowing system.
///
/// Input-only windows cannot receive keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowClass {
    InputOutput,
    InputOnly,
}

/// Map state as reported by the windowing system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapState {
    Unmapped,
    /// Mapped, but an ancestor is not.
    Unviewable,
    Viewable,
}

/// Snapshot of a window's attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowAttributes {
    pub geometry: Geometry,
    pub class: WindowClass,
    pub map_state: MapState,
    /// The window asked not to be managed.
    pub override_redirect: bool,
}

/// Set of notifications a window can be subscribed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EventMask(u32);

impl EventMask {
    pub const NONE: EventMask = EventMask(0);
    pub const BUTTON_PRESS: EventMask = EventMask(1 << 0);
    pub const BUTTON_RELEASE: EventMask = EventMask(1 << 1);
    pub const EXPOSURE: EventMask = EventMask(1 << 2);
    pub const POINTER_MOTION: EventMask = EventMask(1 << 3);

    /// Whether every notification in `other` is also in `self`.
    pub fn contains(self, other: EventMask) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn bits(self) -> u32 {
        self.0
    }
}

impl BitOr for EventMask {
    type Output = EventMask;

    fn bitor(self, rhs: EventMask) -> EventMask {
        EventMask(self.0 | rhs.0)
    }
}

/// A windowing-system notification relevant to the client core.
///
/// Window fields name the window the event was *reported on*: for button
/// events delivered through a passive grab, that is the grabbing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A new top-level window was created.
    WindowCreated(WindowId),
    /// A window no longer exists.
    WindowDestroyed(WindowId),
    ButtonPress { window: WindowId },
    ButtonRelease { window: WindowId },
    /// Part of `window` needs repainting; `count` more expose events follow.
    Expose { window: WindowId, count: u16 },
    /// The pointer moved to `(root_x, root_y)` while over or grabbed by
    /// `window`.
    Motion {
        window: WindowId,
        root_x: i32,
        root_y: i32,
    },
}
