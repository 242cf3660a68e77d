//! Per-window client record.
//!
//! A [`Client`] wraps one managed top-level window.  Its [`ClientState`] is
//! a tagged variant that *owns* the resources belonging to the state: the
//! icon surface exists exactly while the client is hidden, the placeholder
//! surface exactly while it is being moved or resized.  The two cannot drift
//! apart from the state because there is nowhere else to store them.

use crate::types::{GcId, Geometry, WindowClass, WindowId};
use std::fmt;

/// Resources backing an iconified client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Icon {
    /// The icon surface shown in the icon row.
    pub surface: WindowId,
    /// Drawing context used to paint the label.
    pub gc: GcId,
    /// Grid position computed by the last icon refresh.
    pub x: i32,
    pub y: i32,
}

/// Stand-in surface dragged around during an interactive move or resize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub surface: WindowId,
}

/// State of a client together with the resources that state owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientState {
    Visible,
    Hidden(Icon),
    MoveResize(Placeholder),
}

/// The state of a client without its resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    Visible,
    Hidden,
    MoveResize,
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateKind::Visible => write!(f, "visible"),
            StateKind::Hidden => write!(f, "hidden"),
            StateKind::MoveResize => write!(f, "move-resize"),
        }
    }
}

impl ClientState {
    pub fn kind(&self) -> StateKind {
        match self {
            ClientState::Visible => StateKind::Visible,
            ClientState::Hidden(_) => StateKind::Hidden,
            ClientState::MoveResize(_) => StateKind::MoveResize,
        }
    }
}

/// One managed top-level window.
#[derive(Debug, Clone)]
pub struct Client {
    window: WindowId,
    class: WindowClass,
    /// Last known geometry while visible.  Stale while hidden or being
    /// dragged.
    pub(crate) geometry: Geometry,
    pub(crate) state: ClientState,
}

impl Client {
    /// A freshly managed client always starts out visible.
    pub fn new(window: WindowId, class: WindowClass, geometry: Geometry) -> Self {
        Self {
            window,
            class,
            geometry,
            state: ClientState::Visible,
        }
    }

    pub fn window(&self) -> WindowId {
        self.window
    }

    pub fn class(&self) -> WindowClass {
        self.class
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    pub fn kind(&self) -> StateKind {
        self.state.kind()
    }

    /// The icon, if the client is hidden.
    pub fn icon(&self) -> Option<&Icon> {
        match &self.state {
            ClientState::Hidden(icon) => Some(icon),
            _ => None,
        }
    }

    /// The placeholder, if the client is being moved or resized.
    pub fn placeholder(&self) -> Option<&Placeholder> {
        match &self.state {
            ClientState::MoveResize(p) => Some(p),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_client_is_visible_without_resources() {
        let c = Client::new(WindowId(1), WindowClass::InputOutput, Geometry::new(1, 2, 3, 4));
        assert_eq!(c.kind(), StateKind::Visible);
        assert!(c.icon().is_none());
        assert!(c.placeholder().is_none());
    }

    #[test]
    fn resources_follow_state() {
        let mut c = Client::new(WindowId(1), WindowClass::InputOutput, Geometry::default());
        c.state = ClientState::Hidden(Icon {
            surface: WindowId(9),
            gc: GcId(10),
            x: 0,
            y: 0,
        });
        assert_eq!(c.kind(), StateKind::Hidden);
        assert_eq!(c.icon().map(|i| i.surface), Some(WindowId(9)));
        assert!(c.placeholder().is_none());

        c.state = ClientState::MoveResize(Placeholder {
            surface: WindowId(11),
        });
        assert!(c.icon().is_none());
        assert_eq!(c.placeholder().map(|p| p.surface), Some(WindowId(11)));
    }
}
