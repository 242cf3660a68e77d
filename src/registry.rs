//! Registry of managed clients.
//!
//! Clients live in a generational arena: a [`ClientId`] names a slot *and*
//! the generation that slot had when the client was inserted, so an id kept
//! after its client was destroyed never resolves to a later occupant of the
//! same slot.
//!
//! Alongside the arena the registry keeps
//!
//! * the registration order (significant for icon packing),
//! * one index per identifier space: real windows, icon surfaces and
//!   placeholder surfaces,
//! * the currently focused client.
//!
//! All state changes go through [`Registry::replace_state`] so the
//! icon/placeholder indexes always match the clients' tagged states.

use crate::client::{Client, ClientState, StateKind};
use crate::types::{Geometry, WindowId};
use std::collections::HashMap;
use std::fmt;

/// Stable handle to a client in a [`Registry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId {
    index: u32,
    generation: u32,
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.index, self.generation)
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    client: Option<Client>,
}

#[derive(Debug, Default)]
pub struct Registry {
    slots: Vec<Slot>,
    /// Indexes of empty slots, reused before the arena grows.
    free: Vec<u32>,
    order: Vec<ClientId>,
    by_window: HashMap<WindowId, ClientId>,
    by_icon: HashMap<WindowId, ClientId>,
    by_placeholder: HashMap<WindowId, ClientId>,
    focused: Option<ClientId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Append `client` to the end of the registration order.
    ///
    /// Returns `None` (and leaves the registry untouched) if a client for
    /// the same window already exists.
    pub fn insert(&mut self, client: Client) -> Option<ClientId> {
        if self.by_window.contains_key(&client.window()) {
            return None;
        }
        let window = client.window();
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.client = Some(client);
                ClientId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    client: Some(client),
                });
                ClientId {
                    index,
                    generation: 0,
                }
            }
        };
        self.by_window.insert(window, id);
        self.order.push(id);
        Some(id)
    }

    /// Remove a client, dropping it from every index and from the focus
    /// slot.  Returns `None` if `id` is stale.
    pub fn remove(&mut self, id: ClientId) -> Option<Client> {
        let slot = self
            .slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)?;
        let client = slot.client.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);

        self.order.retain(|&other| other != id);
        self.by_window.remove(&client.window());
        match client.state() {
            ClientState::Hidden(icon) => {
                self.by_icon.remove(&icon.surface);
            }
            ClientState::MoveResize(p) => {
                self.by_placeholder.remove(&p.surface);
            }
            ClientState::Visible => {}
        }
        if self.focused == Some(id) {
            self.focused = None;
        }
        Some(client)
    }

    pub fn get(&self, id: ClientId) -> Option<&Client> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.client.as_ref())
    }

    fn get_mut(&mut self, id: ClientId) -> Option<&mut Client> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.client.as_mut())
    }

    /// Clients in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (ClientId, &Client)> + '_ {
        self.order
            .iter()
            .filter_map(move |&id| self.get(id).map(|c| (id, c)))
    }

    /// Client ids in registration order.
    pub fn ids(&self) -> Vec<ClientId> {
        self.order.clone()
    }

    /// Swap in a new state, returning the old one (and the resources it
    /// owned) to the caller.
    pub(crate) fn replace_state(
        &mut self,
        id: ClientId,
        state: ClientState,
    ) -> Option<ClientState> {
        let client = self
            .slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.client.as_mut())?;
        let old = std::mem::replace(&mut client.state, state);

        match &old {
            ClientState::Hidden(icon) => {
                self.by_icon.remove(&icon.surface);
            }
            ClientState::MoveResize(p) => {
                self.by_placeholder.remove(&p.surface);
            }
            ClientState::Visible => {}
        }
        match &client.state {
            ClientState::Hidden(icon) => {
                self.by_icon.insert(icon.surface, id);
            }
            ClientState::MoveResize(p) => {
                self.by_placeholder.insert(p.surface, id);
            }
            ClientState::Visible => {}
        }
        debug_assert!(
            client.kind() == StateKind::Visible || self.focused != Some(id),
            "focused client left the visible state"
        );
        Some(old)
    }

    pub(crate) fn set_geometry(&mut self, id: ClientId, geometry: Geometry) {
        if let Some(client) = self.get_mut(id) {
            client.geometry = geometry;
        }
    }

    pub(crate) fn set_icon_position(&mut self, id: ClientId, x: i32, y: i32) {
        if let Some(ClientState::Hidden(icon)) = self.get_mut(id).map(|c| &mut c.state) {
            icon.x = x;
            icon.y = y;
        }
    }

    //  Lookups

    /// The client wrapping `window`, whatever its state.
    pub fn client_for_window(&self, window: WindowId) -> Option<ClientId> {
        self.by_window.get(&window).copied()
    }

    /// The *visible* client wrapping `window`.
    pub fn lookup_by_window(&self, window: WindowId) -> Option<ClientId> {
        self.client_for_window(window)
            .filter(|&id| self.kind_of(id) == Some(StateKind::Visible))
    }

    /// The *hidden* client whose icon surface is `icon`.
    pub fn lookup_by_icon(&self, icon: WindowId) -> Option<ClientId> {
        self.by_icon
            .get(&icon)
            .copied()
            .filter(|&id| self.kind_of(id) == Some(StateKind::Hidden))
    }

    /// The client being moved or resized through the placeholder `surface`.
    pub fn lookup_by_placeholder(&self, surface: WindowId) -> Option<ClientId> {
        self.by_placeholder
            .get(&surface)
            .copied()
            .filter(|&id| self.kind_of(id) == Some(StateKind::MoveResize))
    }

    fn kind_of(&self, id: ClientId) -> Option<StateKind> {
        self.get(id).map(Client::kind)
    }

    //  Focus slot

    pub fn focused(&self) -> Option<ClientId> {
        self.focused
    }

    pub(crate) fn set_focused(&mut self, id: Option<ClientId>) {
        self.focused = id;
    }
}
